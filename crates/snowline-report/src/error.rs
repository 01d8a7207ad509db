use thiserror::Error;

/// Errors from the HTTP transport layer.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network, timeout, or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid server URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Errors enumerating a server's region/location catalog.
///
/// Any of these aborts the enumeration of that server: a working server
/// always advertises at least one region, and at least one location per
/// advertised region.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog fetch from {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("server {server} advertised no regions")]
    EmptyCatalog { server: String },

    #[error("server {server} advertised no locations for region '{region}'")]
    EmptyRegion { server: String, region: String },
}

/// Errors from the on-disk report cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache entry serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
