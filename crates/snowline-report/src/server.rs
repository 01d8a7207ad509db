//! Backend server addressing.
//!
//! A [`Server`] turns a configured base URL into the concrete request targets
//! for catalog and per-resort queries, and carries the stable identifier used
//! to partition the report cache. Addressing is pure value transformation —
//! no I/O happens here.

use reqwest::Url;
use sha2::{Digest, Sha256};
use snowline_core::servers::{ServerConfig, ServerFormat};
use snowline_core::Resort;

use crate::error::FetchError;

/// Path segment of the region/location catalog endpoint, shared by all
/// configured servers.
const CATALOG_SEGMENT: &str = "location_list";

/// Addressing for one backend data source.
pub trait Server: Send + Sync {
    /// Reported identity, used in logs and request accounting. Stable and
    /// unique per distinct base URL.
    fn id(&self) -> &str;

    /// Cache partition key. For a plain server this equals [`Server::id`];
    /// decorators that re-tag the reported id must leave this untouched so
    /// tagged and untagged traffic share one cache partition per backend.
    fn cache_id(&self) -> &str;

    /// Fully-qualified URL of the region catalog.
    fn catalog_url(&self) -> String;

    /// Fully-qualified URL listing the locations of one region.
    fn region_url(&self, region: &str) -> String;

    /// Fully-qualified URL of one resort's report.
    fn report_url(&self, resort: &Resort) -> String;

    /// Content format of this server's report bodies.
    fn format(&self) -> ServerFormat;
}

/// A configured backend server.
pub struct SkiServer {
    base: Url,
    id: String,
    format: ServerFormat,
}

impl SkiServer {
    /// Creates a server from a base URL and report-body format.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if `base_url` is not an absolute
    /// URL.
    pub fn new(base_url: &str, format: ServerFormat) -> Result<Self, FetchError> {
        // Normalise: ensure the base URL ends with exactly one slash so that
        // joined paths land under it rather than replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalised).map_err(|e| FetchError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        let id = derive_id(&base);
        Ok(Self { base, id, format })
    }

    /// Creates a server from a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the configured URL is not an
    /// absolute URL.
    pub fn from_config(config: &ServerConfig) -> Result<Self, FetchError> {
        Self::new(&config.url, config.format)
    }
}

impl Server for SkiServer {
    fn id(&self) -> &str {
        &self.id
    }

    fn cache_id(&self) -> &str {
        &self.id
    }

    fn catalog_url(&self) -> String {
        format!("{}{CATALOG_SEGMENT}", self.base)
    }

    fn region_url(&self, region: &str) -> String {
        let mut url = self.base.clone();
        url.set_path(&format!("{}{CATALOG_SEGMENT}", self.base.path()));
        url.query_pairs_mut().append_pair("region", region);
        url.to_string()
    }

    fn report_url(&self, resort: &Resort) -> String {
        format!("{}{}", self.base, resort.path)
    }

    fn format(&self) -> ServerFormat {
        self.format
    }
}

/// Decorator that tags the reported id of a wrapped server with a `test_`
/// prefix, so downstream log scraping can tell synthetic survey traffic from
/// real client traffic.
///
/// Addressing and cache partitioning delegate to the wrapped server
/// unchanged.
pub struct TestServer<S> {
    inner: S,
    tagged_id: String,
}

impl<S: Server> TestServer<S> {
    pub fn new(inner: S) -> Self {
        let tagged_id = format!("test_{}", inner.id());
        Self { inner, tagged_id }
    }
}

impl<S: Server> Server for TestServer<S> {
    fn id(&self) -> &str {
        &self.tagged_id
    }

    fn cache_id(&self) -> &str {
        self.inner.cache_id()
    }

    fn catalog_url(&self) -> String {
        self.inner.catalog_url()
    }

    fn region_url(&self, region: &str) -> String {
        self.inner.region_url(region)
    }

    fn report_url(&self, resort: &Resort) -> String {
        self.inner.report_url(resort)
    }

    fn format(&self) -> ServerFormat {
        self.inner.format()
    }
}

/// Derives the stable server id from a normalized base URL.
///
/// Host and path are flattened to a filesystem-safe slug; a short SHA-256
/// digest of the full URL keeps ids injective when distinct URLs sanitize to
/// the same slug.
fn derive_id(base: &Url) -> String {
    let raw = format!("{}{}", base.host_str().unwrap_or("unknown"), base.path());
    let mut slug = String::with_capacity(raw.len());
    let mut last_was_sep = true;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    let slug = slug.trim_end_matches('_');
    let digest = format!("{:x}", Sha256::digest(base.as_str().as_bytes()));
    format!("{slug}-{}", &digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resort() -> Resort {
        Resort {
            name: "Peak One".to_string(),
            region: "Summit County".to_string(),
            path: "report?loc=peak-one".to_string(),
        }
    }

    fn server() -> SkiServer {
        SkiServer::new("https://skireport.example.com/skireport", ServerFormat::KeyValue).unwrap()
    }

    #[test]
    fn rejects_relative_base_url() {
        let result = SkiServer::new("skireport.example.com", ServerFormat::KeyValue);
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn catalog_url_lands_under_base_path() {
        assert_eq!(
            server().catalog_url(),
            "https://skireport.example.com/skireport/location_list"
        );
    }

    #[test]
    fn catalog_url_tolerates_trailing_slash_in_config() {
        let s =
            SkiServer::new("https://skireport.example.com/skireport/", ServerFormat::KeyValue)
                .unwrap();
        assert_eq!(
            s.catalog_url(),
            "https://skireport.example.com/skireport/location_list"
        );
    }

    #[test]
    fn region_url_encodes_region_name() {
        assert_eq!(
            server().region_url("Summit County"),
            "https://skireport.example.com/skireport/location_list?region=Summit+County"
        );
    }

    #[test]
    fn report_url_joins_resort_path() {
        assert_eq!(
            server().report_url(&resort()),
            "https://skireport.example.com/skireport/report?loc=peak-one"
        );
    }

    #[test]
    fn id_is_stable_across_instances() {
        assert_eq!(server().id(), server().id());
    }

    #[test]
    fn id_is_slug_plus_digest() {
        let id = server().id().to_string();
        assert!(
            id.starts_with("skireport_example_com_skireport-"),
            "unexpected id shape: {id}"
        );
    }

    #[test]
    fn ids_differ_for_distinct_base_urls() {
        let a = SkiServer::new("https://skireport.example.com/skireport", ServerFormat::KeyValue)
            .unwrap();
        let b = SkiServer::new(
            "https://mirror.skireport.example.com/skireport",
            ServerFormat::KeyValue,
        )
        .unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn ids_differ_even_when_slugs_collide() {
        // Same host+path, different scheme: the slug is identical, the
        // digest suffix must disambiguate.
        let a = SkiServer::new("https://skireport.example.com/r", ServerFormat::KeyValue).unwrap();
        let b = SkiServer::new("http://skireport.example.com/r", ServerFormat::KeyValue).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn plain_server_cache_id_equals_id() {
        let s = server();
        assert_eq!(s.id(), s.cache_id());
    }

    #[test]
    fn test_server_prefixes_reported_id_only() {
        let inner_id = server().id().to_string();
        let tagged = TestServer::new(server());
        assert_eq!(tagged.id(), format!("test_{inner_id}"));
        assert_eq!(tagged.cache_id(), inner_id);
    }

    #[test]
    fn test_server_addressing_is_unchanged() {
        let plain = server();
        let tagged = TestServer::new(server());
        assert_eq!(tagged.catalog_url(), plain.catalog_url());
        assert_eq!(tagged.region_url("Summit County"), plain.region_url("Summit County"));
        assert_eq!(tagged.report_url(&resort()), plain.report_url(&resort()));
    }
}
