//! Report retrieval: cached/no-cache loading and reduction of raw payloads
//! to normalized [`Report`] values.
//!
//! A load never fails with `Err` for expected conditions — unreachable
//! server, missing figure, unrecognizable content are all encoded on the
//! returned `Report`, so a consumer can sweep hundreds of resorts and
//! aggregate outcomes without exception handling.

use snowline_core::servers::ServerFormat;
use snowline_core::Resort;

use crate::cache::{CacheEntry, ReportCache};
use crate::client::HttpClient;
use crate::error::FetchError;
use crate::extract::{extractor_for, Extraction};
use crate::server::Server;

/// Retrieval strategy for one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Consult connectivity; fall back to the last successful payload when
    /// the network path is unusable or the live fetch fails.
    Cached,
    /// Always fetch live; never read or write the cache. Used when checking
    /// a freshly deployed backend, where stale cached content would mask a
    /// regression.
    NoCache,
}

/// A boolean "is the network currently usable" query, consumed once per
/// cached-mode load.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Default connectivity source for environments without a platform signal.
pub struct AssumeOnline;

impl Connectivity for AssumeOnline {
    fn is_online(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
enum ReportProblem {
    Transport { detail: String },
    OfflineNoCache,
    Malformed { detail: String },
}

/// The normalized outcome of fetching and parsing one resort's data from one
/// server at one point in time.
///
/// Immutable after construction. Two loads of the same resort yield two
/// independent reports, even when the content is identical.
pub struct Report {
    resort: Resort,
    request_url: String,
    fresh_source_url: String,
    raw: Option<String>,
    fresh_snow_total: Option<String>,
    problem: Option<ReportProblem>,
}

impl Report {
    /// Reduces a raw payload to a report via the extractor for `format`.
    ///
    /// Exposed so consumers can re-classify a stored payload without a
    /// network round trip; [`ReportFetcher::load`] is the usual entry point.
    #[must_use]
    pub fn from_content(
        resort: &Resort,
        format: ServerFormat,
        request_url: String,
        raw: String,
    ) -> Self {
        match extractor_for(format).extract(&raw) {
            Ok(Extraction::Fresh { total, source_url }) => Self {
                resort: resort.clone(),
                request_url,
                fresh_source_url: source_url.unwrap_or_default(),
                raw: Some(raw),
                fresh_snow_total: Some(total),
                problem: None,
            },
            Ok(Extraction::NoTotal) => Self {
                resort: resort.clone(),
                request_url,
                fresh_source_url: String::new(),
                raw: Some(raw),
                fresh_snow_total: None,
                problem: None,
            },
            Err(malformed) => Self {
                resort: resort.clone(),
                request_url,
                fresh_source_url: String::new(),
                raw: Some(raw),
                fresh_snow_total: None,
                problem: Some(ReportProblem::Malformed {
                    detail: malformed.reason,
                }),
            },
        }
    }

    fn transport_failure(resort: &Resort, request_url: String, err: &FetchError) -> Self {
        Self {
            resort: resort.clone(),
            request_url,
            fresh_source_url: String::new(),
            raw: None,
            fresh_snow_total: None,
            problem: Some(ReportProblem::Transport {
                detail: err.to_string(),
            }),
        }
    }

    fn offline_failure(resort: &Resort, request_url: String) -> Self {
        Self {
            resort: resort.clone(),
            request_url,
            fresh_source_url: String::new(),
            raw: None,
            fresh_snow_total: None,
            problem: Some(ReportProblem::OfflineNoCache),
        }
    }

    #[must_use]
    pub fn resort(&self) -> &Resort {
        &self.resort
    }

    /// The URL this load requested (populated even when the fetch failed, for
    /// diagnosis).
    #[must_use]
    pub fn request_url(&self) -> &str {
        &self.request_url
    }

    /// The sub-resource the fresh figure came from; empty unless a figure was
    /// actually located there.
    #[must_use]
    pub fn fresh_source_url(&self) -> &str {
        &self.fresh_source_url
    }

    /// The raw payload this report was parsed from, when a payload was
    /// obtained at all.
    #[must_use]
    pub fn raw_content(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.problem.is_some()
    }

    #[must_use]
    pub fn has_fresh_snow_total(&self) -> bool {
        self.fresh_snow_total.is_some()
    }

    /// The extracted fresh-snow figure, or `""` when none was found.
    #[must_use]
    pub fn fresh_as_string(&self) -> &str {
        self.fresh_snow_total.as_deref().unwrap_or("")
    }

    /// Human-readable error description naming the resort, or `None` when the
    /// load succeeded.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.problem.as_ref().map(|p| match p {
            ReportProblem::Transport { detail } => {
                format!("could not reach the report server for {}: {detail}", self.resort)
            }
            ReportProblem::OfflineNoCache => {
                format!("no network connection and no cached report for {}", self.resort)
            }
            ReportProblem::Malformed { detail } => {
                format!("report for {} was not understood: {detail}", self.resort)
            }
        })
    }

    /// Stable diagnostic string for log scraping; prefixed with the error
    /// class, independent of display phrasing.
    #[must_use]
    pub fn non_localized_error(&self) -> Option<String> {
        self.problem.as_ref().map(|p| match p {
            ReportProblem::Transport { detail } => format!("transport: {detail}"),
            ReportProblem::OfflineNoCache => "offline-no-cache".to_string(),
            ReportProblem::Malformed { detail } => format!("malformed-content: {detail}"),
        })
    }
}

/// Loads reports for resorts, combining the HTTP transport, the payload
/// cache, and the connectivity signal.
pub struct ReportFetcher<'a> {
    client: &'a HttpClient,
    cache: &'a ReportCache,
    connectivity: &'a dyn Connectivity,
}

impl<'a> ReportFetcher<'a> {
    #[must_use]
    pub fn new(
        client: &'a HttpClient,
        cache: &'a ReportCache,
        connectivity: &'a dyn Connectivity,
    ) -> Self {
        Self {
            client,
            cache,
            connectivity,
        }
    }

    /// Loads one resort's report from one server.
    ///
    /// Never returns an error: all failure states are encoded on the
    /// returned [`Report`].
    pub async fn load(&self, resort: &Resort, server: &dyn Server, mode: CacheMode) -> Report {
        let request_url = server.report_url(resort);
        match mode {
            CacheMode::NoCache => match self.client.fetch(&request_url).await {
                Ok(body) => Report::from_content(resort, server.format(), request_url, body),
                Err(e) => Report::transport_failure(resort, request_url, &e),
            },
            CacheMode::Cached => self.load_cached(resort, server, request_url).await,
        }
    }

    async fn load_cached(&self, resort: &Resort, server: &dyn Server, request_url: String) -> Report {
        if !self.connectivity.is_online() {
            return match self.cached_entry(server, resort) {
                Some(entry) => {
                    tracing::info!(
                        server = %server.id(),
                        resort = %resort,
                        fetched_at = %entry.fetched_at,
                        "offline — serving cached payload"
                    );
                    Report::from_content(resort, server.format(), request_url, entry.content)
                }
                None => Report::offline_failure(resort, request_url),
            };
        }

        match self.client.fetch(&request_url).await {
            Ok(body) => {
                if let Err(e) = self.cache.put(server.cache_id(), &resort.path, &body) {
                    tracing::warn!(
                        server = %server.id(),
                        resort = %resort,
                        error = %e,
                        "failed to store report payload in cache"
                    );
                }
                Report::from_content(resort, server.format(), request_url, body)
            }
            Err(fetch_err) => match self.cached_entry(server, resort) {
                Some(entry) => {
                    tracing::warn!(
                        server = %server.id(),
                        resort = %resort,
                        fetched_at = %entry.fetched_at,
                        error = %fetch_err,
                        "live fetch failed — serving stale cached payload"
                    );
                    Report::from_content(resort, server.format(), request_url, entry.content)
                }
                None => Report::transport_failure(resort, request_url, &fetch_err),
            },
        }
    }

    /// Cache lookup degraded to "no entry" on cache-layer failures: a broken
    /// cache must never take down a load that could still succeed.
    fn cached_entry(&self, server: &dyn Server, resort: &Resort) -> Option<CacheEntry> {
        match self.cache.get(server.cache_id(), &resort.path) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(
                    server = %server.id(),
                    resort = %resort,
                    error = %e,
                    "cache lookup failed, treating as absent"
                );
                None
            }
        }
    }
}
