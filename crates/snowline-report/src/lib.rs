pub mod cache;
pub mod client;
pub mod error;
pub mod extract;
pub mod finder;
mod kv;
pub mod report;
mod retry;
pub mod server;

pub use cache::{CacheEntry, ReportCache};
pub use client::HttpClient;
pub use error::{CacheError, CatalogError, FetchError};
pub use extract::{extractor_for, ContentExtractor, Extraction, MalformedContent};
pub use finder::LocationFinder;
pub use report::{AssumeOnline, CacheMode, Connectivity, Report, ReportFetcher};
pub use server::{Server, SkiServer, TestServer};
