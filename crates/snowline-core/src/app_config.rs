use std::path::PathBuf;

/// Runtime configuration shared by the report pipeline and the CLI.
///
/// All knobs come from `SNOWLINE_*` environment variables with defaults that
/// work for a local checkout; see [`crate::config::load_app_config`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub servers_path: PathBuf,
    pub cache_dir: PathBuf,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub max_concurrent_reports: usize,
}
