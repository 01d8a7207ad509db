use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod servers;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use servers::{load_servers, ServerConfig, ServerFormat, ServersFile};

/// One ski location as advertised by a server's catalog.
///
/// `path` is the server-relative request path that addresses this resort's
/// report (it doubles as the cache key for the resort within a server's
/// cache partition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resort {
    pub name: String,
    pub region: String,
    pub path: String,
}

impl std::fmt::Display for Resort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.region)
    }
}

/// A catalog entry: a resort placed within its region.
///
/// Produced only by the location finder; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub region: String,
    pub resort: Resort,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.region, self.resort.name)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read server catalog {path}: {source}")]
    ServersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse server catalog: {0}")]
    ServersFileParse(#[from] serde_yaml::Error),

    #[error("server catalog validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resort_display_includes_region() {
        let resort = Resort {
            name: "Peak One".to_string(),
            region: "Summit County".to_string(),
            path: "report?loc=peak-one".to_string(),
        };
        assert_eq!(resort.to_string(), "Peak One (Summit County)");
    }

    #[test]
    fn location_display_is_region_slash_name() {
        let location = Location {
            region: "Summit County".to_string(),
            resort: Resort {
                name: "Peak One".to_string(),
                region: "Summit County".to_string(),
                path: "report?loc=peak-one".to_string(),
            },
        };
        assert_eq!(location.to_string(), "Summit County/Peak One");
    }
}
