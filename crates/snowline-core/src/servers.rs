use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Content format a server uses for per-resort report bodies.
///
/// Catalog listings share one line-oriented protocol across servers; only the
/// report bodies differ, and this tag selects the extractor for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerFormat {
    KeyValue,
    Json,
}

impl std::fmt::Display for ServerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerFormat::KeyValue => write!(f, "keyvalue"),
            ServerFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub url: String,
    pub format: ServerFormat,
}

#[derive(Debug, Deserialize)]
pub struct ServersFile {
    pub servers: Vec<ServerConfig>,
}

/// Load and validate the server catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_servers(path: &Path) -> Result<ServersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ServersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let servers_file: ServersFile = serde_yaml::from_str(&content)?;

    validate_servers(&servers_file)?;

    Ok(servers_file)
}

fn validate_servers(servers_file: &ServersFile) -> Result<(), ConfigError> {
    if servers_file.servers.is_empty() {
        return Err(ConfigError::Validation(
            "server catalog must list at least one server".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    let mut seen_urls = HashSet::new();

    for server in &servers_file.servers {
        if server.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server name must be non-empty".to_string(),
            ));
        }

        if !server.url.starts_with("http://") && !server.url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "server '{}' has invalid url '{}'; must be an absolute http(s) URL",
                server.name, server.url
            )));
        }

        let lower_name = server.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate server name: '{}'",
                server.name
            )));
        }

        let normalized_url = server.url.trim_end_matches('/').to_string();
        if !seen_urls.insert(normalized_url) {
            return Err(ConfigError::Validation(format!(
                "duplicate server url: '{}' (from server '{}')",
                server.url, server.name
            )));
        }
    }

    Ok(())
}
