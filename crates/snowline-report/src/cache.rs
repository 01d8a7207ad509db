//! On-disk cache of the last successful report payload per
//! (server, resort) pair.
//!
//! Entries live under `<root>/<server cache id>/<resort slug>.json`, so
//! partitioning by server id is a property of the directory layout and
//! entries can never leak across backends. Writes are atomic (temp file +
//! persist), so an abandoned fetch can never leave a partial payload behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CacheError;

/// One cached payload with the time it was fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content: String,
    pub fetched_at: DateTime<Utc>,
}

/// File-system backed report cache.
///
/// Last write wins; there is no eviction. Growth is bounded in practice by
/// the fixed resort catalog size.
pub struct ReportCache {
    root: PathBuf,
}

impl ReportCache {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the most recent payload stored for `(cache_id, resort_path)`.
    ///
    /// A missing entry is `Ok(None)`. A corrupt entry file is also `Ok(None)`
    /// (with a warning): a damaged cache must degrade to "nothing cached",
    /// never block a fetch.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] only for I/O failures other than the file
    /// being absent.
    pub fn get(
        &self,
        cache_id: &str,
        resort_path: &str,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(cache_id, resort_path);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding corrupt cache entry");
                Ok(None)
            }
        }
    }

    /// Stores `content` for `(cache_id, resort_path)`, overwriting any
    /// previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the entry directory or file cannot be
    /// written.
    pub fn put(
        &self,
        cache_id: &str,
        resort_path: &str,
        content: &str,
    ) -> Result<(), CacheError> {
        let path = self.entry_path(cache_id, resort_path);
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(|e| CacheError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;

        let entry = CacheEntry {
            content: content.to_owned(),
            fetched_at: Utc::now(),
        };
        let payload = serde_json::to_vec(&entry)?;

        let io_err = |e: std::io::Error| CacheError::Io {
            path: path.display().to_string(),
            source: e,
        };
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        temp.write_all(&payload).map_err(io_err)?;
        temp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn entry_path(&self, cache_id: &str, resort_path: &str) -> PathBuf {
        self.root
            .join(cache_id)
            .join(format!("{}.json", file_slug(resort_path)))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Flattens a resort path into a filesystem-safe file stem, with a short
/// digest suffix keeping distinct paths distinct after sanitization.
fn file_slug(resort_path: &str) -> String {
    let mut slug = String::with_capacity(resort_path.len());
    let mut last_was_sep = true;
    for c in resort_path.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    let slug = slug.trim_end_matches('_');
    let digest = format!("{:x}", Sha256::digest(resort_path.as_bytes()));
    format!("{slug}-{}", &digest[..8])
}
