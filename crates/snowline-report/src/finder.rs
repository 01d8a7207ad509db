//! Region and location enumeration against one server's catalog.

use snowline_core::{Location, Resort};

use crate::client::HttpClient;
use crate::error::CatalogError;
use crate::kv;
use crate::server::Server;

/// Enumerates the regions and locations a server advertises.
///
/// Catalog data is small and expected fresh per run, so nothing at this
/// layer is cached; the report cache only covers per-resort payloads.
pub struct LocationFinder<'a> {
    client: &'a HttpClient,
    server: &'a dyn Server,
}

impl<'a> LocationFinder<'a> {
    #[must_use]
    pub fn new(client: &'a HttpClient, server: &'a dyn Server) -> Self {
        Self { client, server }
    }

    /// Fetches and parses the server's region catalog.
    ///
    /// Duplicate region names are collapsed, first occurrence wins on order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Fetch`] when the catalog cannot be retrieved
    /// and [`CatalogError::EmptyCatalog`] when a server advertises no
    /// regions — a working server always has at least one, so the caller
    /// must treat this as a hard failure for that server.
    pub async fn regions(&self) -> Result<Vec<String>, CatalogError> {
        let url = self.server.catalog_url();
        let body = self
            .client
            .fetch(&url)
            .await
            .map_err(|source| CatalogError::Fetch { url, source })?;

        let mut regions: Vec<String> = Vec::new();
        for (key, value) in kv::pairs(&body) {
            if key == "region" && !value.is_empty() && !regions.iter().any(|r| r == value) {
                regions.push(value.to_string());
            }
        }

        if regions.is_empty() {
            return Err(CatalogError::EmptyCatalog {
                server: self.server.id().to_string(),
            });
        }
        tracing::debug!(server = %self.server.id(), count = regions.len(), "regions enumerated");
        Ok(regions)
    }

    /// Fetches and parses the locations of one region.
    ///
    /// Location lines carry `name|path`; lines that don't are skipped with a
    /// warning rather than failing the whole region.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Fetch`] when the listing cannot be retrieved
    /// and [`CatalogError::EmptyRegion`] when a region obtained from
    /// [`LocationFinder::regions`] resolves to zero locations — a reportable
    /// inconsistency, not a silent success.
    pub async fn locations(&self, region: &str) -> Result<Vec<Location>, CatalogError> {
        let url = self.server.region_url(region);
        let body = self
            .client
            .fetch(&url)
            .await
            .map_err(|source| CatalogError::Fetch { url, source })?;

        let mut locations = Vec::new();
        for (key, value) in kv::pairs(&body) {
            if key != "location" {
                continue;
            }
            let Some((name, path)) = split_location(value) else {
                tracing::warn!(server = %self.server.id(), region, line = value, "skipping malformed location line");
                continue;
            };
            locations.push(Location {
                region: region.to_string(),
                resort: Resort {
                    name: name.to_string(),
                    region: region.to_string(),
                    path: path.to_string(),
                },
            });
        }

        if locations.is_empty() {
            return Err(CatalogError::EmptyRegion {
                server: self.server.id().to_string(),
                region: region.to_string(),
            });
        }
        Ok(locations)
    }
}

/// Splits a `name|path` location value; both halves must be non-empty.
fn split_location(value: &str) -> Option<(&str, &str)> {
    let (name, path) = value.split_once('|')?;
    let name = name.trim();
    let path = path.trim();
    if name.is_empty() || path.is_empty() {
        return None;
    }
    Some((name, path))
}
