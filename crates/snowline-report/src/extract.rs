//! Per-format fresh-snow extraction.
//!
//! Report bodies differ per server; each format implements the single
//! [`ContentExtractor::extract`] contract and is selected by the server's
//! configured format tag. Extraction is deterministic: identical bytes always
//! produce the identical outcome.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use snowline_core::servers::ServerFormat;
use thiserror::Error;

use crate::kv;

/// A fresh figure is a plain number or an `N-M` range, optionally decimal.
/// Anything else ("trace", "n/a", a sentence) counts as no figure, not as an
/// error.
static FRESH_FIGURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(\.\d+)?(\s*-\s*\d+(\.\d+)?)?$").expect("fresh figure pattern is valid")
});

/// Outcome of a successful extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A fresh-snow figure was located. `source_url` names the sub-resource
    /// the figure came from when the server distinguishes one.
    Fresh {
        total: String,
        source_url: Option<String>,
    },
    /// The body is a well-formed report that simply carries no fresh figure
    /// today.
    NoTotal,
}

/// The body does not match the expected resort-response shape at all, or the
/// upstream declared an error for this resort.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct MalformedContent {
    pub reason: String,
}

impl MalformedContent {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Capability implemented once per report-body format.
pub trait ContentExtractor: Send + Sync {
    /// Reduces a raw report body to an [`Extraction`].
    ///
    /// # Errors
    ///
    /// Returns [`MalformedContent`] when the body cannot be recognized as a
    /// resort response (or the upstream itself reports an error), which the
    /// caller records as an error report.
    fn extract(&self, raw: &str) -> Result<Extraction, MalformedContent>;
}

/// Returns the extractor for a server's configured format.
#[must_use]
pub fn extractor_for(format: ServerFormat) -> &'static dyn ContentExtractor {
    match format {
        ServerFormat::KeyValue => &KeyValueExtractor,
        ServerFormat::Json => &JsonExtractor,
    }
}

/// Extractor for the line-oriented `key = value` report format.
///
/// Recognized keys: `snow.fresh`, `snow.units`, `fresh.source.url`, and the
/// upstream error channel `err.msg`. Unknown keys are allowed (servers add
/// fields over time); a body with no recognizable key at all is malformed.
pub struct KeyValueExtractor;

impl ContentExtractor for KeyValueExtractor {
    fn extract(&self, raw: &str) -> Result<Extraction, MalformedContent> {
        let mut fresh: Option<&str> = None;
        let mut units: Option<&str> = None;
        let mut source_url: Option<&str> = None;
        let mut any_pair = false;

        for (key, value) in kv::pairs(raw) {
            any_pair = true;
            match key {
                "err.msg" => {
                    return Err(MalformedContent::new(format!("upstream error: {value}")));
                }
                "snow.fresh" => fresh = Some(value),
                "snow.units" => units = Some(value),
                "fresh.source.url" => source_url = Some(value),
                _ => {}
            }
        }

        if !any_pair {
            return Err(MalformedContent::new(
                "no report fields found in response body",
            ));
        }

        match fresh {
            Some(figure) if FRESH_FIGURE.is_match(figure) => {
                let total = match units {
                    Some(units) if !units.is_empty() => format!("{figure} {units}"),
                    _ => figure.to_string(),
                };
                Ok(Extraction::Fresh {
                    total,
                    source_url: source_url
                        .filter(|url| !url.is_empty())
                        .map(str::to_owned),
                })
            }
            Some(figure) => {
                tracing::debug!(figure, "fresh figure not parseable, treating as absent");
                Ok(Extraction::NoTotal)
            }
            None => Ok(Extraction::NoTotal),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonReport {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    snow: Option<JsonSnow>,
    #[serde(default)]
    source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonSnow {
    #[serde(default)]
    fresh: Option<serde_json::Value>,
    #[serde(default)]
    units: Option<String>,
}

/// Extractor for JSON report bodies.
///
/// Expected shape: an object with optional `snow.fresh` (number or numeric
/// string), `snow.units`, `source_url`, and an `error` field the upstream
/// uses to flag per-resort failures.
pub struct JsonExtractor;

impl ContentExtractor for JsonExtractor {
    fn extract(&self, raw: &str) -> Result<Extraction, MalformedContent> {
        let report: JsonReport = serde_json::from_str(raw)
            .map_err(|e| MalformedContent::new(format!("response is not a JSON report: {e}")))?;

        if let Some(message) = report.error {
            return Err(MalformedContent::new(format!("upstream error: {message}")));
        }

        let Some(snow) = report.snow else {
            return Ok(Extraction::NoTotal);
        };

        let figure = match snow.fresh {
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::String(s)) => s,
            Some(_) | None => return Ok(Extraction::NoTotal),
        };

        if !FRESH_FIGURE.is_match(&figure) {
            tracing::debug!(figure, "fresh figure not parseable, treating as absent");
            return Ok(Extraction::NoTotal);
        }

        let total = match snow.units {
            Some(units) if !units.is_empty() => format!("{figure} {units}"),
            _ => figure,
        };
        Ok(Extraction::Fresh {
            total,
            source_url: report.source_url.filter(|url| !url.is_empty()),
        })
    }
}
