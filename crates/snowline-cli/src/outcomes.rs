//! Per-server outcome aggregation for a survey run.

use snowline_report::Report;

/// Accumulated results for one server, bucketed the way the summary reports
/// them: general (catalog-level) errors, reports with error conditions,
/// reports that parsed cleanly but carry no fresh total, and full successes.
#[derive(Default)]
pub struct ServerOutcomes {
    general_errors: Vec<String>,
    error_reports: Vec<Report>,
    missing_fresh: Vec<Report>,
    successes: Vec<Report>,
}

impl ServerOutcomes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a catalog-level failure (no regions, empty region, fetch
    /// failure) that prevented surveying part of the server.
    pub fn add_error(&mut self, error: String) {
        self.general_errors.push(error);
    }

    /// Buckets one report. Returns `true` when the report is a full success
    /// (no errors and a readable fresh total).
    pub fn process_report(&mut self, report: Report) -> bool {
        if report.has_errors() {
            self.error_reports.push(report);
            false
        } else if report.has_fresh_snow_total() {
            self.successes.push(report);
            true
        } else {
            self.missing_fresh.push(report);
            false
        }
    }

    /// Everything that counts against the server: general errors, error
    /// reports, and reports with no readable fresh total.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.general_errors.len() + self.error_reports.len() + self.missing_fresh.len()
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Logs every accumulated problem for this server, with request and
    /// fresh-source URLs so a log-scraping script can fold them into an
    /// error report.
    pub fn log_errors(&self, server_id: &str) {
        if !self.general_errors.is_empty() {
            tracing::error!(
                server = server_id,
                count = self.general_errors.len(),
                "catalog-level errors occurred"
            );
            for error in &self.general_errors {
                tracing::error!(server = server_id, "{error}");
            }
        }

        if !self.error_reports.is_empty() {
            tracing::error!(
                server = server_id,
                count = self.error_reports.len(),
                "reports with error conditions"
            );
            for report in &self.error_reports {
                let detail = report.non_localized_error().unwrap_or_default();
                log_report_failure(server_id, report, &detail);
            }
        }

        if !self.missing_fresh.is_empty() {
            tracing::error!(
                server = server_id,
                count = self.missing_fresh.len(),
                "reports missing fresh snow totals despite lack of error conditions"
            );
            for report in &self.missing_fresh {
                log_report_failure(server_id, report, "fresh snow not found");
            }
        }
    }

    pub fn log_successes(&self, server_id: &str) {
        if self.successes.is_empty() {
            return;
        }
        tracing::info!(
            server = server_id,
            count = self.successes.len(),
            "resorts with no problems found"
        );
        for report in &self.successes {
            tracing::info!(
                server = server_id,
                resort = %report.resort(),
                fresh = report.fresh_as_string(),
                "fresh snow"
            );
        }
    }
}

/// One failure line per report, leading with the resort and carrying any
/// URLs that help track the problem down.
fn log_report_failure(server_id: &str, report: &Report, message: &str) {
    tracing::error!(
        server = server_id,
        resort = %report.resort(),
        request_url = report.request_url(),
        fresh_source_url = report.fresh_source_url(),
        "{message}"
    );
}
