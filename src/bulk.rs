//! Per-item outcomes of multi-request operations.
//!
//! Bulk operations (route import, requirement deletion) keep going when a
//! single item fails. Each item's result is recorded in a [`BulkReport`],
//! which the caller can inspect or turn into an error with
//! [`BulkReport::ensure_complete`].

use reqwest::StatusCode;

use crate::error::ApiError;

/// Result of one item of a bulk operation.
#[derive(Debug)]
pub struct RowOutcome {
    /// Identifies the item: a requirement id or an import line number.
    pub key: String,
    /// Response status on success, or the error that stopped this item.
    pub result: Result<StatusCode, ApiError>,
}

impl RowOutcome {
    /// Returns true if the item succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the HTTP status for this item, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match &self.result {
            Ok(status) => Some(*status),
            Err(e) => e.status(),
        }
    }
}

/// Ordered outcomes of a bulk operation.
#[derive(Debug, Default)]
pub struct BulkReport {
    outcomes: Vec<RowOutcome>,
}

impl BulkReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one item.
    pub fn record(&mut self, key: impl Into<String>, result: Result<StatusCode, ApiError>) {
        self.outcomes.push(RowOutcome {
            key: key.into(),
            result,
        });
    }

    /// Number of items processed.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if no items were processed.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of items that succeeded.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Items that failed, in processing order.
    pub fn failures(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    /// All outcomes, in processing order.
    pub fn outcomes(&self) -> &[RowOutcome] {
        &self.outcomes
    }

    /// Returns the status recorded for `key`.
    pub fn status_of(&self, key: &str) -> Option<StatusCode> {
        self.outcomes
            .iter()
            .find(|o| o.key == key)
            .and_then(RowOutcome::status)
    }

    /// One-line summary, e.g. `3 succeeded, 1 failed`.
    pub fn summary(&self) -> String {
        let ok = self.succeeded();
        format!("{} succeeded, {} failed", ok, self.len() - ok)
    }

    /// Returns the report if every item succeeded.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::PartialFailure` if any item failed.
    pub fn ensure_complete(self) -> Result<Self, ApiError> {
        let failed = self.len() - self.succeeded();
        if failed > 0 {
            return Err(ApiError::PartialFailure {
                failed,
                total: self.len(),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error() -> ApiError {
        ApiError::HttpStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            reason: "Internal Server Error".to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn test_report_counts_and_statuses() {
        let mut report = BulkReport::new();
        report.record("1", Ok(StatusCode::OK));
        report.record("2", Err(server_error()));
        report.record("3", Ok(StatusCode::NO_CONTENT));
        report.record("line 5", Err(ApiError::validation("bad row")));

        assert_eq!(report.len(), 4);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.summary(), "2 succeeded, 2 failed");
        assert_eq!(report.status_of("2"), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(report.status_of("3"), Some(StatusCode::NO_CONTENT));
        assert_eq!(report.status_of("line 5"), None);
        assert_eq!(report.status_of("missing"), None);

        let failed: Vec<&str> = report.failures().map(|o| o.key.as_str()).collect();
        assert_eq!(failed, vec!["2", "line 5"]);
    }

    #[test]
    fn test_ensure_complete() {
        let mut report = BulkReport::new();
        report.record("1", Ok(StatusCode::OK));
        assert!(report.ensure_complete().is_ok());

        let mut report = BulkReport::new();
        report.record("1", Ok(StatusCode::OK));
        report.record("2", Err(server_error()));
        match report.ensure_complete() {
            Err(ApiError::PartialFailure { failed, total }) => {
                assert_eq!(failed, 1);
                assert_eq!(total, 2);
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_report_is_complete() {
        let report = BulkReport::new();
        assert!(report.is_empty());
        assert_eq!(report.summary(), "0 succeeded, 0 failed");
        assert!(report.ensure_complete().is_ok());
    }
}
