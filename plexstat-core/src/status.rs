use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::reconcile::RefreshReport;

/// Health bookkeeping for the refresh loop, shared with the HTTP layer.
#[derive(Debug, Default)]
pub struct RefreshStatus {
    successes: AtomicU64,
    failures: AtomicU64,
    overlaps: AtomicU64,
    inner: RwLock<StatusInner>,
}

#[derive(Debug, Default)]
struct StatusInner {
    last_success: Option<DateTime<Utc>>,
    last_error: Option<FailureRecord>,
    last_report: Option<RefreshReport>,
}

/// A failed cycle as surfaced by `/healthz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Serializable view of [`RefreshStatus`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub successes: u64,
    pub failures: u64,
    pub overlaps: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<FailureRecord>,
    pub last_report: Option<RefreshReport>,
}

impl StatusSnapshot {
    /// Ready once any cycle has committed.
    pub fn is_ready(&self) -> bool {
        self.last_success.is_some()
    }
}

impl RefreshStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, report: &RefreshReport, at: DateTime<Utc>) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.write();
        inner.last_success = Some(at);
        inner.last_report = Some(report.clone());
    }

    /// Keeps the last successful report; only the error slot moves.
    pub fn record_failure(&self, message: impl Into<String>, at: DateTime<Utc>) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_error = Some(FailureRecord {
            at,
            message: message.into(),
        });
    }

    pub fn record_overlap(&self) {
        self.overlaps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self.inner.read();
        StatusSnapshot {
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            overlaps: self.overlaps.load(Ordering::Relaxed),
            last_success: inner.last_success,
            last_error: inner.last_error.clone(),
            last_report: inner.last_report.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_does_not_clear_last_success() {
        let status = RefreshStatus::new();
        assert!(!status.snapshot().is_ready());

        let report = RefreshReport {
            tracked: 4,
            added: 4,
            ..Default::default()
        };
        let ok_at = Utc::now();
        status.record_success(&report, ok_at);
        status.record_failure("connection refused", ok_at);
        status.record_overlap();

        let snapshot = status.snapshot();
        assert!(snapshot.is_ready());
        assert_eq!(snapshot.successes, 1);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.overlaps, 1);
        assert_eq!(snapshot.last_success, Some(ok_at));
        assert_eq!(snapshot.last_report.map(|r| r.tracked), Some(4));
        assert_eq!(
            snapshot.last_error.map(|e| e.message),
            Some("connection refused".to_string())
        );
    }
}
