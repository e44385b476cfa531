// File: engine/src/report.rs
use serde::Serialize;
use tracing::warn;

/// A key skipped during a walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyFailure {
    pub key: String,
    pub reason: String,
}

/// Result of one best-effort walk over a keyspace or mirror
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    pub written: usize,
    pub failures: Vec<KeyFailure>,
}

impl WalkReport {
    pub fn record_written(&mut self) {
        self.written += 1;
    }

    /// Logs the failure and keeps it for the caller
    pub fn record_failure(&mut self, key: &str, reason: impl ToString) {
        let reason = reason.to_string();
        warn!("Skipping key {}: {}", key, reason);
        self.failures.push(KeyFailure {
            key: key.to_string(),
            reason,
        });
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}
