// File: agent/src/types.rs
use engine::{BackupOutcome, Exploration, WalkReport};
use serde::{Deserialize, Serialize};

// === REQUEST STRUCTURES ===

#[derive(Debug, Deserialize)]
pub struct ExplorerRequest {
    pub endpoint: String,
}

#[derive(Debug, Deserialize)]
pub struct BackupRequest {
    pub endpoint: String,
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub endpoint: String,
    pub backup_id: String,
}

// === RESPONSE STRUCTURES ===

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success_with_data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Data of `POST /v1/explorer`
pub type ExplorerResult = Exploration;

#[derive(Debug, Serialize)]
pub struct BackupResult {
    pub backup_id: String,
    pub archive: String,
    pub keys_written: usize,
    pub keys_failed: usize,
}

impl From<BackupOutcome> for BackupResult {
    fn from(outcome: BackupOutcome) -> Self {
        Self {
            keys_written: outcome.report.written,
            keys_failed: outcome.report.failed(),
            archive: outcome.archive.display().to_string(),
            backup_id: outcome.basename,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RestoreResult {
    pub keys_restored: usize,
    pub keys_failed: usize,
}

impl From<WalkReport> for RestoreResult {
    fn from(report: WalkReport) -> Self {
        Self {
            keys_restored: report.written,
            keys_failed: report.failed(),
        }
    }
}
