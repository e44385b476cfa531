//! HTTP request handlers for the agent server

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::Json as ResponseJson,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::types::*;
use crate::AppState;

pub async fn get_version() -> ResponseJson<ApiResponse<VersionInfo>> {
    ResponseJson(ApiResponse::success_with_data(VersionInfo::default()))
}

// === Discovery handlers ===

pub async fn explore_endpoint(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExplorerRequest>,
) -> Result<ResponseJson<ApiResponse<ExplorerResult>>, StatusCode> {
    match engine::explore(&request.endpoint, &state.config.tls).await {
        Ok(exploration) => Ok(ResponseJson(ApiResponse::success_with_data(exploration))),
        Err(e) => {
            info!("Exploring {} failed: {}", request.endpoint, e);
            Ok(ResponseJson(ApiResponse::error(e.to_string())))
        }
    }
}

// === Backup and restore handlers ===

pub async fn create_backup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BackupRequest>,
) -> Result<ResponseJson<ApiResponse<BackupResult>>, StatusCode> {
    info!("Backup requested for {}", request.endpoint);

    match engine::backup(&request.endpoint, &state.config.tls, &state.config.work_dir).await {
        Ok(outcome) => Ok(ResponseJson(ApiResponse::success_with_data(outcome.into()))),
        Err(e) => {
            error!("Backup of {} failed: {}", request.endpoint, e);
            Ok(ResponseJson(ApiResponse::error(e.to_string())))
        }
    }
}

pub async fn restore_backup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RestoreRequest>,
) -> Result<ResponseJson<ApiResponse<RestoreResult>>, StatusCode> {
    info!(
        "Restore of backup {} requested for {}",
        request.backup_id, request.endpoint
    );

    if !is_valid_backup_id(&request.backup_id) {
        return Ok(ResponseJson(ApiResponse::error(format!(
            "Invalid backup id: {}",
            request.backup_id
        ))));
    }

    match engine::restore_with_report(
        &request.backup_id,
        &state.config.work_dir,
        &request.endpoint,
        &state.config.tls,
    )
    .await
    {
        Ok(report) => Ok(ResponseJson(ApiResponse::success_with_data(report.into()))),
        Err(e) => {
            error!("Restore of {} failed: {}", request.backup_id, e);
            Ok(ResponseJson(ApiResponse::error(e.to_string())))
        }
    }
}

/// A backup id names one archive directly inside the work directory
fn is_valid_backup_id(backup_id: &str) -> bool {
    !backup_id.is_empty()
        && backup_id != "."
        && backup_id != ".."
        && !backup_id.contains(['/', '\\'])
}
