use axum::{Json, extract::State};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{require_parent, require_principal};
use super::{ApiError, ApiResponse, AppState, SweepResultDto, SystemStatus};

/// GET /system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    require_principal(&session).await?;

    let users = state
        .store()
        .count_users()
        .await
        .map_err(|e| ApiError::database(format!("Failed to count users: {e}")))?;
    let children = state
        .store()
        .count_children()
        .await
        .map_err(|e| ApiError::database(format!("Failed to count children: {e}")))?;
    let ledger_entries = state
        .store()
        .count_entries()
        .await
        .map_err(|e| ApiError::database(format!("Failed to count entries: {e}")))?;

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        users,
        children,
        ledger_entries,
    })))
}

/// POST /sweep
/// Run the automatic reset sweep on demand. Parent only.
pub async fn run_sweep(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<SweepResultDto>>, ApiError> {
    require_parent(&session).await?;

    let stats = state
        .sweep
        .run()
        .await
        .map_err(|e| ApiError::internal(format!("Sweep failed: {e}")))?;

    Ok(Json(ApiResponse::success(SweepResultDto {
        count: stats.count,
    })))
}
