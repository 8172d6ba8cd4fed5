use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{require_parent, require_principal};
use super::children::child_with_entries;
use super::validation::{validate_amount, validate_child_id, validate_reason};
use super::{
    ApiError, ApiResponse, AppState, AppendEntryRequest, ChildDto, EntriesQuery, TimeEntryDto,
};
use crate::access::{self, Operation};
use crate::entities::time_entries::EntryKind;

/// Number of ledger entries returned by the history endpoint
const HISTORY_LIMIT: u64 = 50;

/// POST /time-entries
/// Append a signed ledger entry and return the child with its updated
/// balance. RESET entries are produced by the reset endpoints, never here.
pub async fn append_entry(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<AppendEntryRequest>,
) -> Result<Json<ApiResponse<ChildDto>>, ApiError> {
    let principal = require_parent(&session).await?;

    let child_id = payload
        .child_id
        .ok_or_else(|| ApiError::validation("Child ID is required"))?;
    let child_id = validate_child_id(child_id)?;

    let amount = payload
        .amount
        .ok_or_else(|| ApiError::validation("Amount is required"))?;
    let amount = validate_amount(amount)?;

    let reason = payload
        .reason
        .as_deref()
        .ok_or_else(|| ApiError::validation("Reason is required"))?;
    let reason = validate_reason(reason)?;

    let kind = payload
        .kind
        .ok_or_else(|| ApiError::validation("Entry kind is required"))?;
    if kind == EntryKind::Reset {
        return Err(ApiError::validation(
            "RESET entries are created by the reset operation, not directly",
        ));
    }

    let child = state
        .store()
        .get_child(child_id)
        .await
        .map_err(|e| ApiError::database(format!("Failed to load child: {e}")))?;

    match child {
        Some(child) if access::permits(&principal, &child, Operation::Write) => {}
        _ => return Err(ApiError::child_not_found(child_id)),
    }

    let updated = state
        .store()
        .apply_entry(child_id, kind, amount, reason, principal.id)
        .await
        .map_err(|e| ApiError::database(format!("Failed to append entry: {e}")))?
        .ok_or_else(|| ApiError::child_not_found(child_id))?;

    let dto = child_with_entries(&state, updated).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// GET /time-entries?child_id=N
/// The 50 newest entries for a child the caller may read.
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<ApiResponse<Vec<TimeEntryDto>>>, ApiError> {
    let principal = require_principal(&session).await?;

    let child_id = query
        .child_id
        .ok_or_else(|| ApiError::validation("Child ID is required"))?;
    let child_id = validate_child_id(child_id)?;

    let child = state
        .store()
        .get_child(child_id)
        .await
        .map_err(|e| ApiError::database(format!("Failed to load child: {e}")))?
        .ok_or_else(|| ApiError::child_not_found(child_id))?;

    if !access::permits(&principal, &child, Operation::Read) {
        return Err(ApiError::forbidden(
            "You do not have access to this child's entries",
        ));
    }

    let entries = state
        .store()
        .recent_entries(child_id, HISTORY_LIMIT)
        .await
        .map_err(|e| ApiError::database(format!("Failed to load entries: {e}")))?;

    let dtos = entries.into_iter().map(TimeEntryDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}
