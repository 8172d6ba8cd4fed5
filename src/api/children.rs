use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{require_parent, require_principal};
use super::validation::{validate_allowance, validate_child_id, validate_name, validate_username};
use super::{ApiError, ApiResponse, AppState, ChildDto, CreateChildRequest, MessageResponse};
use crate::access::{self, Operation};
use crate::db::NewChild;
use crate::entities::users::Role;

const DEFAULT_DAILY_ALLOWANCE: i32 = 180;
const MANUAL_RESET_REASON: &str = "Daily allowance reset";

/// Number of recent ledger entries attached to a child profile response
pub(super) const RECENT_ENTRIES: u64 = 10;

pub(super) async fn child_with_entries(
    state: &AppState,
    child: crate::entities::children::Model,
) -> Result<ChildDto, ApiError> {
    let entries = state
        .store()
        .recent_entries(child.id, RECENT_ENTRIES)
        .await
        .map_err(|e| ApiError::database(format!("Failed to load ledger: {e}")))?;
    Ok(ChildDto::from_parts(child, entries))
}

/// GET /children
/// Parents see all their children; a child login sees a one-element array
/// with its own profile.
pub async fn list_children(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<ChildDto>>>, ApiError> {
    let principal = require_principal(&session).await?;

    let children = match principal.role {
        Role::Parent => state
            .store()
            .list_children_for_parent(principal.id)
            .await
            .map_err(|e| ApiError::database(format!("Failed to list children: {e}")))?,
        Role::Child => {
            let child = state
                .store()
                .get_child_by_user(principal.id)
                .await
                .map_err(|e| ApiError::database(format!("Failed to load profile: {e}")))?
                .ok_or_else(|| ApiError::NotFound("Child profile not found".to_string()))?;
            vec![child]
        }
    };

    let mut dtos = Vec::with_capacity(children.len());
    for child in children {
        dtos.push(child_with_entries(&state, child).await?);
    }

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /children
/// Create a child profile; a linked login account is created when a
/// password is supplied.
pub async fn create_child(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateChildRequest>,
) -> Result<Json<ApiResponse<ChildDto>>, ApiError> {
    let principal = require_parent(&session).await?;

    let name = payload
        .name
        .as_deref()
        .ok_or_else(|| ApiError::validation("Name is required"))?;
    let name = validate_name(name)?;

    let username = payload
        .username
        .as_deref()
        .ok_or_else(|| ApiError::validation("Username is required"))?;
    let username = validate_username(username)?;

    let daily_allowance = match payload.daily_allowance {
        Some(minutes) => validate_allowance(minutes)?,
        None => DEFAULT_DAILY_ALLOWANCE,
    };

    // The username must be free in both tables: a profile may exist without
    // a login, and a login created later must not collide either.
    let profile_taken = state
        .store()
        .get_child_by_username(username)
        .await
        .map_err(|e| ApiError::database(format!("Failed to check username: {e}")))?
        .is_some();
    let login_taken = state
        .store()
        .get_user_by_username(username)
        .await
        .map_err(|e| ApiError::database(format!("Failed to check username: {e}")))?
        .is_some();
    if profile_taken || login_taken {
        return Err(ApiError::Conflict(format!(
            "Username '{}' is already taken",
            username
        )));
    }

    let password = payload.password.as_deref().filter(|p| !p.is_empty());

    let password_hash = if let Some(password) = password {
        let config = state.config().read().await;
        let hash = state
            .store()
            .hash_password(password, &config.security)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))?;
        Some(hash)
    } else {
        None
    };

    let child = state
        .store()
        .create_child(NewChild {
            parent_id: principal.id,
            name,
            username,
            daily_allowance,
            password_hash: password_hash.as_deref(),
        })
        .await
        .map_err(|e| ApiError::database(format!("Failed to create child: {e}")))?;

    let dto = child_with_entries(&state, child).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// DELETE /children/{id}
/// Ownership is required; a foreign child reads as not found.
pub async fn delete_child(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let principal = require_parent(&session).await?;
    let id = validate_child_id(id)?;

    // Writes against a foreign child read as not found
    let child = state
        .store()
        .get_child(id)
        .await
        .map_err(|e| ApiError::database(format!("Failed to load child: {e}")))?;

    match child {
        Some(child) if access::permits(&principal, &child, Operation::Write) => {}
        _ => return Err(ApiError::child_not_found(id)),
    }

    let deleted = state
        .store()
        .delete_child(id)
        .await
        .map_err(|e| ApiError::database(format!("Failed to delete child: {e}")))?;
    if !deleted {
        return Err(ApiError::child_not_found(id));
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Child deleted successfully".to_string(),
    })))
}

/// POST /children/{id}/reset
/// Manual reset: restore the balance to the daily allowance and log a
/// RESET entry attributed to the acting parent.
pub async fn reset_child(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ChildDto>>, ApiError> {
    let principal = require_parent(&session).await?;
    let id = validate_child_id(id)?;

    let child = state
        .store()
        .get_child(id)
        .await
        .map_err(|e| ApiError::database(format!("Failed to load child: {e}")))?;

    match child {
        Some(child) if access::permits(&principal, &child, Operation::Write) => {}
        _ => return Err(ApiError::child_not_found(id)),
    }

    let now = chrono::Utc::now().to_rfc3339();
    let updated = state
        .store()
        .reset_child(id, principal.id, MANUAL_RESET_REASON, &now)
        .await
        .map_err(|e| ApiError::database(format!("Failed to reset child: {e}")))?
        .ok_or_else(|| ApiError::child_not_found(id))?;

    let dto = child_with_entries(&state, updated).await?;
    Ok(Json(ApiResponse::success(dto)))
}
