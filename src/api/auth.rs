use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, PrincipalDto};
use crate::access::Principal;

const SESSION_PRINCIPAL_KEY: &str = "principal";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Gate protected routes on a live session. Handlers re-read the principal
/// through [`require_principal`].
pub async fn auth_middleware(
    State(_state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Ok(Some(principal)) = session.get::<Principal>(SESSION_PRINCIPAL_KEY).await {
        tracing::Span::current().record("user_id", principal.id);
        return Ok(next.run(request).await);
    }

    Err(ApiError::Unauthorized("Not authenticated".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password, establishes a session
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<PrincipalDto>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .store()
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let principal = Principal {
        id: user.id,
        role: user.role,
        username: user.username.clone(),
    };

    if let Err(e) = session.insert(SESSION_PRINCIPAL_KEY, &principal).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    tracing::info!("User logged in: {}", user.username);

    Ok(Json(ApiResponse::success(PrincipalDto {
        id: user.id,
        username: user.username,
        role: user.role,
    })))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
/// Current principal (requires authentication)
pub async fn get_current_user(
    session: Session,
) -> Result<Json<ApiResponse<PrincipalDto>>, ApiError> {
    let principal = require_principal(&session).await?;

    Ok(Json(ApiResponse::success(PrincipalDto {
        id: principal.id,
        username: principal.username,
        role: principal.role,
    })))
}

// ============================================================================
// Helpers
// ============================================================================

/// Get the principal from the session, returns Unauthorized if absent
pub async fn require_principal(session: &Session) -> Result<Principal, ApiError> {
    session
        .get::<Principal>(SESSION_PRINCIPAL_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}

/// Get the principal and require the PARENT role
pub async fn require_parent(session: &Session) -> Result<Principal, ApiError> {
    let principal = require_principal(session).await?;
    if !principal.is_parent() {
        return Err(ApiError::forbidden("Parent role required"));
    }
    Ok(principal)
}
