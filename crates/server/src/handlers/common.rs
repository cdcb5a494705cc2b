//! Shared handler helpers.

use crate::error::{ApiError, ApiResult};
use crate::session::CurrentUser;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

/// Require an authenticated session (401 otherwise).
pub fn require_user(user: Option<&CurrentUser>) -> ApiResult<&CurrentUser> {
    user.ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
}

/// Require an authenticated master session (401 unauthenticated, 403 wrong
/// role).
pub fn require_master(user: Option<&CurrentUser>) -> ApiResult<&CurrentUser> {
    let user = require_user(user)?;
    if !user.is_master() {
        return Err(ApiError::Forbidden("master role required".to_string()));
    }
    Ok(user)
}

/// Health check: verifies store connectivity. Intentionally unauthenticated
/// for load balancer probes.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.metadata.health_check().await?;
    Ok(Json(json!({ "status": "ok" })))
}
