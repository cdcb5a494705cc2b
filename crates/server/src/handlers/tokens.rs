//! Public access token administration.
//!
//! All operations require a master session. A token grants anonymous access
//! to one path pattern; its code is the shareable secret.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::require_master;
use crate::session::CurrentUser;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use lantern_core::{AccessCode, PathPattern};
use lantern_metadata::models::AccessTokenRow;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub code: String,
    pub path: String,
    pub created_at: String,
}

impl From<AccessTokenRow> for TokenResponse {
    fn from(row: AccessTokenRow) -> Self {
        Self {
            code: row.code,
            path: row.path,
            created_at: row.created_at.format(&Rfc3339).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    pub path: String,
    /// Custom code; omitted codes are generated (32 hex chars).
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTokenRequest {
    pub path: String,
    /// Replacement code; omitting it keeps the current one.
    #[serde(default)]
    pub new_code: Option<String>,
}

fn validate_path(path: &str) -> ApiResult<PathPattern> {
    PathPattern::parse(path).map_err(ApiError::from)
}

/// GET /api/public-tokens
pub async fn list_tokens(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> ApiResult<Json<Value>> {
    require_master(user.as_ref().map(|Extension(u)| u))?;

    let tokens: Vec<TokenResponse> = state
        .metadata
        .list_access_tokens()
        .await?
        .into_iter()
        .map(TokenResponse::from)
        .collect();
    Ok(Json(json!({ "tokens": tokens })))
}

/// POST /api/public-tokens
pub async fn create_token(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Json(body): Json<CreateTokenRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require_master(user.as_ref().map(|Extension(u)| u))?;

    let pattern = validate_path(&body.path)?;
    let code = match body.code.as_deref() {
        Some(code) => AccessCode::parse(code)?,
        None => AccessCode::generate(),
    };

    let row = AccessTokenRow {
        code: code.into_string(),
        path: pattern.as_str().to_string(),
        created_at: OffsetDateTime::now_utc(),
    };
    state.metadata.create_access_token(&row).await?;

    tracing::info!(path = %row.path, "public access token created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "token": TokenResponse::from(row) })),
    ))
}

/// PUT /api/public-tokens/{code}
///
/// Changing the code replaces the row transactionally so the old link stops
/// working the moment the new one exists.
pub async fn update_token(
    State(state): State<AppState>,
    Path(code): Path<String>,
    user: Option<Extension<CurrentUser>>,
    Json(body): Json<UpdateTokenRequest>,
) -> ApiResult<Json<Value>> {
    require_master(user.as_ref().map(|Extension(u)| u))?;

    let pattern = validate_path(&body.path)?;
    let row = match body.new_code.as_deref() {
        Some(new_code) if new_code != code => {
            let new_code = AccessCode::parse(new_code)?;
            state
                .metadata
                .replace_access_token(&code, new_code.as_str(), pattern.as_str())
                .await?
        }
        _ => {
            state
                .metadata
                .update_access_token_path(&code, pattern.as_str())
                .await?
        }
    };

    Ok(Json(json!({ "token": TokenResponse::from(row) })))
}

/// DELETE /api/public-tokens/{code}
pub async fn delete_token(
    State(state): State<AppState>,
    Path(code): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> ApiResult<Json<Value>> {
    require_master(user.as_ref().map(|Extension(u)| u))?;

    state.metadata.delete_access_token(&code).await?;
    Ok(Json(json!({ "success": true })))
}
