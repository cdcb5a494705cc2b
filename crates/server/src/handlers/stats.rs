//! Engagement endpoints: likes, bookmarks, read counters.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::require_user;
use crate::session::CurrentUser;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// Full engagement state of one story, scoped to the requesting user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryStatsResponse {
    pub likes: i64,
    pub reads: i64,
    pub is_liked: bool,
    pub is_bookmarked: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatsActionRequest {
    /// "like", "bookmark", or "read".
    #[serde(rename = "type")]
    pub action: String,
}

fn validate_slug(slug: &str) -> ApiResult<()> {
    if slug.is_empty() || slug.len() > 256 {
        return Err(ApiError::BadRequest("invalid story slug".to_string()));
    }
    Ok(())
}

/// Assemble the stats object. Likes come from the authoritative join table;
/// reads from the counter row; the per-user flags only when authenticated.
async fn assemble_stats(
    state: &AppState,
    slug: &str,
    user_id: Option<Uuid>,
) -> ApiResult<StoryStatsResponse> {
    let likes = state.metadata.count_likes(slug).await?;
    let reads = state
        .metadata
        .get_story_stats(slug)
        .await?
        .map(|row| row.reads)
        .unwrap_or(0);

    let (is_liked, is_bookmarked) = match user_id {
        Some(user_id) => (
            state.metadata.is_liked(slug, user_id).await?,
            state.metadata.is_bookmarked(slug, user_id).await?,
        ),
        None => (false, false),
    };

    Ok(StoryStatsResponse {
        likes,
        reads,
        is_liked,
        is_bookmarked,
    })
}

/// GET /api/stories/{slug}/stats
///
/// Zero-state slugs report all-zero stats; there are no side effects.
pub async fn get_story_stats(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> ApiResult<Json<StoryStatsResponse>> {
    validate_slug(&slug)?;
    let user_id = user.as_ref().map(|Extension(u)| u.user_id);
    Ok(Json(assemble_stats(&state, &slug, user_id).await?))
}

/// POST /api/stories/{slug}/stats
///
/// `like` and `bookmark` toggle and require a session; `read` increments
/// anonymously. All three respond with the full stats object.
pub async fn post_story_stats(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    user: Option<Extension<CurrentUser>>,
    Json(body): Json<StatsActionRequest>,
) -> ApiResult<Json<StoryStatsResponse>> {
    validate_slug(&slug)?;
    let user = user.as_ref().map(|Extension(u)| u);

    match body.action.as_str() {
        "like" => {
            let user = require_user(user)?;
            let toggle = state.metadata.toggle_like(&slug, user.user_id).await?;
            let is_bookmarked = state.metadata.is_bookmarked(&slug, user.user_id).await?;
            let reads = state
                .metadata
                .get_story_stats(&slug)
                .await?
                .map(|row| row.reads)
                .unwrap_or(0);
            Ok(Json(StoryStatsResponse {
                likes: toggle.likes,
                reads,
                is_liked: toggle.is_liked,
                is_bookmarked,
            }))
        }
        "bookmark" => {
            let user = require_user(user)?;
            let is_bookmarked = state.metadata.toggle_bookmark(&slug, user.user_id).await?;
            let mut stats = assemble_stats(&state, &slug, Some(user.user_id)).await?;
            stats.is_bookmarked = is_bookmarked;
            Ok(Json(stats))
        }
        "read" => {
            let reads = state.metadata.increment_reads(&slug).await?;
            let user_id = user.map(|u| u.user_id);
            let mut stats = assemble_stats(&state, &slug, user_id).await?;
            stats.reads = reads;
            Ok(Json(stats))
        }
        other => Err(ApiError::BadRequest(format!(
            "unknown stats action: {other}"
        ))),
    }
}

/// GET /api/bookmarks — the authenticated user's bookmarked slugs, newest
/// first.
pub async fn list_bookmarks(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> ApiResult<Json<Value>> {
    let user = require_user(user.as_ref().map(|Extension(u)| u))?;
    let bookmarks = state.metadata.list_bookmarks(user.user_id).await?;
    Ok(Json(json!({ "bookmarks": bookmarks })))
}
