//! Content proxy endpoints.
//!
//! Read-only views over the CMS. Fetch failures degrade to empty results
//! with a warning instead of propagating: engagement features must keep
//! working when the CMS is down or unconfigured.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};

fn degrade<T: Default>(result: lantern_content::ContentResult<T>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "{what} fetch failed; serving empty result");
            T::default()
        }
    }
}

/// GET /api/concepts
pub async fn list_concepts(State(state): State<AppState>) -> Json<Value> {
    let concepts = degrade(state.content.concepts().await, "concepts");
    Json(json!({ "concepts": concepts }))
}

/// GET /api/concepts/{slug}
pub async fn get_concept(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Value>> {
    let concept = degrade(state.content.concept_by_slug(&slug).await, "concept");
    match concept {
        Some(concept) => Ok(Json(json!({ "concept": concept }))),
        None => Err(ApiError::NotFound(format!("concept '{slug}' not found"))),
    }
}

/// GET /api/stories
pub async fn list_stories(State(state): State<AppState>) -> Json<Value> {
    let stories = degrade(state.content.stories().await, "stories");
    Json(json!({ "stories": stories }))
}

/// GET /api/stories/{slug}
pub async fn get_story(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Value>> {
    let story = degrade(state.content.story_by_slug(&slug).await, "story");
    match story {
        Some(story) => Ok(Json(json!({ "story": story }))),
        None => Err(ApiError::NotFound(format!("story '{slug}' not found"))),
    }
}

/// GET /api/banners
pub async fn list_banners(State(state): State<AppState>) -> Json<Value> {
    let banners = degrade(state.content.banners().await, "banners");
    Json(json!({ "banners": banners }))
}

/// GET /api/categories — name map served through the client's time-boxed
/// cache.
pub async fn list_categories(State(state): State<AppState>) -> Json<Value> {
    let categories = degrade(state.content.category_names().await, "categories");
    Json(json!({ "categories": categories }))
}
