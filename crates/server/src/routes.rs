//! Route configuration.

use crate::gate::access_gate;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check (intentionally unauthenticated for load balancers/probes)
        .route("/api/health", get(handlers::health_check))
        // Engagement
        .route(
            "/api/stories/{slug}/stats",
            get(handlers::get_story_stats).post(handlers::post_story_stats),
        )
        .route("/api/bookmarks", get(handlers::list_bookmarks))
        // Access token administration (master role)
        .route(
            "/api/public-tokens",
            get(handlers::list_tokens).post(handlers::create_token),
        )
        .route(
            "/api/public-tokens/{code}",
            axum::routing::put(handlers::update_token).delete(handlers::delete_token),
        )
        // Content proxies
        .route("/api/concepts", get(handlers::list_concepts))
        .route("/api/concepts/{slug}", get(handlers::get_concept))
        .route("/api/stories", get(handlers::list_stories))
        .route("/api/stories/{slug}", get(handlers::get_story))
        .route("/api/banners", get(handlers::list_banners))
        .route("/api/categories", get(handlers::list_categories));

    let auth_routes = Router::new()
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/callback", get(handlers::callback));

    // The gate wraps everything, including unmatched paths: protected app
    // pages have no handlers here, but requests to them are still
    // classified (redirect or pass) before falling through.
    Router::new()
        .merge(api_routes)
        .merge(auth_routes)
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
