//! HTTP server for the Lantern reading site.
//!
//! This crate provides the HTTP control plane:
//! - Request-time access gate (sessions + shareable access codes)
//! - Engagement endpoints (likes, bookmarks, read counters)
//! - Public access token administration
//! - First-party auth (signup, login, logout, callback landing)
//! - Read-only content proxies over the CMS

pub mod bootstrap;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use session::CurrentUser;
pub use state::AppState;
