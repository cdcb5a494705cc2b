//! HTTP request handlers.

pub mod auth;
pub mod common;
pub mod content;
pub mod stats;
pub mod tokens;

pub use auth::{callback, login, logout, signup};
pub use common::health_check;
pub use content::{
    get_concept, get_story, list_banners, list_categories, list_concepts, list_stories,
};
pub use stats::{get_story_stats, list_bookmarks, post_story_stats};
pub use tokens::{create_token, delete_token, list_tokens, update_token};
