//! Read-only CMS client for Lantern.
//!
//! Fetches concepts, inner stories, banners and categories from the
//! headless CMS. All reads are best-effort: the server degrades content
//! failures to empty results rather than failing requests.

pub mod client;
pub mod error;
pub mod models;

pub use client::ContentClient;
pub use error::{ContentError, ContentResult};
pub use models::{Banner, BannerImage, Category, Concept, Story};
