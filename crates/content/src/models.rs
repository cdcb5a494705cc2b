//! Content types returned by the CMS.
//!
//! These mirror the projections the client requests, so the documents
//! deserialize directly without an intermediate raw layer.

use serde::{Deserialize, Serialize};

/// A concept page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub is_active: bool,
    /// "portrait" or "landscape"; absent documents render as portrait.
    #[serde(default)]
    pub layout_type: Option<String>,
}

/// An inner story.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub listen_time: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub is_active: bool,
}

/// One image of the active banner carousel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerImage {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// The active banner document (at most one).
#[derive(Debug, Clone, Deserialize)]
pub struct Banner {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub images: Vec<BannerImage>,
}

/// A story/concept category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub is_active: bool,
}
