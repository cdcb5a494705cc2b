//! Read-only CMS client.
//!
//! The CMS is an external collaborator queried over HTTP/JSON. A missing
//! project id disables the client entirely: every read then returns an
//! empty result instead of an error, so the rest of the system keeps
//! serving engagement data without content.

use crate::error::{ContentError, ContentResult};
use crate::models::{Banner, BannerImage, Category, Concept, Story};
use lantern_core::config::ContentConfig;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const CONCEPT_PROJECTION: &str = "{ _id, title, subtitle, \"slug\": slug.current, \
     \"category\": category->name, \"image\": image.asset->url, \
     \"backgroundImage\": backgroundImage.asset->url, order, isActive, layoutType }";

const STORY_PROJECTION: &str = "{ _id, title, \"category\": category->name, \
     \"image\": image.asset->url, listenTime, \"slug\": slug.current, order, isActive }";

/// Query response envelope.
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

struct CategoryCacheEntry {
    fetched_at: Instant,
    names: HashMap<String, String>,
}

/// CMS client with an owned, time-boxed category-name cache.
pub struct ContentClient {
    http: reqwest::Client,
    /// Fully-resolved query endpoint; `None` means the client is disabled.
    query_url: Option<Url>,
    category_ttl: Duration,
    category_cache: RwLock<Option<CategoryCacheEntry>>,
}

impl ContentClient {
    /// Build a client from configuration. Absent `project_id` (and no
    /// `base_url` override) yields a disabled client.
    pub fn new(config: &ContentConfig) -> ContentResult<Self> {
        let base = match (&config.base_url, &config.project_id) {
            (Some(base), _) => Some(base.clone()),
            (None, Some(project_id)) => Some(format!("https://{project_id}.api.sanity.io")),
            (None, None) => None,
        };

        let query_url = match base {
            Some(base) => {
                let url = Url::parse(&base)
                    .and_then(|url| {
                        url.join(&format!(
                            "/v{}/data/query/{}",
                            config.api_version, config.dataset
                        ))
                    })
                    .map_err(|e| ContentError::Url(e.to_string()))?;
                Some(url)
            }
            None => {
                tracing::warn!("CMS project id not configured; content reads return empty results");
                None
            }
        };

        Ok(Self {
            http: reqwest::Client::new(),
            query_url,
            category_ttl: config.category_ttl(),
            category_cache: RwLock::new(None),
        })
    }

    /// Whether the client has a CMS endpoint configured.
    pub fn is_enabled(&self) -> bool {
        self.query_url.is_some()
    }

    async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, &str)],
    ) -> ContentResult<Option<T>> {
        let Some(base) = &self.query_url else {
            return Ok(None);
        };

        let mut url = base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", groq);
            for (name, value) in params {
                // Parameter values are GROQ literals, so strings are quoted.
                pairs.append_pair(&format!("${name}"), &format!("\"{value}\""));
            }
        }

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentError::Status { status, body });
        }

        let envelope: QueryResponse<T> = serde_json::from_str(&response.text().await?)?;
        Ok(Some(envelope.result))
    }

    /// Fetch all active concepts, ordered.
    pub async fn concepts(&self) -> ContentResult<Vec<Concept>> {
        let groq = format!(
            "*[_type == \"concept\" && isActive == true] | order(order asc) {CONCEPT_PROJECTION}"
        );
        Ok(self.query(&groq, &[]).await?.unwrap_or_default())
    }

    /// Fetch a single active concept by slug.
    pub async fn concept_by_slug(&self, slug: &str) -> ContentResult<Option<Concept>> {
        let groq = format!(
            "*[_type == \"concept\" && slug.current == $slug && isActive == true][0] {CONCEPT_PROJECTION}"
        );
        Ok(self
            .query::<Option<Concept>>(&groq, &[("slug", slug)])
            .await?
            .flatten())
    }

    /// Fetch all active stories, ordered.
    pub async fn stories(&self) -> ContentResult<Vec<Story>> {
        let groq = format!(
            "*[_type == \"innerStory\" && isActive == true] | order(order asc) {STORY_PROJECTION}"
        );
        Ok(self.query(&groq, &[]).await?.unwrap_or_default())
    }

    /// Fetch a single active story by slug.
    pub async fn story_by_slug(&self, slug: &str) -> ContentResult<Option<Story>> {
        let groq = format!(
            "*[_type == \"innerStory\" && slug.current == $slug && isActive == true][0] {STORY_PROJECTION}"
        );
        Ok(self
            .query::<Option<Story>>(&groq, &[("slug", slug)])
            .await?
            .flatten())
    }

    /// Fetch the images of the active banner document, if any.
    pub async fn banners(&self) -> ContentResult<Vec<BannerImage>> {
        let groq = "*[_type == \"banner\" && isActive == true][0] \
             { _id, title, \"images\": images[]{ \"url\": asset->url, alt } }";
        let banner: Option<Banner> = self.query(groq, &[]).await?.flatten();
        Ok(banner.map(|b| b.images).unwrap_or_default())
    }

    /// Fetch all active categories, ordered.
    pub async fn categories(&self) -> ContentResult<Vec<Category>> {
        let groq = "*[_type == \"category\" && isActive == true] | order(order asc) \
             { _id, name, order, isActive }";
        Ok(self.query(groq, &[]).await?.unwrap_or_default())
    }

    /// Category display-name map, served from the time-boxed cache.
    ///
    /// Only successful fetches are cached; a fetch failure falls back to
    /// the stale entry when one exists.
    pub async fn category_names(&self) -> ContentResult<HashMap<String, String>> {
        {
            let cache = self.category_cache.read().await;
            if let Some(entry) = cache.as_ref() {
                if entry.fetched_at.elapsed() < self.category_ttl {
                    return Ok(entry.names.clone());
                }
            }
        }

        match self.categories().await {
            Ok(categories) => {
                let names: HashMap<String, String> = categories
                    .into_iter()
                    .map(|c| (c.name.clone(), c.name))
                    .collect();
                let mut cache = self.category_cache.write().await;
                *cache = Some(CategoryCacheEntry {
                    fetched_at: Instant::now(),
                    names: names.clone(),
                });
                Ok(names)
            }
            Err(err) => {
                let cache = self.category_cache.read().await;
                if let Some(entry) = cache.as_ref() {
                    tracing::warn!(error = %err, "category refresh failed; serving stale cache");
                    return Ok(entry.names.clone());
                }
                Err(err)
            }
        }
    }
}
