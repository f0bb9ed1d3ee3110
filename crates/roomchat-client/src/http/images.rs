//! Background image search
//!
//! Every failure path (no key, network, non-2xx, bad body, no results)
//! yields the built-in list instead of an error.

use roomchat_common::ImageSearchConfig;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use url::Url;

use super::{build_client, checked_body, HttpError};

/// Decorative background image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub id: String,
    pub url: String,
    pub thumb_url: String,
    pub description: Option<String>,
}

const FALLBACK_BACKGROUNDS: &[(&str, &str)] = &[
    ("fallback-mountains", "https://images.unsplash.com/photo-1506905925346-21bda4d32df4"),
    ("fallback-forest", "https://images.unsplash.com/photo-1441974231531-c6227db76b6e"),
    ("fallback-ocean", "https://images.unsplash.com/photo-1507525428034-b723cf961d3e"),
    ("fallback-city", "https://images.unsplash.com/photo-1477959858617-67f85cf4f1df"),
    ("fallback-sky", "https://images.unsplash.com/photo-1419242902214-272b3f66ee7a"),
];

/// The built-in list served when search is unavailable
pub fn fallback_backgrounds() -> Vec<BackgroundImage> {
    FALLBACK_BACKGROUNDS
        .iter()
        .map(|(id, base)| BackgroundImage {
            id: (*id).to_string(),
            url: format!("{base}?w=1080&q=80"),
            thumb_url: format!("{base}?w=200&q=60"),
            description: None,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: String,
    urls: ResultUrls,
    #[serde(default)]
    alt_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultUrls {
    regular: String,
    small: String,
}

impl From<SearchResult> for BackgroundImage {
    fn from(result: SearchResult) -> Self {
        Self {
            id: result.id,
            url: result.urls.regular,
            thumb_url: result.urls.small,
            description: result.alt_description,
        }
    }
}

/// Image-search API client
#[derive(Debug, Clone)]
pub struct ImageSearchClient {
    http: reqwest::Client,
    api_url: String,
    access_key: Option<String>,
}

impl ImageSearchClient {
    pub fn new(
        api_url: impl Into<String>,
        access_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, HttpError> {
        Ok(Self {
            http: build_client(timeout_secs)?,
            api_url: api_url.into(),
            access_key,
        })
    }

    pub fn from_config(config: &ImageSearchConfig) -> Result<Self, HttpError> {
        Self::new(
            config.api_url.clone(),
            config.access_key.clone(),
            config.timeout_secs,
        )
    }

    /// Search, falling back to the built-in list on any failure
    #[instrument(skip(self))]
    pub async fn search_or_fallback(&self, query: &str, per_page: u32) -> Vec<BackgroundImage> {
        match self.search(query, per_page).await {
            Ok(images) if !images.is_empty() => images,
            Ok(_) => {
                warn!("Image search returned nothing, using fallback list");
                fallback_backgrounds()
            }
            Err(e) => {
                warn!(error = %e, "Image search failed, using fallback list");
                fallback_backgrounds()
            }
        }
    }

    /// Raw search; errors are returned to the caller
    pub async fn search(&self, query: &str, per_page: u32) -> Result<Vec<BackgroundImage>, HttpError> {
        let Some(key) = &self.access_key else {
            return Ok(Vec::new());
        };

        let url = Url::parse_with_params(
            &self.api_url,
            &[
                ("query", query),
                ("per_page", &per_page.to_string()),
                ("orientation", "portrait"),
            ],
        )?;

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, format!("Client-ID {key}"))
            .send()
            .await?;
        let body = checked_body(resp).await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;

        Ok(parsed.results.into_iter().map(BackgroundImage::from).collect())
    }
}
