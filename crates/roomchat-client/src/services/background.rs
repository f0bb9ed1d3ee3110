//! Decorative background images

use tracing::instrument;

use crate::http::{fallback_backgrounds, BackgroundImage};

use super::context::ServiceContext;

/// Results requested per search
pub const BACKGROUNDS_PER_PAGE: u32 = 20;

/// Background image service
pub struct BackgroundService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> BackgroundService<'a> {
    /// Create a new BackgroundService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Never fails: without a search client, or on any search failure,
    /// the built-in list is returned
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Vec<BackgroundImage> {
        match self.ctx.images() {
            Some(client) => client.search_or_fallback(query, BACKGROUNDS_PER_PAGE).await,
            None => fallback_backgrounds(),
        }
    }
}
