use reqwest::Client;
use story_datastore::Story;

use super::{get_text, headline_stories, FetchError, StorySource};
use crate::parser::parse_bensbites_posts;

/// Top posts of the Ben's Bites AI news board
#[derive(Debug, Clone)]
pub struct BensBitesSource {
    client: Client,
    base_url: String,
}

impl BensBitesSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: "https://news.bensbites.com".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl StorySource for BensBitesSource {
    fn name(&self) -> &'static str {
        "Ben's Bites"
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_stories(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        let html = get_text(self.client.get(&url), &url).await?;

        let headlines = parse_bensbites_posts(&html)
            .inspect_err(|e| tracing::error!(error = %e, "Failed to parse Ben's Bites page"))
            .map_err(|e| FetchError::Decode {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        Ok(headline_stories(&self.base_url, headlines, limit))
    }
}
