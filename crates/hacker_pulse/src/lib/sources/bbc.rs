use reqwest::Client;
use story_datastore::Story;

use super::{get_text, headline_stories, FetchError, StorySource};
use crate::parser::parse_bbc_promos;

/// Promoted stories of the BBC News front page
#[derive(Debug, Clone)]
pub struct BbcNewsSource {
    client: Client,
    base_url: String,
}

impl BbcNewsSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: "https://www.bbc.com".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl StorySource for BbcNewsSource {
    fn name(&self) -> &'static str {
        "BBC News"
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_stories(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
        let url = format!("{}/news", self.base_url.trim_end_matches('/'));
        let html = get_text(self.client.get(&url), &url).await?;

        let promos = parse_bbc_promos(&html)
            .inspect_err(|e| tracing::error!(error = %e, "Failed to parse BBC News page"))
            .map_err(|e| FetchError::Decode {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        // The same story is often promoted in several page sections
        Ok(headline_stories(&self.base_url, promos, limit))
    }
}
