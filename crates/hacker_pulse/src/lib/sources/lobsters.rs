use reqwest::Client;
use serde::Deserialize;
use story_datastore::Story;

use super::{get_json, FetchError, StorySource};

#[derive(Debug, Clone)]
pub struct LobstersSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LobstersStory {
    title: String,
    #[serde(default)]
    url: String,
}

impl LobstersSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: "https://lobste.rs".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl StorySource for LobstersSource {
    fn name(&self) -> &'static str {
        "Lobsters"
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_stories(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
        let url = format!("{}/hottest.json", self.base_url);
        let stories: Vec<LobstersStory> = get_json(self.client.get(&url), &url).await?;

        Ok(stories
            .into_iter()
            // Text posts have an empty url
            .filter(|s| !s.url.is_empty())
            .take(limit)
            .map(|s| Story::new(s.title, s.url))
            .collect())
    }
}
