use reqwest::Client;
use serde::Deserialize;
use story_datastore::Story;

use super::{get_json, FetchError, StorySource};

/// HackerNews front page stories above a score threshold, via the Algolia search API
#[derive(Debug, Clone)]
pub struct AlgoliaFrontPageSource {
    client: Client,
    base_url: String,
    min_points: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    title: Option<String>,
    url: Option<String>,
}

impl AlgoliaFrontPageSource {
    pub const DEFAULT_MIN_POINTS: u32 = 100;

    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: "https://hn.algolia.com/api/v1".into(),
            min_points: Self::DEFAULT_MIN_POINTS,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_min_points(mut self, min_points: u32) -> Self {
        self.min_points = min_points;
        self
    }
}

impl StorySource for AlgoliaFrontPageSource {
    fn name(&self) -> &'static str {
        "HackerNews"
    }

    #[tracing::instrument(skip(self), fields(min_points = self.min_points))]
    async fn fetch_stories(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
        let url = format!("{}/search", self.base_url);
        let request = self.client.get(&url).query(&[
            ("query", String::new()),
            ("tags", "front_page".to_string()),
            ("numericFilters", format!("points>{}", self.min_points)),
            ("hitsPerPage", limit.to_string()),
        ]);

        let response: SearchResponse = get_json(request, &url).await?;

        let stories = response
            .hits
            .into_iter()
            .filter_map(|hit| match (hit.title, hit.url) {
                (Some(title), Some(url)) if !url.is_empty() => Some(Story::new(title, url)),
                _ => None,
            })
            .take(limit)
            .collect::<Vec<_>>();

        tracing::info!(count = stories.len(), "Fetched Algolia front page stories");

        Ok(stories)
    }
}
