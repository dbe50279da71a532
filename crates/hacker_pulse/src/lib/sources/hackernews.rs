use futures::{stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use story_datastore::Story;

use super::{get_json, FetchError, Interval, StorySource};

/// Stories from the official HackerNews Firebase API
#[derive(Debug, Clone)]
pub struct HackerNewsSource {
    client: Client,
    base_url: String,
    interval: Interval,
    concurrency: usize,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    url: Option<String>,
}

impl HackerNewsSource {
    pub const DEFAULT_CONCURRENCY: usize = 8;

    pub fn new(client: Client, interval: Interval) -> Self {
        Self {
            client,
            base_url: "https://hacker-news.firebaseio.com/v0".into(),
            interval,
            concurrency: Self::DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    fn list_endpoint(&self) -> &'static str {
        match self.interval {
            Interval::Daily => "topstories",
            Interval::Weekly => "beststories",
            Interval::Monthly => "askstories",
        }
    }

    async fn fetch_item(&self, id: u64) -> Result<Option<Story>, FetchError> {
        let url = format!("{}/item/{id}.json", self.base_url);
        // Deleted items come back as `null`
        let item: Option<Item> = get_json(self.client.get(&url), &url).await?;

        Ok(item.and_then(|item| match (item.title, item.url) {
            (Some(title), Some(url)) if !url.is_empty() => Some(Story::new(title, url)),
            _ => None,
        }))
    }
}

impl StorySource for HackerNewsSource {
    fn name(&self) -> &'static str {
        "HackerNews"
    }

    #[tracing::instrument(skip(self), fields(interval = self.interval.as_str()))]
    async fn fetch_stories(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
        let url = format!("{}/{}.json", self.base_url, self.list_endpoint());
        let ids: Vec<u64> = get_json(self.client.get(&url), &url).await?;

        // Text posts have no URL, so over-fetch ids and keep the first `limit` link stories.
        // A broken item only loses that story.
        let stories = stream::iter(ids)
            .map(|id| self.fetch_item(id))
            .buffered(self.concurrency)
            .filter_map(|item| async move {
                item.inspect_err(|e| tracing::warn!(error = %e, "Skipping HackerNews item"))
                    .ok()
                    .flatten()
            })
            .take(limit)
            .collect::<Vec<_>>()
            .await;

        tracing::info!(count = stories.len(), "Fetched HackerNews stories");

        Ok(stories)
    }
}
