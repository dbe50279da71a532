pub mod algolia;
pub mod bbc;
pub mod bensbites;
pub mod content;
pub mod digest;
pub mod hackernews;
pub mod lobsters;

use std::future::Future;

use itertools::Itertools;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use story_datastore::Story;

use crate::parser::Headline;

pub use algolia::AlgoliaFrontPageSource;
pub use bbc::BbcNewsSource;
pub use bensbites::BensBitesSource;
pub use content::{ContentFetcher, HttpContentFetcher};
pub use digest::DigestSource;
pub use hackernews::HackerNewsSource;
pub use lobsters::LobstersSource;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected status {status} fetching {url}")]
    Status { url: String, status: u16 },
    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Http { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }
}

/// How far back a source looks when ranking stories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
        }
    }
}

pub trait StorySource {
    /// Human readable label used in prompts and logs
    fn name(&self) -> &'static str;

    /// Returns at most `limit` stories, best ranked first
    fn fetch_stories(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Story>, FetchError>> + Send;
}

impl<T: StorySource + Sync> StorySource for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn fetch_stories(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Story>, FetchError>> + Send {
        (**self).fetch_stories(limit)
    }
}

/// Source picked at runtime from configuration
#[derive(Debug, Clone)]
pub enum AnySource {
    HackerNews(HackerNewsSource),
    Algolia(AlgoliaFrontPageSource),
    Digest(DigestSource),
    Lobsters(LobstersSource),
    BensBites(BensBitesSource),
    Bbc(BbcNewsSource),
}

impl StorySource for AnySource {
    fn name(&self) -> &'static str {
        match self {
            AnySource::HackerNews(s) => s.name(),
            AnySource::Algolia(s) => s.name(),
            AnySource::Digest(s) => s.name(),
            AnySource::Lobsters(s) => s.name(),
            AnySource::BensBites(s) => s.name(),
            AnySource::Bbc(s) => s.name(),
        }
    }

    async fn fetch_stories(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
        match self {
            AnySource::HackerNews(s) => s.fetch_stories(limit).await,
            AnySource::Algolia(s) => s.fetch_stories(limit).await,
            AnySource::Digest(s) => s.fetch_stories(limit).await,
            AnySource::Lobsters(s) => s.fetch_stories(limit).await,
            AnySource::BensBites(s) => s.fetch_stories(limit).await,
            AnySource::Bbc(s) => s.fetch_stories(limit).await,
        }
    }
}

/// Sends `request` and decodes a JSON body, attributing failures to `url`
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    url: &str,
) -> Result<T, FetchError> {
    let body = get_body(request, url).await?;

    serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Sends `request` and returns the body as text, for sources that scrape HTML
pub(crate) async fn get_text(request: RequestBuilder, url: &str) -> Result<String, FetchError> {
    let body = get_body(request, url).await?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Turns a link found on `base`'s pages into an absolute URL
pub(crate) fn resolve_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href.trim_start_matches('/'))
    }
}

/// Absolute, deduplicated stories from scraped headlines, page order kept
pub(crate) fn headline_stories(base: &str, headlines: Vec<Headline>, limit: usize) -> Vec<Story> {
    headlines
        .into_iter()
        .map(|h| Story::new(h.title, resolve_url(base, &h.href)))
        .unique_by(|s| s.url.clone())
        .take(limit)
        .collect()
}

async fn get_body(request: RequestBuilder, url: &str) -> Result<bytes::Bytes, FetchError> {
    let resp = request
        .send()
        .await
        .inspect_err(|e| tracing::error!(error = %e, url, "Failed to make http request"))
        .map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

    if !resp.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: resp.status().as_u16(),
        });
    }

    resp.bytes().await.map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })
}
