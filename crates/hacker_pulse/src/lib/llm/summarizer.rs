use std::{
    fmt::{Debug, Display},
    future::Future,
};

use serde::Deserialize;
use story_datastore::Story;

pub trait Summarizer {
    const CONTEXT_WINDOW_LIMIT: usize = 128_000 - 18_000;
    const SUMMARIZER_MODEL: &'static str;
    /// US dollars per million tokens, prompt and completion alike
    const PRICE_PER_MILLION_TOKENS: f64;

    type Error: Debug + Display + Send + Sync + 'static;

    fn summarize_story(
        &self,
        story: &Story,
        content: &str,
        episode: &EpisodeContext,
    ) -> impl Future<Output = Result<Completion, Self::Error>> + Send;

    fn introduction(
        &self,
        body: &str,
        episode: &EpisodeContext,
    ) -> impl Future<Output = Result<Completion, Self::Error>> + Send;

    fn conclusion(
        &self,
        body: &str,
        episode: &EpisodeContext,
    ) -> impl Future<Output = Result<Completion, Self::Error>> + Send;

    fn episode_metadata(
        &self,
        body: &str,
        episode: &EpisodeContext,
    ) -> impl Future<Output = Result<(EpisodeMetadata, Usage), Self::Error>> + Send;
}

/// Who is talking, about what, and when
#[derive(Debug, Clone)]
pub struct EpisodeContext {
    pub podcast_name: String,
    pub narrator: String,
    pub source_label: String,
    /// Human readable air date, e.g. "September 24, 2024"
    pub date: String,
}

impl EpisodeContext {
    /// Fills the `{podcast}`, `{narrator}`, `{source}` and `{date}` placeholders
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{podcast}", &self.podcast_name)
            .replace("{narrator}", &self.narrator)
            .replace("{source}", &self.source_label)
            .replace("{date}", &self.date)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    pub total_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EpisodeMetadata {
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Description", default)]
    pub description: String,
}
