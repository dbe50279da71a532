use std::sync::{Arc, Mutex};

use hacker_pulse::{Completion, EpisodeContext, EpisodeMetadata, Summarizer, Usage};
use story_datastore::Story;

pub const TOKENS_PER_CALL: u64 = 1000;
pub const METADATA_TOKENS: u64 = 500;

#[derive(Clone, Default)]
pub struct MockSummarizer {
    /// Story URLs and episode sections, in call order
    pub calls: Arc<Mutex<Vec<String>>>,
    pub contexts: Arc<Mutex<Vec<EpisodeContext>>>,
    pub failing_urls: Vec<String>,
    pub malformed_metadata: bool,
}

impl MockSummarizer {
    pub fn failing_for(urls: &[&str]) -> Self {
        Self {
            failing_urls: urls.iter().map(|u| u.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_malformed_metadata() -> Self {
        Self {
            malformed_metadata: true,
            ..Default::default()
        }
    }

    pub fn story_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with("http"))
            .cloned()
            .collect()
    }

    fn completion(text: impl Into<String>) -> Completion {
        Completion {
            text: text.into(),
            usage: Usage {
                total_tokens: TOKENS_PER_CALL,
            },
        }
    }
}

impl Summarizer for MockSummarizer {
    const SUMMARIZER_MODEL: &'static str = "mock-gpt";
    const PRICE_PER_MILLION_TOKENS: f64 = 0.15;
    type Error = anyhow::Error;

    async fn summarize_story(
        &self,
        story: &Story,
        content: &str,
        episode: &EpisodeContext,
    ) -> Result<Completion, Self::Error> {
        self.calls.lock().unwrap().push(story.url.clone());
        self.contexts.lock().unwrap().push(episode.clone());
        assert!(content.contains(&story.url), "content should belong to the story");

        if self.failing_urls.contains(&story.url) {
            return Err(anyhow::anyhow!("API error: 500 - upstream timeout"));
        }
        Ok(Self::completion(format!("Summary of {}.", story.title)))
    }

    async fn introduction(&self, _body: &str, episode: &EpisodeContext) -> Result<Completion, Self::Error> {
        self.calls.lock().unwrap().push("introduction".into());
        self.contexts.lock().unwrap().push(episode.clone());
        Ok(Self::completion(format!(
            "Welcome to {}, I am {}.",
            episode.podcast_name, episode.narrator
        )))
    }

    async fn conclusion(&self, _body: &str, _episode: &EpisodeContext) -> Result<Completion, Self::Error> {
        self.calls.lock().unwrap().push("conclusion".into());
        Ok(Self::completion("Thanks for listening."))
    }

    async fn episode_metadata(
        &self,
        _body: &str,
        _episode: &EpisodeContext,
    ) -> Result<(EpisodeMetadata, Usage), Self::Error> {
        self.calls.lock().unwrap().push("metadata".into());
        if self.malformed_metadata {
            return Err(anyhow::anyhow!(
                "Malformed JSON in completion response; content: Title: oops"
            ));
        }
        Ok((
            EpisodeMetadata {
                title: "Mock Episode".into(),
                description: "Everything that happened today.".into(),
            },
            Usage {
                total_tokens: METADATA_TOKENS,
            },
        ))
    }
}
