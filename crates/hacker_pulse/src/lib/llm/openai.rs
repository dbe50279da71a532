use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use story_datastore::Story;

use crate::{
    cost::pricing,
    llm::{
        summarizer::{Completion, EpisodeContext, EpisodeMetadata, Summarizer, Usage},
        tokens,
    },
    tts::{read_audio_response, SpeechSynthesizer, SynthesisError},
};

#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Completion response had no content")]
    EmptyCompletion,
    #[error("Malformed JSON in completion response: {source}; content: {content}")]
    MalformedResponse {
        content: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Chat message as sent to `/chat/completions`
#[derive(Debug, serde::Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

impl OpenAIClient {
    const STORY_PROMPT: &'static str = include_str!("./prompts/story_summary.txt");
    const INTRODUCTION_PROMPT: &'static str = include_str!("./prompts/introduction.txt");
    const CONCLUSION_PROMPT: &'static str = include_str!("./prompts/conclusion.txt");
    const METADATA_PROMPT: &'static str = include_str!("./prompts/episode_metadata.txt");

    const SPEECH_MODEL: &'static str = "tts-1";
    const SPEECH_PROVIDER: &'static str = "openai";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub async fn send_completion_request(
        &self,
        model_name: impl Into<String>,
        system_prompt: &str,
        user_content: &str,
        json_response: bool,
    ) -> Result<CompletionResponse, SummarizeError> {
        let mut messages = vec![
            Message {
                role: "system",
                content: system_prompt,
            },
            Message {
                role: "user",
                content: user_content,
            },
        ];
        if json_response {
            messages.push(Message {
                role: "user",
                content: "Please format your entire response as a JSON object with keys 'Title' and 'Description'.",
            });
        }

        let mut body = serde_json::json!({
            "model": model_name.into(),
            "messages": messages,
        });
        if json_response {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SummarizeError::Api { status, message });
        }

        Ok(resp.json::<CompletionResponse>().await?)
    }

    pub async fn send_speech_request(
        &self,
        model_name: &str,
        voice: &str,
        input: &str,
    ) -> Result<Bytes, SynthesisError> {
        let body = serde_json::json!({
            "model": model_name,
            "voice": voice,
            "input": input,
            "response_format": "mp3",
        });

        let resp = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))
            .map_err(|source| SynthesisError::Transport {
                provider: Self::SPEECH_PROVIDER,
                source,
            })?;

        read_audio_response(Self::SPEECH_PROVIDER, resp).await
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<Completion, SummarizeError> {
        let response = self
            .send_completion_request(
                <Self as Summarizer>::SUMMARIZER_MODEL,
                system_prompt,
                user_content,
                false,
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to complete prompt"))?;

        let usage = response.usage.unwrap_or_default();
        let text = response
            .into_content()
            .ok_or(SummarizeError::EmptyCompletion)?;

        Ok(Completion { text, usage })
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub choices: Vec<CompletionChoice>,
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Content of the first choice, if any
    pub fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

/// Parses the `{Title, Description}` object returned in JSON mode
pub fn parse_episode_metadata(content: &str) -> Result<EpisodeMetadata, SummarizeError> {
    serde_json::from_str::<EpisodeMetadata>(content).map_err(|source| {
        SummarizeError::MalformedResponse {
            content: content.to_string(),
            source,
        }
    })
}

impl Summarizer for OpenAIClient {
    const SUMMARIZER_MODEL: &'static str = "gpt-4o-mini";
    const PRICE_PER_MILLION_TOKENS: f64 = pricing::GPT_4O_MINI_PER_MILLION_TOKENS;
    type Error = SummarizeError;

    #[tracing::instrument(skip(self, content, episode), fields(url = %story.url))]
    async fn summarize_story(
        &self,
        story: &Story,
        content: &str,
        episode: &EpisodeContext,
    ) -> Result<Completion, Self::Error> {
        let content = tokens::truncate_to_tokens(content, Self::CONTEXT_WINDOW_LIMIT);
        let user_content = format!(
            "Title:{}\nURL:{}\nContent:{}",
            story.title, story.url, content
        );
        self.complete(&episode.render(Self::STORY_PROMPT), &user_content)
            .await
    }

    #[tracing::instrument(skip_all)]
    async fn introduction(
        &self,
        body: &str,
        episode: &EpisodeContext,
    ) -> Result<Completion, Self::Error> {
        self.complete(&episode.render(Self::INTRODUCTION_PROMPT), body)
            .await
    }

    #[tracing::instrument(skip_all)]
    async fn conclusion(
        &self,
        body: &str,
        episode: &EpisodeContext,
    ) -> Result<Completion, Self::Error> {
        self.complete(&episode.render(Self::CONCLUSION_PROMPT), body)
            .await
    }

    #[tracing::instrument(skip_all)]
    async fn episode_metadata(
        &self,
        body: &str,
        episode: &EpisodeContext,
    ) -> Result<(EpisodeMetadata, Usage), Self::Error> {
        let response = self
            .send_completion_request(
                Self::SUMMARIZER_MODEL,
                &episode.render(Self::METADATA_PROMPT),
                body,
                true,
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to generate episode metadata"))?;

        let usage = response.usage.unwrap_or_default();
        let content = response
            .into_content()
            .ok_or(SummarizeError::EmptyCompletion)?;

        let metadata = parse_episode_metadata(&content)
            .inspect_err(|e| tracing::error!(error = %e, "Episode metadata is not valid JSON"))?;

        Ok((metadata, usage))
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAIClient {
    fn name(&self) -> &'static str {
        Self::SPEECH_PROVIDER
    }

    fn max_chunk_chars(&self) -> usize {
        4096
    }

    fn price_per_million_chars(&self) -> f64 {
        pricing::OPENAI_TTS_PER_MILLION_CHARS
    }

    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, SynthesisError> {
        self.send_speech_request(Self::SPEECH_MODEL, voice_id, text)
            .await
    }
}
