use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;

use crate::{
    cost::pricing,
    tts::{read_audio_response, SpeechSynthesizer, SynthesisError},
};

pub struct UnrealSpeechClient {
    client: Client,
    api_key: String,
    base_url: String,
    bitrate: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StreamRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    bitrate: &'a str,
}

impl UnrealSpeechClient {
    const PROVIDER: &'static str = "unreal-speech";
    pub const DEFAULT_VOICE: &'static str = "Liv";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.v7.unrealspeech.com".into(),
            bitrate: "192k".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = bitrate.into();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for UnrealSpeechClient {
    fn name(&self) -> &'static str {
        Self::PROVIDER
    }

    /// The streaming endpoint caps requests at 1000 characters
    fn max_chunk_chars(&self) -> usize {
        950
    }

    fn price_per_million_chars(&self) -> f64 {
        pricing::UNREAL_SPEECH_PER_MILLION_CHARS
    }

    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, SynthesisError> {
        let resp = self
            .client
            .post(format!("{}/stream", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&StreamRequest {
                text,
                voice_id,
                bitrate: &self.bitrate,
            })
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))
            .map_err(|source| SynthesisError::Transport {
                provider: Self::PROVIDER,
                source,
            })?;

        read_audio_response(Self::PROVIDER, resp).await
    }
}
