use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;

use crate::{
    cost::pricing,
    tts::{read_audio_response, SpeechSynthesizer, SynthesisError},
};

pub struct ElevenLabsClient {
    client: Client,
    api_key: String,
    base_url: String,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
        }
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    voice_settings: VoiceSettings,
}

impl ElevenLabsClient {
    const PROVIDER: &'static str = "elevenlabs";
    /// Daniel
    pub const DEFAULT_MALE_VOICE: &'static str = "onwK4e9ZLuTAKqWW03F9";
    /// Matilda
    pub const DEFAULT_FEMALE_VOICE: &'static str = "XrExE9yKIg1WjnnlVkGX";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.elevenlabs.io".into(),
            voice_settings: VoiceSettings::default(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_voice_settings(mut self, voice_settings: VoiceSettings) -> Self {
        self.voice_settings = voice_settings;
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    fn name(&self) -> &'static str {
        Self::PROVIDER
    }

    fn price_per_million_chars(&self) -> f64 {
        pricing::ELEVENLABS_PER_MILLION_CHARS
    }

    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, SynthesisError> {
        let resp = self
            .client
            .post(format!("{}/v1/text-to-speech/{voice_id}", self.base_url))
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&SpeechRequest {
                text,
                voice_settings: self.voice_settings,
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
