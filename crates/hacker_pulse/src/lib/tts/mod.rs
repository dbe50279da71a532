//! Text-to-speech providers.
//!
//! Every provider implements [`SpeechSynthesizer`]; the rest of the pipeline
//! only ever talks to that trait. Providers make exactly one request per call
//! and never retry.

pub mod elevenlabs;
pub mod unreal;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{rate_limit::RateLimiter, text::DEFAULT_MAX_CHUNK_CHARS};

/// Longest response body excerpt kept in a [`SynthesisError`]
const BODY_EXCERPT_CHARS: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned HTTP {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} returned an empty audio payload")]
    EmptyAudio { provider: &'static str },
}

impl SynthesisError {
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Transport { provider, .. }
            | Self::Api { provider, .. }
            | Self::EmptyAudio { provider } => *provider,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            Self::EmptyAudio { .. } => None,
        }
    }
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Provider name used in logs and errors
    fn name(&self) -> &'static str;

    /// Largest chunk, in characters, the provider reliably accepts
    fn max_chunk_chars(&self) -> usize {
        DEFAULT_MAX_CHUNK_CHARS
    }

    /// US dollars per million synthesized characters
    fn price_per_million_chars(&self) -> f64;

    /// Synthesizes `text` with `voice_id`, returning MP3 bytes
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, SynthesisError>;
}

#[async_trait]
impl<S: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn max_chunk_chars(&self) -> usize {
        (**self).max_chunk_chars()
    }

    fn price_per_million_chars(&self) -> f64 {
        (**self).price_per_million_chars()
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, SynthesisError> {
        (**self).synthesize(text, voice_id).await
    }
}

/// A synthesizer whose calls are paced by a [`RateLimiter`]
#[derive(Debug)]
pub struct RateLimited<S, R> {
    inner: S,
    limiter: R,
}

impl<S, R> RateLimited<S, R> {
    pub fn new(inner: S, limiter: R) -> Self {
        Self { inner, limiter }
    }
}

#[async_trait]
impl<S, R> SpeechSynthesizer for RateLimited<S, R>
where
    S: SpeechSynthesizer,
    R: RateLimiter + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn max_chunk_chars(&self) -> usize {
        self.inner.max_chunk_chars()
    }

    fn price_per_million_chars(&self) -> f64 {
        self.inner.price_per_million_chars()
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, SynthesisError> {
        self.limiter.acquire().await;
        self.inner.synthesize(text, voice_id).await
    }
}

/// Truncates a response body to something fit for an error message
pub(crate) fn body_excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

/// Turns a provider response into audio bytes or a typed error
pub(crate) async fn read_audio_response(
    provider: &'static str,
    resp: reqwest::Response,
) -> Result<Bytes, SynthesisError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = body_excerpt(&resp.text().await.unwrap_or_default());
        tracing::error!(provider, status, %body, "Speech synthesis request rejected");
        return Err(SynthesisError::Api {
            provider,
            status,
            body,
        });
    }

    let audio = resp
        .bytes()
        .await
        .map_err(|source| SynthesisError::Transport { provider, source })?;

    if audio.is_empty() {
        return Err(SynthesisError::EmptyAudio { provider });
    }

    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::FixedInterval;
    use std::{sync::Mutex, time::Duration};

    struct Recorder {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SpeechSynthesizer for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn max_chunk_chars(&self) -> usize {
            100
        }

        fn price_per_million_chars(&self) -> f64 {
            1.0
        }

        async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, SynthesisError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), voice_id.to_string()));
            Ok(Bytes::from_static(b"audio"))
        }
    }

    #[test]
    fn test_body_excerpt_is_bounded() {
        let long = "x".repeat(2_000);
        let excerpt = body_excerpt(&long);
        assert_eq!(excerpt.chars().count(), BODY_EXCERPT_CHARS + 1);
        assert!(excerpt.ends_with('…'));
        assert_eq!(body_excerpt("  short body \n"), "short body");
    }

    #[test]
    fn test_error_exposes_provider_and_status() {
        let err = SynthesisError::Api {
            provider: "elevenlabs",
            status: 429,
            body: "slow down".into(),
        };
        assert_eq!(err.provider(), "elevenlabs");
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.to_string(), "elevenlabs returned HTTP 429: slow down");

        let empty = SynthesisError::EmptyAudio { provider: "unreal" };
        assert_eq!(empty.status(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_paces_and_delegates() {
        let synth = RateLimited::new(
            Recorder {
                calls: Mutex::new(Vec::new()),
            },
            FixedInterval::new(Duration::from_secs(1)),
        );

        let start = tokio::time::Instant::now();
        synth.synthesize("one", "alloy").await.unwrap();
        synth.synthesize("two", "echo").await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(1));
        assert_eq!(synth.name(), "recorder");
        assert_eq!(synth.max_chunk_chars(), 100);

        let calls = synth.inner.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                ("one".to_string(), "alloy".to_string()),
                ("two".to_string(), "echo".to_string())
            ]
        );
    }
}
