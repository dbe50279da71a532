use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use hacker_pulse::tts::{SpeechSynthesizer, SynthesisError};
use tokio_util::sync::CancellationToken;

/// MPEG1 Layer III frame header, 128 kbps, 44.1 kHz
pub const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];

pub const PRICE_PER_MILLION_CHARS: f64 = 20.0;

/// The audio the mock returns for `text`
pub fn mock_audio(text: &str) -> Vec<u8> {
    let mut audio = FRAME_HEADER.to_vec();
    audio.extend_from_slice(text.as_bytes());
    audio
}

#[derive(Clone)]
pub struct MockSynthesizer {
    pub max_chars: usize,
    /// `(text, voice)` per call
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
    /// Zero based call number that fails with a server error
    pub fail_on_call: Option<usize>,
    /// Cancels the token once this many calls have completed
    pub cancel_after: Option<(usize, CancellationToken)>,
}

impl MockSynthesizer {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on_call: None,
            cancel_after: None,
        }
    }

    pub fn failing_on_call(max_chars: usize, call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::new(max_chars)
        }
    }

    pub fn cancelling_after(max_chars: usize, calls: usize, token: CancellationToken) -> Self {
        Self {
            cancel_after: Some((calls, token)),
            ..Self::new(max_chars)
        }
    }

    pub fn voices(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, v)| v.clone()).collect()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn max_chunk_chars(&self) -> usize {
        self.max_chars
    }

    fn price_per_million_chars(&self) -> f64 {
        PRICE_PER_MILLION_CHARS
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, SynthesisError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((text.to_string(), voice_id.to_string()));
            calls.len() - 1
        };

        if let Some((after, token)) = &self.cancel_after {
            if call + 1 >= *after {
                token.cancel();
            }
        }

        if self.fail_on_call == Some(call) {
            return Err(SynthesisError::Api {
                provider: "mock",
                status: 500,
                body: "internal error".into(),
            });
        }

        // Like the real providers, refuse anything over the limit
        if text.chars().count() > self.max_chars {
            return Err(SynthesisError::Api {
                provider: "mock",
                status: 400,
                body: "text too long".into(),
            });
        }

        Ok(Bytes::from(mock_audio(text)))
    }
}
