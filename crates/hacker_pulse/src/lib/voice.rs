//! Voice selection policies.
//!
//! A policy maps a chunk position to the voice that reads it. Policies are
//! pure: the same policy always answers the same way for the same chunk.

use chrono::{Datelike, Weekday};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VoiceError {
    #[error("Weekday index must be in 0..7 (Monday = 0), got {0}")]
    InvalidWeekday(usize),
    #[error("Expected exactly 7 weekday voices, got {0}")]
    WrongVoiceCount(usize),
    #[error("Voice id must not be empty")]
    EmptyVoice,
}

pub trait VoicePolicy: Send + Sync {
    fn select_voice(&self, chunk_index: usize) -> &str;
}

impl<P: VoicePolicy + ?Sized> VoicePolicy for Box<P> {
    fn select_voice(&self, chunk_index: usize) -> &str {
        (**self).select_voice(chunk_index)
    }
}

/// The voice chosen for one chunk of a run
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct VoiceAssignment {
    pub chunk_index: usize,
    pub voice_id: String,
}

/// One voice for every chunk
#[derive(Debug, Clone)]
pub struct Fixed(String);

impl Fixed {
    pub fn new(voice_id: impl Into<String>) -> Result<Self, VoiceError> {
        let voice_id = voice_id.into();
        if voice_id.trim().is_empty() {
            return Err(VoiceError::EmptyVoice);
        }
        Ok(Self(voice_id))
    }
}

impl VoicePolicy for Fixed {
    fn select_voice(&self, _chunk_index: usize) -> &str {
        &self.0
    }
}

/// Two-voice dialogue: even chunks get the primary voice, odd chunks the secondary
#[derive(Debug, Clone)]
pub struct Alternating {
    primary: String,
    secondary: String,
}

impl Alternating {
    pub fn new(
        primary: impl Into<String>,
        secondary: impl Into<String>,
    ) -> Result<Self, VoiceError> {
        let (primary, secondary) = (primary.into(), secondary.into());
        if primary.trim().is_empty() || secondary.trim().is_empty() {
            return Err(VoiceError::EmptyVoice);
        }
        Ok(Self { primary, secondary })
    }
}

impl VoicePolicy for Alternating {
    fn select_voice(&self, chunk_index: usize) -> &str {
        if chunk_index % 2 == 0 {
            &self.primary
        } else {
            &self.secondary
        }
    }
}

/// Seven voices, one per weekday, Monday first
#[derive(Debug, Clone)]
pub struct WeekdayVoices([String; 7]);

impl WeekdayVoices {
    /// The rotation used for OpenAI voices
    pub fn openai_default() -> Self {
        Self(
            ["alloy", "echo", "fable", "onyx", "nova", "shimmer", "echo"]
                .map(String::from),
        )
    }

    pub fn voice_for(&self, weekday: usize) -> Result<&str, VoiceError> {
        self.0
            .get(weekday)
            .map(String::as_str)
            .ok_or(VoiceError::InvalidWeekday(weekday))
    }
}

impl TryFrom<Vec<String>> for WeekdayVoices {
    type Error = VoiceError;

    fn try_from(voices: Vec<String>) -> Result<Self, Self::Error> {
        if voices.iter().any(|v| v.trim().is_empty()) {
            return Err(VoiceError::EmptyVoice);
        }
        let count = voices.len();
        let voices: [String; 7] = voices
            .try_into()
            .map_err(|_| VoiceError::WrongVoiceCount(count))?;
        Ok(Self(voices))
    }
}

/// A single voice picked once per run from the weekday rotation
#[derive(Debug, Clone)]
pub struct DayKeyed {
    weekday: usize,
    voice: String,
}

impl DayKeyed {
    /// `weekday` counts from Monday = 0 to Sunday = 6
    pub fn new(voices: &WeekdayVoices, weekday: usize) -> Result<Self, VoiceError> {
        let voice = voices.voice_for(weekday)?.to_string();
        Ok(Self { weekday, voice })
    }

    pub fn for_weekday(voices: &WeekdayVoices, weekday: Weekday) -> Self {
        let weekday = weekday.num_days_from_monday() as usize;
        Self {
            weekday,
            voice: voices.0[weekday].clone(),
        }
    }

    /// Picks the voice from today's weekday in `tz`
    pub fn today<Tz: chrono::TimeZone>(voices: &WeekdayVoices, tz: &Tz) -> Self {
        let today = chrono::Utc::now().with_timezone(tz).weekday();
        Self::for_weekday(voices, today)
    }

    pub fn weekday(&self) -> usize {
        self.weekday
    }
}

impl VoicePolicy for DayKeyed {
    fn select_voice(&self, _chunk_index: usize) -> &str {
        &self.voice
    }
}
