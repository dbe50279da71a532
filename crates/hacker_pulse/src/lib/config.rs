//! Runtime configuration, parsed from CLI flags with environment fallbacks.
//!
//! The binary flattens these structs into its subcommands; the `build_*` helpers turn a
//! validated configuration into the components the pipeline runs with.

use std::{path::PathBuf, time::Duration};

use chrono_tz::Tz;
use clap::{Args, ValueEnum};

use crate::{
    aggregator::FailurePolicy,
    audio::{AudioMerger, FfmpegMerger, FrameConcatMerger},
    openai::OpenAIClient,
    rate_limit::FixedInterval,
    sources::{
        AlgoliaFrontPageSource, AnySource, BbcNewsSource, BensBitesSource, DigestSource,
        HackerNewsSource, Interval, LobstersSource,
    },
    tts::{elevenlabs::ElevenLabsClient, unreal::UnrealSpeechClient, RateLimited, SpeechSynthesizer},
    voice::{Alternating, DayKeyed, Fixed, VoiceError, VoicePolicy, WeekdayVoices},
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required but not set")]
    MissingApiKey(&'static str),
    #[error("Invalid voice configuration: {0}")]
    Voice(#[from] VoiceError),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Parses an IANA time zone name such as `America/New_York`
pub fn parse_timezone(s: &str) -> Result<Tz, String> {
    s.parse::<Tz>().map_err(|e| e.to_string())
}

/// Provider credentials, shared by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct Credentials {
    /// OpenAI API key, used for summaries and OpenAI speech
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub openai_api_key: Option<String>,

    /// ElevenLabs API key
    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true, global = true)]
    pub elevenlabs_api_key: Option<String>,

    /// Unreal Speech API key
    #[arg(long, env = "UNREAL_API_KEY", hide_env_values = true, global = true)]
    pub unreal_api_key: Option<String>,

    /// GitHub token for the digest source, raises the API rate limit
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub github_token: Option<String>,
}

impl Credentials {
    fn require<'a>(key: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
        key.as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey(name))
    }

    pub fn openai(&self) -> Result<&str, ConfigError> {
        Self::require(&self.openai_api_key, "OPENAI_API_KEY")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    #[default]
    Openai,
    Elevenlabs,
    Unreal,
}

impl ProviderKind {
    /// Voices used when none are configured: a primary and an alternate
    pub fn default_voices(&self) -> (&'static str, &'static str) {
        match self {
            ProviderKind::Openai => ("alloy", "nova"),
            ProviderKind::Elevenlabs => (
                ElevenLabsClient::DEFAULT_MALE_VOICE,
                ElevenLabsClient::DEFAULT_FEMALE_VOICE,
            ),
            ProviderKind::Unreal => (UnrealSpeechClient::DEFAULT_VOICE, "Zoe"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum VoicePolicyKind {
    /// One voice per run, picked from the weekday rotation
    #[default]
    Day,
    /// Primary and secondary voice on even and odd chunks
    Alternating,
    /// The same voice throughout
    Fixed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MergerKind {
    /// Concatenate MPEG frames, no re-encoding
    #[default]
    FrameConcat,
    /// Re-encode through the ffmpeg binary
    Ffmpeg,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// HackerNews Firebase rankings
    #[default]
    Hackernews,
    /// HackerNews front page stories above 100 points, via Algolia search
    Algolia,
    /// Curated HackerNews digests on GitHub
    Digest,
    Lobsters,
    /// Ben's Bites AI news board
    Bensbites,
    /// BBC News front page promos
    Bbc,
}

#[derive(Debug, Clone, Args)]
pub struct PodcastConfig {
    /// Text-to-speech provider
    #[arg(long, env = "HACKER_PULSE_TTS_PROVIDER", value_enum, default_value_t = ProviderKind::Openai)]
    pub provider: ProviderKind,

    /// How voices are assigned to chunks
    #[arg(long, value_enum, default_value_t = VoicePolicyKind::Day)]
    pub voice_policy: VoicePolicyKind,

    /// Voice for the fixed policy, primary voice for the alternating policy
    #[arg(long)]
    pub voice: Option<String>,

    /// Odd chunk voice for the alternating policy
    #[arg(long)]
    pub secondary_voice: Option<String>,

    /// Seven comma separated voices, Monday first, for the day policy
    #[arg(long, value_delimiter = ',')]
    pub weekday_voices: Vec<String>,

    /// How chunk audio is merged into the episode
    #[arg(long, value_enum, default_value_t = MergerKind::FrameConcat)]
    pub merger: MergerKind,

    /// ffmpeg binary used by the ffmpeg merger
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    pub ffmpeg_path: PathBuf,

    /// Chunk size limit in characters, defaults to and is capped at the provider's limit
    #[arg(long)]
    pub max_chunk_chars: Option<usize>,

    /// Pause between synthesis calls in milliseconds
    #[arg(long, env = "HACKER_PULSE_SYNTHESIS_INTERVAL_MS", default_value_t = 1000)]
    pub synthesis_interval_ms: u64,

    /// Directory for temporary chunk audio, defaults to the system temp dir
    #[arg(long, env = "HACKER_PULSE_WORKDIR")]
    pub workdir: Option<PathBuf>,
}

impl Default for PodcastConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            voice_policy: VoicePolicyKind::default(),
            voice: None,
            secondary_voice: None,
            weekday_voices: Vec::new(),
            merger: MergerKind::default(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            max_chunk_chars: None,
            synthesis_interval_ms: 1000,
            workdir: None,
        }
    }
}

impl PodcastConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunk_chars == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_chunk_chars",
                reason: "must be greater than zero".into(),
            });
        }
        if self.voice.as_deref().is_some_and(|v| v.trim().is_empty())
            || self.secondary_voice.as_deref().is_some_and(|v| v.trim().is_empty())
        {
            return Err(VoiceError::EmptyVoice.into());
        }
        if !self.weekday_voices.is_empty() {
            WeekdayVoices::try_from(self.weekday_voices.clone())?;
        }
        Ok(())
    }

    pub fn synthesis_interval(&self) -> Duration {
        Duration::from_millis(self.synthesis_interval_ms)
    }

    /// The provider client, paced by the configured synthesis interval
    pub fn build_synthesizer(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn SpeechSynthesizer>, ConfigError> {
        let inner: Box<dyn SpeechSynthesizer> = match self.provider {
            ProviderKind::Openai => Box::new(OpenAIClient::new(credentials.openai()?)),
            ProviderKind::Elevenlabs => Box::new(ElevenLabsClient::new(Credentials::require(
                &credentials.elevenlabs_api_key,
                "ELEVENLABS_API_KEY",
            )?)),
            ProviderKind::Unreal => Box::new(UnrealSpeechClient::new(Credentials::require(
                &credentials.unreal_api_key,
                "UNREAL_API_KEY",
            )?)),
        };

        Ok(Box::new(RateLimited::new(
            inner,
            FixedInterval::new(self.synthesis_interval()),
        )))
    }

    fn weekday_rotation(&self) -> Result<WeekdayVoices, ConfigError> {
        if !self.weekday_voices.is_empty() {
            return Ok(WeekdayVoices::try_from(self.weekday_voices.clone())?);
        }
        if self.provider == ProviderKind::Openai {
            return Ok(WeekdayVoices::openai_default());
        }

        let (primary, secondary) = self.provider.default_voices();
        let rotation = (0..7)
            .map(|day| if day % 2 == 0 { primary } else { secondary }.to_string())
            .collect::<Vec<_>>();
        Ok(WeekdayVoices::try_from(rotation)?)
    }

    pub fn build_voice_policy(&self, timezone: &Tz) -> Result<Box<dyn VoicePolicy>, ConfigError> {
        let (default_primary, default_secondary) = self.provider.default_voices();
        let primary = self.voice.as_deref().unwrap_or(default_primary);
        let secondary = self.secondary_voice.as_deref().unwrap_or(default_secondary);

        Ok(match self.voice_policy {
            VoicePolicyKind::Day => Box::new(DayKeyed::today(&self.weekday_rotation()?, timezone)),
            VoicePolicyKind::Alternating => Box::new(Alternating::new(primary, secondary)?),
            VoicePolicyKind::Fixed => Box::new(Fixed::new(primary)?),
        })
    }

    pub fn build_merger(&self) -> Box<dyn AudioMerger + Send + Sync> {
        match self.merger {
            MergerKind::FrameConcat => Box::new(FrameConcatMerger),
            MergerKind::Ffmpeg => Box::new(FfmpegMerger::new(&self.ffmpeg_path)),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SummaryConfig {
    /// Where stories come from
    #[arg(long, env = "HACKER_PULSE_SOURCE", value_enum, default_value_t = SourceKind::Hackernews)]
    pub source: SourceKind,

    /// Ranking window of the source
    #[arg(long, value_enum, default_value_t = Interval::Daily)]
    pub interval: Interval,

    /// Stories per episode
    #[arg(long, env = "HACKER_PULSE_MAX_STORIES", default_value_t = 30)]
    pub max_stories: usize,

    /// Directory for transcripts, metadata and summary logs
    #[arg(long, env = "HACKER_PULSE_OUTDIR", default_value = ".")]
    pub outdir: PathBuf,

    /// What to do when a single story fails
    #[arg(long, value_enum, default_value_t = FailurePolicy::SkipFailed)]
    pub failure_policy: FailurePolicy,

    #[arg(long, default_value = "HackerPulse")]
    pub podcast_name: String,

    #[arg(long, default_value = "Data")]
    pub narrator: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            interval: Interval::default(),
            max_stories: 30,
            outdir: PathBuf::from("."),
            failure_policy: FailurePolicy::default(),
            podcast_name: "HackerPulse".into(),
            narrator: "Data".into(),
        }
    }
}

impl SummaryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stories == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_stories",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn build_source(&self, credentials: &Credentials, client: reqwest::Client) -> AnySource {
        match self.source {
            SourceKind::Hackernews => AnySource::HackerNews(HackerNewsSource::new(client, self.interval)),
            SourceKind::Algolia => AnySource::Algolia(AlgoliaFrontPageSource::new(client)),
            SourceKind::Digest => AnySource::Digest(
                DigestSource::new(client, self.interval)
                    .with_github_token(credentials.github_token.clone()),
            ),
            SourceKind::Lobsters => AnySource::Lobsters(LobstersSource::new(client)),
            SourceKind::Bensbites => AnySource::BensBites(BensBitesSource::new(client)),
            SourceKind::Bbc => AnySource::Bbc(BbcNewsSource::new(client)),
        }
    }

    /// Prefix of the episode file names
    pub fn file_prefix(&self) -> &'static str {
        match self.source {
            SourceKind::Hackernews | SourceKind::Algolia | SourceKind::Digest => "hn",
            SourceKind::Lobsters => "lobsters",
            SourceKind::Bensbites => "bb",
            SourceKind::Bbc => "bbc",
        }
    }
}
