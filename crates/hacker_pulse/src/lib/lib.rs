pub mod aggregator;
pub mod audio;
pub mod config;
pub mod cost;
mod error;
mod llm;
pub mod parser;
pub mod podcast;
pub mod rate_limit;
pub mod sources;
pub mod text;
pub mod tracing;
pub mod tts;
pub mod voice;

pub use aggregator::{builder::EpisodeAggregatorBuilder, Episode, EpisodeAggregator, FailurePolicy};
pub use error::ParseError;
pub use llm::openai;
pub use llm::summarizer::{Completion, EpisodeContext, EpisodeMetadata, Summarizer, Usage};
pub use podcast::PodcastGenerator;
