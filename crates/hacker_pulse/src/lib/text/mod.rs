//! Transcript text handling: sentence segmentation and provider sized chunking.

pub mod chunker;
pub mod segmenter;

pub use chunker::{build_chunks, chunk_transcript, Chunk, DEFAULT_MAX_CHUNK_CHARS};
pub use segmenter::{segment, Sentences, TranscriptUnit};
