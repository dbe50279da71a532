use super::segmenter::{segment, TranscriptUnit};

/// Characters per chunk when the caller has no provider specific limit
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1000;

/// A group of contiguous transcript units sent to a synthesizer in one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position, defines the concatenation order of the audio
    pub index: usize,
    /// Unit texts joined with a single space
    pub text: String,
    /// Length of `text` in characters
    pub char_len: usize,
    /// Index of the first unit in the chunk
    pub first_unit: usize,
    pub unit_count: usize,
}

impl Chunk {
    /// A chunk is oversized when a single unit alone exceeds `max_chars`.
    /// Packed chunks never are, whatever their length.
    pub fn is_oversized(&self, max_chars: usize) -> bool {
        self.unit_count == 1 && self.char_len > max_chars
    }
}

/// Greedily packs `units` into chunks of at most `max_chars` characters.
///
/// Units are never split. A unit longer than `max_chars` is placed alone in
/// its own (oversized) chunk.
pub fn build_chunks<I>(units: I, max_chars: usize) -> Vec<Chunk>
where
    I: IntoIterator<Item = TranscriptUnit>,
{
    let mut chunks = Vec::new();
    let mut current: Option<Chunk> = None;

    for unit in units {
        let unit_len = unit.char_len();

        if let Some(chunk) = current.as_mut() {
            if chunk.char_len + 1 + unit_len <= max_chars {
                chunk.text.push(' ');
                chunk.text.push_str(&unit.text);
                chunk.char_len += 1 + unit_len;
                chunk.unit_count += 1;
                continue;
            }
            chunks.extend(current.take());
        }

        current = Some(Chunk {
            index: chunks.len(),
            text: unit.text,
            char_len: unit_len,
            first_unit: unit.index,
            unit_count: 1,
        });
    }

    chunks.extend(current);
    chunks
}

/// Segments `text` into sentences and packs them into chunks
pub fn chunk_transcript(text: &str, max_chars: usize) -> Vec<Chunk> {
    build_chunks(segment(text), max_chars)
}
