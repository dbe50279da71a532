use std::path::{Path, PathBuf};

use crate::{
    audio::{AssembleError, AssemblyReport, AudioAssembler, AudioMerger},
    cost::CostTracker,
    text::chunk_transcript,
    tts::SpeechSynthesizer,
    voice::VoicePolicy,
};

/// `episode.txt` becomes `episode.mp3` next to it
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("mp3")
}

/// Turns a transcript file into a single narrated MP3
pub struct PodcastGenerator<S, M> {
    assembler: AudioAssembler<S, M>,
    max_chunk_chars: Option<usize>,
}

impl<S, M> PodcastGenerator<S, M>
where
    S: SpeechSynthesizer,
    M: AudioMerger + Sync,
{
    pub fn new(assembler: AudioAssembler<S, M>) -> Self {
        Self {
            assembler,
            max_chunk_chars: None,
        }
    }

    /// Lowers the chunk limit below the provider's own
    pub fn with_max_chunk_chars(mut self, max_chunk_chars: Option<usize>) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }

    /// The override, capped at what the provider accepts
    pub fn chunk_limit(&self) -> usize {
        let provider_limit = self.assembler.synthesizer().max_chunk_chars();
        match self.max_chunk_chars {
            Some(limit) if limit > provider_limit => {
                tracing::warn!(limit, provider_limit, "Chunk limit capped at the provider limit");
                provider_limit
            }
            Some(limit) => limit,
            None => provider_limit,
        }
    }

    #[tracing::instrument(skip(self, policy, costs), fields(input = %input.display()))]
    pub async fn generate(
        &self,
        input: &Path,
        output: Option<&Path>,
        policy: &dyn VoicePolicy,
        costs: &mut CostTracker,
    ) -> Result<AssemblyReport, AssembleError> {
        let transcript = tokio::fs::read_to_string(input)
            .await
            .map_err(|source| AssembleError::Input {
                path: input.to_path_buf(),
                source,
            })?;

        let max_chars = self.chunk_limit();
        let chunks = chunk_transcript(&transcript, max_chars);
        tracing::info!(chunks = chunks.len(), max_chars, "Transcript chunked");

        let output = output.map_or_else(|| default_output_path(input), Path::to_path_buf);

        self.assembler
            .assemble(&chunks, max_chars, policy, &output, costs)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Podcast generation failed"))
    }
}
