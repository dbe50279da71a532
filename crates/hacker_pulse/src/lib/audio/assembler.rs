//! # Audio assembler
//!
//! Drives a synthesizer over an ordered list of chunks and produces one MP3.
//!
//! Chunk audio is written to a private [`tempfile::TempDir`]; the merged result goes to a
//! temporary file next to the destination and is renamed onto it at the very end. Both
//! temporaries are removed when dropped, so every exit path (errors, cancellation and
//! unwinding included) leaves neither intermediate artifacts nor a partial destination.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::{AudioMerger, MergeError};
use crate::{
    cost::{CostEntry, CostError, CostTracker},
    text::Chunk,
    tts::{SpeechSynthesizer, SynthesisError},
    voice::{VoiceAssignment, VoicePolicy},
};

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("[assemble] failed to read transcript {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[assemble] transcript produced no chunks")]
    EmptyTranscript,
    #[error("[assemble] failed to create working area under {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[assemble] failed to write artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[synthesize] chunk {chunk_index}: {source}")]
    Synthesis {
        chunk_index: usize,
        #[source]
        source: SynthesisError,
    },
    #[error("[synthesize] every chunk was skipped, nothing to assemble")]
    NothingSynthesized,
    #[error("[synthesize] cancelled at chunk {chunk_index}")]
    Cancelled { chunk_index: usize },
    #[error("[assemble] {0}")]
    Merge(#[from] MergeError),
    #[error("[assemble] failed to write output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[assemble] {0}")]
    Cost(#[from] CostError),
}

#[derive(Debug, Clone, Serialize)]
pub struct AssemblyReport {
    pub output_path: PathBuf,
    pub chunk_count: usize,
    pub synthesized_chunks: usize,
    /// Indices of oversized chunks the provider refused
    pub skipped_chunks: Vec<usize>,
    pub voices: Vec<VoiceAssignment>,
    /// Characters billed by the provider
    pub characters: u64,
    pub cost: f64,
}

pub fn artifact_name(chunk_index: usize) -> String {
    format!("chunk_{chunk_index:05}.mp3")
}

pub struct AudioAssembler<S, M> {
    synthesizer: S,
    merger: M,
    workdir_root: Option<PathBuf>,
    cancel: CancellationToken,
}

impl<S, M> AudioAssembler<S, M>
where
    S: SpeechSynthesizer,
    M: AudioMerger + Sync,
{
    pub fn new(synthesizer: S, merger: M) -> Self {
        Self {
            synthesizer,
            merger,
            workdir_root: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates working areas under `root` instead of the system temp directory
    pub fn with_workdir_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workdir_root = Some(root.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn synthesizer(&self) -> &S {
        &self.synthesizer
    }

    fn create_workdir(&self) -> Result<TempDir, AssembleError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("hacker-pulse-");

        match &self.workdir_root {
            Some(root) => builder.tempdir_in(root).map_err(|source| AssembleError::Workspace {
                path: root.clone(),
                source,
            }),
            None => builder.tempdir().map_err(|source| AssembleError::Workspace {
                path: std::env::temp_dir(),
                source,
            }),
        }
    }

    /// Synthesizes `chunks` in order and writes the merged audio to `output`.
    ///
    /// `max_chars` is the limit the chunks were built with. Only a failed chunk holding a
    /// single unit longer than that is skipped; any other failure aborts the run.
    ///
    /// Costs are recorded in `costs` for every chunk the provider actually synthesized,
    /// even when the run fails later on.
    #[tracing::instrument(
        skip_all,
        fields(
            provider = self.synthesizer.name(),
            merger = self.merger.name(),
            chunks = chunks.len(),
            max_chars,
            output = %output.display()
        )
    )]
    pub async fn assemble(
        &self,
        chunks: &[Chunk],
        max_chars: usize,
        policy: &dyn VoicePolicy,
        output: &Path,
        costs: &mut CostTracker,
    ) -> Result<AssemblyReport, AssembleError> {
        if chunks.is_empty() {
            return Err(AssembleError::EmptyTranscript);
        }

        let workdir = self.create_workdir()?;

        let mut artifacts = Vec::with_capacity(chunks.len());
        let mut voices = Vec::with_capacity(chunks.len());
        let mut skipped_chunks = Vec::new();
        let mut characters = 0u64;
        let mut cost = 0.0;

        for chunk in chunks {
            if self.cancel.is_cancelled() {
                tracing::warn!(chunk = chunk.index, "Run cancelled");
                return Err(AssembleError::Cancelled {
                    chunk_index: chunk.index,
                });
            }

            let voice_id = policy.select_voice(chunk.index);
            tracing::info!(chunk = chunk.index, voice = voice_id, chars = chunk.char_len, "Synthesizing chunk");

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(AssembleError::Cancelled { chunk_index: chunk.index });
                }
                result = self.synthesizer.synthesize(&chunk.text, voice_id) => result,
            };

            let audio = match result {
                Ok(audio) => audio,
                Err(e) if chunk.is_oversized(max_chars) => {
                    tracing::warn!(
                        chunk = chunk.index,
                        chars = chunk.char_len,
                        max_chars,
                        error = %e,
                        "Skipping oversized chunk"
                    );
                    skipped_chunks.push(chunk.index);
                    continue;
                }
                Err(source) => {
                    tracing::error!(chunk = chunk.index, error = %source, "Synthesis failed");
                    return Err(AssembleError::Synthesis {
                        chunk_index: chunk.index,
                        source,
                    });
                }
            };

            let units = chunk.char_len as u64;
            cost += costs.record_entry(CostEntry::new(
                format!("tts:{}:chunk_{}", self.synthesizer.name(), chunk.index),
                units,
                self.synthesizer.price_per_million_chars(),
            ))?;
            characters += units;

            let path = workdir.path().join(artifact_name(chunk.index));
            tokio::fs::write(&path, &audio)
                .await
                .map_err(|source| AssembleError::Artifact {
                    path: path.clone(),
                    source,
                })?;

            artifacts.push(path);
            voices.push(VoiceAssignment {
                chunk_index: chunk.index,
                voice_id: voice_id.to_string(),
            });
        }

        if artifacts.is_empty() {
            return Err(AssembleError::NothingSynthesized);
        }

        self.write_output(&artifacts, output)?;

        if let Err(e) = workdir.close() {
            tracing::warn!(error = %e, "Failed to remove working area");
        }

        tracing::info!(
            synthesized = artifacts.len(),
            skipped = skipped_chunks.len(),
            cost,
            "Episode audio assembled"
        );

        Ok(AssemblyReport {
            output_path: output.to_path_buf(),
            chunk_count: chunks.len(),
            synthesized_chunks: artifacts.len(),
            skipped_chunks,
            voices,
            characters,
            cost,
        })
    }

    /// Merges into a sibling temporary file and renames it onto `output`
    fn write_output(&self, artifacts: &[PathBuf], output: &Path) -> Result<(), AssembleError> {
        let output_error = |source| AssembleError::Output {
            path: output.to_path_buf(),
            source,
        };

        let dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(output_error)?;

        let partial = tempfile::Builder::new()
            .prefix(".hacker-pulse-")
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(output_error)?;

        self.merger.merge(artifacts, partial.path())?;

        partial
            .persist(output)
            .map_err(|e| output_error(e.error))?;

        Ok(())
    }
}
