pub mod assembler;
pub mod ffmpeg;
pub mod mp3;

use std::path::{Path, PathBuf};

pub use assembler::{AssembleError, AssemblyReport, AudioAssembler};
pub use ffmpeg::FfmpegMerger;
pub use mp3::FrameConcatMerger;

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} contains no MPEG audio frames")]
    MalformedAudio { path: PathBuf },
    #[error("ffmpeg failed: {0}")]
    Ffmpeg(String),
    #[error("No audio artifacts to merge")]
    Empty,
}

impl MergeError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> MergeError + '_ {
        move |source| MergeError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Combines per-chunk audio files into one playable file.
///
/// `artifacts` are already in playback order. Implementations write the complete
/// result to `output`, which the caller later renames into place.
pub trait AudioMerger {
    fn name(&self) -> &'static str;

    fn merge(&self, artifacts: &[PathBuf], output: &Path) -> Result<(), MergeError>;
}

impl<T: AudioMerger + ?Sized> AudioMerger for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn merge(&self, artifacts: &[PathBuf], output: &Path) -> Result<(), MergeError> {
        (**self).merge(artifacts, output)
    }
}
