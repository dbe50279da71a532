use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use super::{AudioMerger, MergeError};

/// Decodes every artifact with ffmpeg's concat demuxer and re-encodes a single MP3
#[derive(Debug, Clone)]
pub struct FfmpegMerger {
    binary: PathBuf,
}

impl Default for FfmpegMerger {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
        }
    }
}

impl FfmpegMerger {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

/// Contents of the concat demuxer list, one quoted `file` line per artifact
fn concat_list(artifacts: &[PathBuf]) -> String {
    artifacts
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', r"'\''")))
        .collect()
}

impl AudioMerger for FfmpegMerger {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    #[tracing::instrument(skip(self, artifacts), fields(artifacts = artifacts.len()))]
    fn merge(&self, artifacts: &[PathBuf], output: &Path) -> Result<(), MergeError> {
        let Some(first) = artifacts.first() else {
            return Err(MergeError::Empty);
        };

        // The list lives next to the artifacts so it is cleaned up with them
        let list_path = first
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("concat_list.txt");
        std::fs::write(&list_path, concat_list(artifacts)).map_err(MergeError::io(&list_path))?;

        let result = Command::new(&self.binary)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(["-c:a", "libmp3lame", "-q:a", "2", "-f", "mp3"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                MergeError::Ffmpeg(format!("failed to spawn {}: {e}", self.binary.display()))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::error!(status = %result.status, stderr = %stderr, "ffmpeg exited with failure");
            return Err(MergeError::Ffmpeg(format!(
                "{}: {}",
                result.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
