//! MPEG audio frame handling for merging without re-encoding.
//!
//! Every provider returns a complete MP3 file per request. Concatenating them byte for byte
//! leaves ID3 tags and Xing/Info headers in the middle of the stream, which confuses most
//! players about duration. [`FrameConcatMerger`] strips those and keeps only the raw frames.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use super::{AudioMerger, MergeError};

const ID3V1_LEN: usize = 128;
const ID3V2_HEADER_LEN: usize = 10;

const MPEG1_LAYER3_KBPS: [u32; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
const MPEG2_LAYER3_KBPS: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];
const MPEG1_SAMPLE_RATES: [u32; 3] = [44_100, 48_000, 32_000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

/// Decoded 4 byte Layer III frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    version: MpegVersion,
    bitrate_kbps: u32,
    sample_rate: u32,
    padding: bool,
    mono: bool,
}

impl FrameHeader {
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let [b0, b1, b2, b3, ..] = *bytes else {
            return None;
        };
        if b0 != 0xFF || b1 & 0xE0 != 0xE0 {
            return None;
        }

        let version = match (b1 >> 3) & 0b11 {
            0b11 => MpegVersion::Mpeg1,
            0b10 => MpegVersion::Mpeg2,
            0b00 => MpegVersion::Mpeg25,
            _ => return None,
        };
        // Only Layer III is produced by the speech providers
        if (b1 >> 1) & 0b11 != 0b01 {
            return None;
        }

        let bitrate_index = (b2 >> 4) as usize;
        let rate_index = ((b2 >> 2) & 0b11) as usize;
        if bitrate_index == 0 || bitrate_index == 0b1111 || rate_index == 0b11 {
            return None;
        }

        let (bitrate_kbps, sample_rate) = match version {
            MpegVersion::Mpeg1 => (
                MPEG1_LAYER3_KBPS[bitrate_index],
                MPEG1_SAMPLE_RATES[rate_index],
            ),
            MpegVersion::Mpeg2 => (
                MPEG2_LAYER3_KBPS[bitrate_index],
                MPEG1_SAMPLE_RATES[rate_index] / 2,
            ),
            MpegVersion::Mpeg25 => (
                MPEG2_LAYER3_KBPS[bitrate_index],
                MPEG1_SAMPLE_RATES[rate_index] / 4,
            ),
        };

        Some(Self {
            version,
            bitrate_kbps,
            sample_rate,
            padding: (b2 >> 1) & 1 == 1,
            mono: (b3 >> 6) == 0b11,
        })
    }

    /// Frame length in bytes, header included
    pub fn frame_len(&self) -> usize {
        let samples_factor = match self.version {
            MpegVersion::Mpeg1 => 144,
            MpegVersion::Mpeg2 | MpegVersion::Mpeg25 => 72,
        };
        (samples_factor * self.bitrate_kbps * 1000 / self.sample_rate) as usize
            + usize::from(self.padding)
    }

    fn side_info_len(&self) -> usize {
        match (self.version, self.mono) {
            (MpegVersion::Mpeg1, false) => 32,
            (MpegVersion::Mpeg1, true) => 17,
            (_, false) => 17,
            (_, true) => 9,
        }
    }
}

/// Returns the MPEG frame stream inside a complete MP3 file.
///
/// Strips a leading ID3v2 tag, a trailing ID3v1 tag, any bytes before the first frame
/// sync and a leading Xing/Info frame. `None` when no frame sync is found.
pub fn mpeg_frames(data: &[u8]) -> Option<&[u8]> {
    let mut data = data;

    if data.starts_with(b"ID3") && data.len() >= ID3V2_HEADER_LEN {
        let size = data[6..10]
            .iter()
            .fold(0usize, |acc, b| (acc << 7) | usize::from(b & 0x7F));
        let footer = if data[5] & 0x10 != 0 { ID3V2_HEADER_LEN } else { 0 };
        let tag_len = ID3V2_HEADER_LEN + size + footer;
        data = data.get(tag_len..).unwrap_or_default();
    }

    if data.len() >= ID3V1_LEN && data[data.len() - ID3V1_LEN..].starts_with(b"TAG") {
        data = &data[..data.len() - ID3V1_LEN];
    }

    let start = (0..data.len()).find(|&i| FrameHeader::parse(&data[i..]).is_some())?;
    let mut frames = &data[start..];

    if let Some(header) = FrameHeader::parse(frames) {
        let tag_offset = 4 + header.side_info_len();
        let is_info_frame = matches!(
            frames.get(tag_offset..tag_offset + 4),
            Some(b"Xing") | Some(b"Info")
        );
        if is_info_frame {
            frames = frames.get(header.frame_len()..).unwrap_or_default();
        }
    }

    Some(frames)
}

/// Pure Rust merger that concatenates the raw MPEG frames of every artifact
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameConcatMerger;

impl AudioMerger for FrameConcatMerger {
    fn name(&self) -> &'static str {
        "frame-concat"
    }

    #[tracing::instrument(skip(self, artifacts), fields(artifacts = artifacts.len()))]
    fn merge(&self, artifacts: &[PathBuf], output: &Path) -> Result<(), MergeError> {
        if artifacts.is_empty() {
            return Err(MergeError::Empty);
        }

        let file = File::create(output).map_err(MergeError::io(output))?;
        let mut writer = BufWriter::new(file);

        for artifact in artifacts {
            let data = std::fs::read(artifact).map_err(MergeError::io(artifact))?;
            let frames = mpeg_frames(&data).ok_or_else(|| MergeError::MalformedAudio {
                path: artifact.clone(),
            })?;
            writer.write_all(frames).map_err(MergeError::io(output))?;
        }

        writer
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| file.sync_all())
            .map_err(MergeError::io(output))
    }
}
