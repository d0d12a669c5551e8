//! 16-bit PCM WAV export.
//!
//! # File layout
//!
//! | offset | size | field                         |
//! |--------|------|-------------------------------|
//! | 0      | 4    | `"RIFF"`                      |
//! | 4      | 4    | `36 + data_len`               |
//! | 8      | 4    | `"WAVE"`                      |
//! | 12     | 4    | `"fmt "`                      |
//! | 16     | 4    | `16` (fmt chunk size)         |
//! | 20     | 2    | `1` (PCM)                     |
//! | 22     | 2    | channels                      |
//! | 24     | 4    | sample rate                   |
//! | 28     | 4    | byte rate                     |
//! | 32     | 2    | block align                   |
//! | 34     | 2    | bits per sample (`16`)        |
//! | 36     | 4    | `"data"`                      |
//! | 40     | 4    | `data_len`                    |
//! | 44     | …    | little-endian `i16` samples   |

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{RecorderError, Result};

pub const BITS_PER_SAMPLE: u16 = 16;
pub const HEADER_LEN: usize = 44;
const BYTES_PER_SAMPLE: u32 = (BITS_PER_SAMPLE / 8) as u32;

/// `(block_align, byte_rate)` for the header, or an error when either field
/// would overflow its width.
fn block_layout(channels: u16, frequency: u32) -> Result<(u16, u32)> {
    let block_align = channels
        .checked_mul(BITS_PER_SAMPLE / 8)
        .ok_or_else(|| RecorderError::InvalidArgument(format!("{channels} channels too many for a WAV file")))?;
    let byte_rate = frequency.checked_mul(u32::from(block_align)).ok_or_else(|| {
        RecorderError::InvalidArgument(format!(
            "{frequency} Hz with {channels} channels too fast for a WAV file"
        ))
    })?;
    Ok((block_align, byte_rate))
}

/// Interleaved floating-point audio in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    channels: u16,
    frequency: u32,
}

impl AudioClip {
    /// `samples` are interleaved across `channels`; their count must be a
    /// multiple of the channel count.
    pub fn new(samples: Vec<f32>, channels: u16, frequency: u32) -> Result<Self> {
        if channels == 0 {
            return Err(RecorderError::InvalidArgument("channel count must be at least 1".into()));
        }
        if frequency == 0 {
            return Err(RecorderError::InvalidArgument("sample rate must be positive".into()));
        }
        block_layout(channels, frequency)?;
        if samples.len() % channels as usize != 0 {
            return Err(RecorderError::InvalidArgument(format!(
                "{} samples do not split evenly into {channels} channels",
                samples.len()
            )));
        }
        Ok(Self {
            samples,
            channels,
            frequency,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.frequency as f64
    }

    /// A copy holding only the first `frames_to_keep` frames.
    pub fn trim(&self, frames_to_keep: usize) -> Self {
        let keep = frames_to_keep.min(self.frames()) * self.channels as usize;
        Self {
            samples: self.samples[..keep].to_vec(),
            channels: self.channels,
            frequency: self.frequency,
        }
    }
}

/// Encode `clip` as a complete WAV file image.
///
/// Samples are clamped to `[-1, 1]` before scaling to `i16`.
pub fn encode_wav(clip: &AudioClip) -> Result<Vec<u8>> {
    let data_len = u32::try_from(clip.samples.len())
        .ok()
        .and_then(|n| n.checked_mul(BYTES_PER_SAMPLE))
        .filter(|n| n.checked_add(36).is_some())
        .ok_or_else(|| RecorderError::InvalidArgument("clip too long for a WAV file".into()))?;

    let channels = clip.channels;
    let (block_align, byte_rate) = block_layout(channels, clip.frequency)?;

    let mut out = Vec::with_capacity(HEADER_LEN + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&clip.frequency.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    for s in &clip.samples {
        let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    Ok(out)
}

/// Write `clip` to `path` with the extension forced to `.wav`, creating the
/// parent directory if needed.  Returns the path actually written.
pub fn save_wav(path: &Path, clip: &AudioClip) -> Result<PathBuf> {
    let path = path.with_extension("wav");
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let bytes = encode_wav(clip)?;
    let mut file = BufWriter::new(fs::File::create(&path)?);
    file.write_all(&bytes)?;
    file.flush()?;
    info!(path = %path.display(), frames = clip.frames(), "saved WAV");
    Ok(path)
}
