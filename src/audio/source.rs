// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::fmt;
use std::ops::Range;
use std::path::Path;

use super::aiff::AiffSource;
use super::clip::PcmClip;
use super::error::AudioError;
use super::raw::RawPcmSource;
use super::wav::WavSource;

/// The sample containers a device can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Wav,
    Aiff,
    /// Headerless 48kHz 16-bit big-endian stereo PCM.
    RawPcm,
}

impl AudioFormat {
    /// Detects the container from a file extension, case-insensitively.
    pub fn from_extension(extension: &str) -> Option<AudioFormat> {
        match extension.to_ascii_lowercase().as_str() {
            "wav" => Some(AudioFormat::Wav),
            "aif" | "aiff" => Some(AudioFormat::Aiff),
            "smp" => Some(AudioFormat::RawPcm),
            _ => None,
        }
    }

    /// Detects the container from a path's extension.
    pub fn from_path(path: &Path) -> Option<AudioFormat> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(AudioFormat::from_extension)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioFormat::Wav => write!(f, "WAV"),
            AudioFormat::Aiff => write!(f, "AIFF"),
            AudioFormat::RawPcm => write!(f, "raw PCM"),
        }
    }
}

/// A sample file that can hand out integer PCM frame ranges, regardless of
/// its container.
pub trait AudioSource: Send {
    /// The container this source reads.
    fn format(&self) -> AudioFormat;

    /// Get the number of channels in this source
    fn channel_count(&self) -> u16;

    /// Get the sample rate of this source
    fn sample_rate(&self) -> u32;

    /// Get the bits per sample of this source
    fn bits_per_sample(&self) -> u16;

    /// The total number of frames in the source.
    fn frame_count(&self) -> u64;

    /// Reads the given frame range. The range is clamped to the source length.
    fn read_frames(&mut self, frames: Range<u64>) -> Result<PcmClip, AudioError>;
}

/// Opens a sample file, choosing the reader from the file extension.
pub fn open_audio_source(path: &Path) -> Result<Box<dyn AudioSource>, AudioError> {
    match AudioFormat::from_path(path) {
        Some(AudioFormat::Wav) => Ok(Box::new(WavSource::open(path)?)),
        Some(AudioFormat::Aiff) => Ok(Box::new(AiffSource::open(path)?)),
        Some(AudioFormat::RawPcm) => Ok(Box::new(RawPcmSource::open(path)?)),
        None => Err(AudioError::Unsupported {
            path: path.to_path_buf(),
            reason: "unrecognized extension".to_string(),
        }),
    }
}

/// Clamps a requested frame range to a source of `frame_count` frames.
pub(crate) fn clamp_frames(frames: Range<u64>, frame_count: u64) -> Range<u64> {
    let end = frames.end.min(frame_count);
    frames.start.min(end)..end
}
