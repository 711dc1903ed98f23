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
use std::fs;
use std::ops::Range;
use std::path::Path;

use tracing::warn;

use super::clip::PcmClip;
use super::error::AudioError;
use super::source::{clamp_frames, AudioFormat, AudioSource};

pub const RAW_SAMPLE_RATE: u32 = 48000;
pub const RAW_CHANNELS: u16 = 2;
pub const RAW_BITS_PER_SAMPLE: u16 = 16;

const RAW_FRAME_BYTES: usize = RAW_CHANNELS as usize * (RAW_BITS_PER_SAMPLE as usize / 8);

/// Reads headerless `.SMP` sample files: signed 16-bit big-endian stereo
/// at 48kHz. The data is normalized into native integers on open.
pub struct RawPcmSource {
    samples: Vec<i32>,
}

impl RawPcmSource {
    pub fn open(path: &Path) -> Result<Self, AudioError> {
        let bytes = fs::read(path).map_err(|source| AudioError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(&bytes, path))
    }

    fn from_bytes(bytes: &[u8], path: &Path) -> Self {
        let remainder = bytes.len() % RAW_FRAME_BYTES;
        if remainder != 0 {
            warn!(
                path = ?path,
                trailing_bytes = remainder,
                "Raw sample ends with a partial frame, ignoring it"
            );
        }

        let samples = bytes[..bytes.len() - remainder]
            .chunks_exact(2)
            .map(|pair| i32::from(i16::from_be_bytes([pair[0], pair[1]])))
            .collect();
        RawPcmSource { samples }
    }
}

impl AudioSource for RawPcmSource {
    fn format(&self) -> AudioFormat {
        AudioFormat::RawPcm
    }

    fn channel_count(&self) -> u16 {
        RAW_CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        RAW_SAMPLE_RATE
    }

    fn bits_per_sample(&self) -> u16 {
        RAW_BITS_PER_SAMPLE
    }

    fn frame_count(&self) -> u64 {
        (self.samples.len() / RAW_CHANNELS as usize) as u64
    }

    fn read_frames(&mut self, frames: Range<u64>) -> Result<PcmClip, AudioError> {
        let frames = clamp_frames(frames, self.frame_count());
        let channels = RAW_CHANNELS as usize;
        Ok(PcmClip::new(
            RAW_CHANNELS,
            RAW_SAMPLE_RATE,
            RAW_BITS_PER_SAMPLE,
            self.samples[frames.start as usize * channels..frames.end as usize * channels]
                .to_vec(),
        ))
    }
}
