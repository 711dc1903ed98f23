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
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::error::AudioError;

/// A block of integer PCM frames read out of a sample file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmClip {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    /// Interleaved samples at their native bit depth.
    samples: Vec<i32>,
}

impl PcmClip {
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16, samples: Vec<i32>) -> Self {
        PcmClip {
            channels,
            sample_rate,
            bits_per_sample,
            samples,
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    /// The number of frames (samples per channel).
    pub fn frame_count(&self) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        (self.samples.len() / self.channels as usize) as u64
    }

    /// Extracts one channel as 16-bit samples, reducing or widening the bit depth.
    pub fn channel_i16(&self, channel: u16) -> Vec<i16> {
        let shift = i32::from(self.bits_per_sample) - 16;
        self.samples
            .iter()
            .skip(channel as usize)
            .step_by(self.channels.max(1) as usize)
            .map(|&sample| {
                let scaled = if shift >= 0 {
                    sample >> shift
                } else {
                    sample << -shift
                };
                scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
            })
            .collect()
    }

    /// Writes the clip as an integer PCM WAV file, preserving the channel
    /// count, sample width and rate.
    pub fn write_wav(&self, path: &Path) -> Result<(), AudioError> {
        let mut writer = WavWriter::create(
            path,
            WavSpec {
                channels: self.channels,
                sample_rate: self.sample_rate,
                bits_per_sample: self.bits_per_sample,
                sample_format: SampleFormat::Int,
            },
        )?;
        for sample in &self.samples {
            writer.write_sample(*sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}
