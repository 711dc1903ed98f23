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
use std::fs::File;
use std::io::BufReader;
use std::ops::Range;
use std::path::Path;

use hound::WavReader;

use super::clip::PcmClip;
use super::error::AudioError;
use super::source::{clamp_frames, AudioFormat, AudioSource};

/// Reads integer PCM WAV files with hound, seeking straight to the first
/// requested frame.
pub struct WavSource {
    wav_reader: WavReader<BufReader<File>>,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    frame_count: u64,
}

impl WavSource {
    /// Creates a new WAV source from a file path
    pub fn open(path: &Path) -> Result<Self, AudioError> {
        let wav_reader = WavReader::open(path)?;
        let spec = wav_reader.spec();
        if spec.sample_format != hound::SampleFormat::Int {
            return Err(AudioError::Unsupported {
                path: path.to_path_buf(),
                reason: "floating point WAV files are not supported".to_string(),
            });
        }

        // hound's duration is already in frames.
        let frame_count = u64::from(wav_reader.duration());
        Ok(WavSource {
            wav_reader,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            frame_count,
        })
    }
}

impl AudioSource for WavSource {
    fn format(&self) -> AudioFormat {
        AudioFormat::Wav
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn read_frames(&mut self, frames: Range<u64>) -> Result<PcmClip, AudioError> {
        let frames = clamp_frames(frames, self.frame_count);
        // Frame counts come from a u32 duration, so the start always fits.
        self.wav_reader
            .seek(frames.start as u32)
            .map_err(hound::Error::IoError)?;

        let sample_count = (frames.end - frames.start) as usize * self.channels as usize;
        let samples = self
            .wav_reader
            .samples::<i32>()
            .take(sample_count)
            .collect::<Result<Vec<i32>, hound::Error>>()?;

        Ok(PcmClip::new(
            self.channels,
            self.sample_rate,
            self.bits_per_sample,
            samples,
        ))
    }
}
