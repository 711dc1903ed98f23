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
use std::ops::Range;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::debug;

use super::clip::PcmClip;
use super::error::AudioError;
use super::source::{clamp_frames, AudioFormat, AudioSource};

/// Reads AIFF files through symphonia. Device samples are short, so the whole
/// file is decoded up front and frame ranges are sliced out of memory.
pub struct AiffSource {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    /// Interleaved samples at their native bit depth.
    samples: Vec<i32>,
}

impl AiffSource {
    pub fn open(path: &Path) -> Result<Self, AudioError> {
        // Include path in error so user sees which file failed
        let file = File::open(path).map_err(|source| AudioError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let probed = get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format_reader = probed.format;

        let unsupported = |reason: &str| AudioError::Unsupported {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| unsupported("no audio track found"))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| unsupported("sample rate not specified"))?;
        let bits_per_sample = params.bits_per_sample.unwrap_or(16) as u16;
        if bits_per_sample == 0 || bits_per_sample > 32 {
            return Err(unsupported("unsupported bit depth"));
        }
        let mut channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);

        let mut decoder = get_codecs().make(&params, &DecoderOptions::default())?;

        // symphonia widens integer samples to the full i32 range.
        let shift = 32 - u32::from(bits_per_sample);
        let mut samples = Vec::new();
        while let Some(packet) = Self::next_packet(format_reader.as_mut(), decoder.as_mut())? {
            if packet.track_id() != track_id {
                continue;
            }
            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!(path = ?path, err = e, "Skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            if channels == 0 {
                channels = spec.channels.count() as u16;
            }
            let mut buffer = SampleBuffer::<i32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            samples.extend(buffer.samples().iter().map(|sample| sample >> shift));
        }

        if channels == 0 {
            return Err(unsupported("channels not specified"));
        }

        Ok(AiffSource {
            channels,
            sample_rate,
            bits_per_sample,
            samples,
        })
    }

    /// Reads the next packet, resetting the decoder when the format asks for
    /// it. Returns None at the end of the stream.
    fn next_packet(
        format_reader: &mut dyn FormatReader,
        decoder: &mut dyn Decoder,
    ) -> Result<Option<Packet>, AudioError> {
        loop {
            match format_reader.next_packet() {
                Ok(packet) => return Ok(Some(packet)),
                Err(SymphoniaError::ResetRequired) => decoder.reset(),
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl AudioSource for AiffSource {
    fn format(&self) -> AudioFormat {
        AudioFormat::Aiff
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
        (self.samples.len() / self.channels as usize) as u64
    }

    fn read_frames(&mut self, frames: Range<u64>) -> Result<PcmClip, AudioError> {
        let frames = clamp_frames(frames, self.frame_count());
        let channels = self.channels as usize;
        let samples =
            self.samples[frames.start as usize * channels..frames.end as usize * channels].to_vec();
        Ok(PcmClip::new(
            self.channels,
            self.sample_rate,
            self.bits_per_sample,
            samples,
        ))
    }
}
