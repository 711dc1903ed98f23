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

//! Fixtures shared by the unit tests.

use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::TempDir;

use crate::audio::AudioFormat;
use crate::config::DeviceProfile;
use crate::format::{pattern_file_name, NoteRecord, PadRecord};
use crate::samples::{MissingSampleError, ResolvedSample, SampleLookup};

/// A note with a recorded velocity of 90.
pub fn note(delay: u8, pad: u8, bank_switch: u8, length: u16) -> NoteRecord {
    NoteRecord {
        delay,
        pad,
        bank_switch,
        velocity: 90,
        length,
        ..Default::default()
    }
}

/// A pad whose user trim points select the given frame range.
pub fn trimmed_pad(start_frame: u32, end_frame: u32) -> PadRecord {
    PadRecord {
        user_start: 512 + start_frame * 2,
        user_end: 512 + end_frame * 2,
        volume: 127,
        ..Default::default()
    }
}

/// Encodes pad records back into a pad table.
pub fn pad_table_bytes(pads: &[PadRecord]) -> Vec<u8> {
    pads.iter().flat_map(|pad| pad.to_bytes()).collect()
}

/// Encodes notes into a pattern file with the given bar count in its trailer.
pub fn pattern_bytes(notes: &[NoteRecord], bars: i8) -> Vec<u8> {
    let mut bytes: Vec<u8> = notes.iter().flat_map(|note| note.to_bytes()).collect();
    let mut trailer = [0u8; 16];
    trailer[9] = bars as u8;
    bytes.extend_from_slice(&trailer);
    bytes
}

/// Writes interleaved integer samples to a WAV file.
pub fn write_wav(
    path: &Path,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    samples: &[i32],
) -> Result<(), Box<dyn Error>> {
    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample,
            sample_format: SampleFormat::Int,
        },
    )?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Writes interleaved 16-bit samples to an uncompressed AIFF file.
pub fn write_aiff(
    path: &Path,
    channels: u16,
    sample_rate: u32,
    samples: &[i16],
) -> Result<(), Box<dyn Error>> {
    let frames = (samples.len() / usize::from(channels)) as u32;
    let data_len = (samples.len() * 2) as u32;
    let comm_len: u32 = 18;
    let ssnd_len = 8 + data_len;
    let form_len = 4 + (8 + comm_len) + (8 + ssnd_len);

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(b"FORM")?;
    out.write_all(&form_len.to_be_bytes())?;
    out.write_all(b"AIFF")?;

    out.write_all(b"COMM")?;
    out.write_all(&comm_len.to_be_bytes())?;
    out.write_all(&channels.to_be_bytes())?;
    out.write_all(&frames.to_be_bytes())?;
    out.write_all(&16u16.to_be_bytes())?;
    out.write_all(&extended_sample_rate(sample_rate))?;

    out.write_all(b"SSND")?;
    out.write_all(&ssnd_len.to_be_bytes())?;
    out.write_all(&0u32.to_be_bytes())?;
    out.write_all(&0u32.to_be_bytes())?;
    for sample in samples {
        out.write_all(&sample.to_be_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// The 80-bit IEEE 754 extended form of a sample rate, as AIFF stores it.
fn extended_sample_rate(rate: u32) -> [u8; 10] {
    let mut bytes = [0u8; 10];
    if rate == 0 {
        return bytes;
    }
    let shift = rate.leading_zeros();
    let exponent = 16383 + 31 - shift as u16;
    let mantissa = u64::from(rate) << (32 + shift);
    bytes[0..2].copy_from_slice(&exponent.to_be_bytes());
    bytes[2..10].copy_from_slice(&mantissa.to_be_bytes());
    bytes
}

/// Resolves every index to a synthetic WAV path except the listed ones.
#[derive(Default)]
pub struct StubLookup {
    pub missing: Vec<i32>,
}

impl SampleLookup for StubLookup {
    fn lookup(&mut self, index: i32) -> Result<ResolvedSample, MissingSampleError> {
        if self.missing.contains(&index) {
            return Err(MissingSampleError::NotFound {
                stem: format!("S{index}"),
                extensions: "WAV".to_string(),
            });
        }
        Ok(ResolvedSample {
            index,
            stem: format!("S{index}"),
            path: PathBuf::from(format!("/smpl/S{index}.WAV")),
            format: AudioFormat::Wav,
        })
    }
}

/// A device export laid out on disk the way the given profile expects.
pub struct ExportTree {
    dir: TempDir,
    profile: DeviceProfile,
}

impl ExportTree {
    pub fn new(profile: DeviceProfile) -> Result<ExportTree, Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(profile.pattern_dir(dir.path()))?;
        fs::create_dir_all(profile.sample_dir(dir.path()))?;
        Ok(ExportTree { dir, profile })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the pad table. Pads not given are left at their defaults.
    pub fn write_pads(&self, pads: &[(i32, PadRecord)]) -> Result<(), Box<dyn Error>> {
        let mut table = vec![PadRecord::default(); self.profile.pad_count()];
        for (index, pad) in pads {
            table[(*index - 1) as usize] = *pad;
        }
        let path = self.profile.pad_info_path(self.root());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, pad_table_bytes(&table))?;
        Ok(())
    }

    /// Writes a pattern file for a human pattern name like "A1".
    pub fn write_pattern(
        &self,
        name: &str,
        notes: &[NoteRecord],
        bars: i8,
    ) -> Result<(), Box<dyn Error>> {
        let file_name = pattern_file_name(name, self.profile.pads_per_bank())?;
        fs::write(
            self.profile.pattern_dir(self.root()).join(file_name),
            pattern_bytes(notes, bars),
        )?;
        Ok(())
    }

    /// Writes a 16-bit WAV sample file into the sample directory.
    pub fn write_sample(
        &self,
        file_name: &str,
        channels: u16,
        samples: &[i32],
    ) -> Result<PathBuf, Box<dyn Error>> {
        let path = self.profile.sample_dir(self.root()).join(file_name);
        write_wav(&path, channels, 44100, 16, samples)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_sample_rate() {
        assert_eq!(
            [0x40, 0x0e, 0xac, 0x44, 0, 0, 0, 0, 0, 0],
            extended_sample_rate(44100)
        );
        assert_eq!(
            [0x40, 0x0e, 0xbb, 0x80, 0, 0, 0, 0, 0, 0],
            extended_sample_rate(48000)
        );
    }
}
