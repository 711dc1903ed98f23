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

//! Maps note records to pad indices and pad indices to sample files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::audio::AudioFormat;
use crate::config::DeviceProfile;
use crate::format::{DecodeError, NoteRecord};

/// Pad codes start this far above the first pad index.
pub const PAD_CODE_OFFSET: i32 = 46;

/// The alternate bank set starts this many banks after the primary set.
pub const ALTERNATE_BANK_OFFSET: u32 = 5;

/// The pad index a note refers to, or None for a rest.
pub fn note_sample_number(
    note: &NoteRecord,
    profile: &DeviceProfile,
) -> Result<Option<i32>, DecodeError> {
    if note.pad == profile.rest_pad() {
        return Ok(None);
    }
    sample_number(note.pad, note.bank_switch, profile.pads_per_bank()).map(Some)
}

/// Resolves a pad code and bank switch flag into an absolute pad index.
pub fn sample_number(pad: u8, bank_switch: u8, pads_per_bank: u32) -> Result<i32, DecodeError> {
    let base = i32::from(pad) - PAD_CODE_OFFSET;
    match bank_switch {
        0 | 64 => Ok(base),
        1 | 65 => Ok(base + (ALTERNATE_BANK_OFFSET * pads_per_bank) as i32),
        other => Err(DecodeError::BankSwitch(other)),
    }
}

/// The file name stem for a 1-based pad index, or None if the index doesn't
/// address a pad on this device.
pub fn sample_stem(index: i32, profile: &DeviceProfile) -> Option<String> {
    if index < 1 || index as usize > profile.pad_count() {
        return None;
    }
    let zero_based = (index - 1) as u32;
    let bank = zero_based / profile.pads_per_bank();
    let pad_in_bank = zero_based % profile.pads_per_bank() + 1;
    Some(profile.stem().format(bank, pad_in_bank))
}

/// A sample file found for a pad.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedSample {
    /// The 1-based pad index.
    pub index: i32,
    /// The file name stem the file was matched against.
    pub stem: String,
    /// The sample file.
    pub path: PathBuf,
    pub format: AudioFormat,
}

/// Why no sample file was found for a pad.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissingSampleError {
    #[error("pad index {0} is outside of the device's pads")]
    OutOfRange(i32),

    #[error("no {extensions} file for {stem} in the sample directory")]
    NotFound { stem: String, extensions: String },
}

/// Something that turns a pad index into a sample identity.
pub trait SampleLookup {
    fn lookup(&mut self, index: i32) -> Result<ResolvedSample, MissingSampleError>;
}

/// Looks samples up in the device's sample directory. The directory is listed
/// once and each pad is resolved at most once per run.
pub struct SampleResolver<'a> {
    profile: &'a DeviceProfile,
    /// (lowercase file name, path) pairs, sorted by file name.
    entries: Vec<(String, PathBuf)>,
    cache: HashMap<i32, Result<ResolvedSample, MissingSampleError>>,
}

impl<'a> SampleResolver<'a> {
    /// Creates a resolver over the given sample directory. A missing or
    /// unreadable directory makes every sample missing.
    pub fn new(profile: &'a DeviceProfile, sample_dir: &Path) -> Self {
        let mut entries: Vec<(String, PathBuf)> = match fs::read_dir(sample_dir) {
            Ok(read_dir) => read_dir
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .filter_map(|path| {
                    let name = path.file_name()?.to_str()?.to_lowercase();
                    Some((name, path))
                })
                .collect(),
            Err(e) => {
                warn!(path = ?sample_dir, err = %e, "Unable to list sample directory");
                Vec::new()
            }
        };
        entries.sort();
        debug!(path = ?sample_dir, files = entries.len(), "Listed sample directory");

        SampleResolver {
            profile,
            entries,
            cache: HashMap::new(),
        }
    }

    /// Finds the file for a stem. Extensions are tried in profile order; an
    /// exact name beats one that only ends with the stem.
    fn find(&self, stem: &str) -> Option<(PathBuf, AudioFormat)> {
        let stem = stem.to_lowercase();
        for extension in self.profile.extensions() {
            let Some(format) = AudioFormat::from_extension(extension) else {
                continue;
            };
            let target = format!("{}.{}", stem, extension.to_lowercase());

            let exact = self.entries.iter().find(|(name, _)| *name == target);
            let suffixed = || self.entries.iter().find(|(name, _)| name.ends_with(&target));
            if let Some((_, path)) = exact.or_else(suffixed) {
                return Some((path.clone(), format));
            }
        }
        None
    }

    fn resolve(&self, index: i32) -> Result<ResolvedSample, MissingSampleError> {
        let stem = sample_stem(index, self.profile).ok_or(MissingSampleError::OutOfRange(index))?;
        match self.find(&stem) {
            Some((path, format)) => {
                debug!(index, path = ?path, "Resolved sample");
                Ok(ResolvedSample {
                    index,
                    stem,
                    path,
                    format,
                })
            }
            None => Err(MissingSampleError::NotFound {
                stem,
                extensions: self.profile.extensions().join("/"),
            }),
        }
    }
}

impl SampleLookup for SampleResolver<'_> {
    fn lookup(&mut self, index: i32) -> Result<ResolvedSample, MissingSampleError> {
        if let Some(cached) = self.cache.get(&index) {
            return cached.clone();
        }
        let resolved = self.resolve(index);
        self.cache.insert(index, resolved.clone());
        resolved
    }
}
