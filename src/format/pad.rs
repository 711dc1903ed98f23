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
use std::path::Path;

use tracing::{debug, warn};

use super::error::FormatError;
use super::{read_file, FieldReader};

/// The size of a single pad configuration record in bytes.
pub const PAD_RECORD_SIZE: usize = 32;

/// The configuration of a single pad slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadRecord {
    /// Raw sample start, in device units.
    pub start: u32,
    /// Raw sample end, in device units.
    pub end: u32,
    /// User trim start. Biased by 512 and scaled by 2 bytes per sample.
    pub user_start: u32,
    /// User trim end. Biased by 512 and scaled by 2 bytes per sample.
    pub user_end: u32,
    pub volume: u8,
    pub lofi: bool,
    pub looping: bool,
    pub gate: bool,
    pub reverse: bool,
    pub unknown1: u8,
    pub channels: u8,
    pub tempo_mode: u8,
    pub tempo: u32,
    pub user_tempo: u32,
}

impl PadRecord {
    /// Parses a pad record from its fixed 32 byte slot.
    pub fn parse(bytes: &[u8; PAD_RECORD_SIZE]) -> PadRecord {
        let mut reader = FieldReader::new(bytes);
        PadRecord {
            start: reader.u32(),
            end: reader.u32(),
            user_start: reader.u32(),
            user_end: reader.u32(),
            volume: reader.u8(),
            lofi: reader.flag(),
            looping: reader.flag(),
            gate: reader.flag(),
            reverse: reader.flag(),
            unknown1: reader.u8(),
            channels: reader.u8(),
            tempo_mode: reader.u8(),
            tempo: reader.u32(),
            user_tempo: reader.u32(),
        }
    }

    /// Encodes the record back into its on-disk layout.
    #[cfg(test)]
    pub fn to_bytes(&self) -> [u8; PAD_RECORD_SIZE] {
        let mut bytes = Vec::with_capacity(PAD_RECORD_SIZE);
        bytes.extend_from_slice(&self.start.to_be_bytes());
        bytes.extend_from_slice(&self.end.to_be_bytes());
        bytes.extend_from_slice(&self.user_start.to_be_bytes());
        bytes.extend_from_slice(&self.user_end.to_be_bytes());
        bytes.push(self.volume);
        bytes.push(self.lofi.into());
        bytes.push(self.looping.into());
        bytes.push(self.gate.into());
        bytes.push(self.reverse.into());
        bytes.push(self.unknown1);
        bytes.push(self.channels);
        bytes.push(self.tempo_mode);
        bytes.extend_from_slice(&self.tempo.to_be_bytes());
        bytes.extend_from_slice(&self.user_tempo.to_be_bytes());

        let mut record = [0u8; PAD_RECORD_SIZE];
        record.copy_from_slice(&bytes);
        record
    }
}

impl fmt::Display for PadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "start={} end={} user_start={} user_end={} volume={} lofi={} loop={} gate={} reverse={} channels={} tempo_mode={} tempo={} user_tempo={}",
            self.start,
            self.end,
            self.user_start,
            self.user_end,
            self.volume,
            self.lofi,
            self.looping,
            self.gate,
            self.reverse,
            self.channels,
            self.tempo_mode,
            self.tempo,
            self.user_tempo,
        )
    }
}

/// All pad records of a device, addressed 1..=N in file order.
#[derive(Debug, Clone)]
pub struct PadTable {
    pads: Vec<PadRecord>,
}

impl PadTable {
    /// Decodes exactly `pad_count` records from the start of `bytes`.
    pub fn decode(bytes: &[u8], pad_count: usize) -> Result<PadTable, FormatError> {
        let expected = PAD_RECORD_SIZE * pad_count;
        if bytes.len() < expected {
            return Err(FormatError::PadTableTooShort {
                expected,
                actual: bytes.len(),
            });
        }
        if bytes.len() > expected {
            warn!(
                expected,
                actual = bytes.len(),
                "Pad table is longer than expected, ignoring trailing bytes"
            );
        }

        let pads = bytes[..expected]
            .chunks_exact(PAD_RECORD_SIZE)
            .enumerate()
            .map(|(i, chunk)| {
                let mut record = [0u8; PAD_RECORD_SIZE];
                record.copy_from_slice(chunk);
                let pad = PadRecord::parse(&record);
                debug!(pad = i + 1, "{}", pad);
                pad
            })
            .collect();

        Ok(PadTable { pads })
    }

    /// Reads and decodes the pad table at the given path.
    pub fn read(path: &Path, pad_count: usize) -> Result<PadTable, FormatError> {
        PadTable::decode(&read_file(path)?, pad_count)
    }

    /// Gets the pad with the given 1-based index.
    pub fn get(&self, index: i32) -> Option<&PadRecord> {
        let index = usize::try_from(index).ok()?;
        self.pads.get(index.checked_sub(1)?)
    }

    /// The number of pads in the table.
    pub fn len(&self) -> usize {
        self.pads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pads.is_empty()
    }

    /// Iterates over (1-based index, pad) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &PadRecord)> {
        self.pads.iter().enumerate().map(|(i, pad)| (i + 1, pad))
    }
}
