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

use tracing::debug;

use super::error::FormatError;
use super::{read_file, FieldReader};

/// The size of a single note record in bytes.
pub const NOTE_RECORD_SIZE: usize = 8;

/// The size of the trailer that follows the last note.
pub const TRAILER_SIZE: usize = 2 * NOTE_RECORD_SIZE;

/// Offset of the signed bar count within the trailer.
const BAR_COUNT_OFFSET: usize = 9;

/// Beats per bar used when checking the bar count against the note delays.
const BEATS_PER_BAR: u64 = 4;

/// A single note trigger. File order is playback order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteRecord {
    /// Ticks since the previous note.
    pub delay: u8,
    /// Raw pad code.
    pub pad: u8,
    /// 0/64 select the primary banks, 1/65 the alternate banks.
    pub bank_switch: u8,
    pub unknown2: u8,
    pub velocity: u8,
    pub unknown3: u8,
    /// Note duration in ticks.
    pub length: u16,
}

impl NoteRecord {
    /// Parses a note from its fixed 8 byte record.
    pub fn parse(bytes: &[u8; NOTE_RECORD_SIZE]) -> NoteRecord {
        let mut reader = FieldReader::new(bytes);
        NoteRecord {
            delay: reader.u8(),
            pad: reader.u8(),
            bank_switch: reader.u8(),
            unknown2: reader.u8(),
            velocity: reader.u8(),
            unknown3: reader.u8(),
            length: reader.u16(),
        }
    }

    /// Encodes the note back into its on-disk layout.
    #[cfg(test)]
    pub fn to_bytes(&self) -> [u8; NOTE_RECORD_SIZE] {
        let length = self.length.to_be_bytes();
        [
            self.delay,
            self.pad,
            self.bank_switch,
            self.unknown2,
            self.velocity,
            self.unknown3,
            length[0],
            length[1],
        ]
    }
}

impl fmt::Display for NoteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delay={} pad={} bank_switch={} velocity={} length={}",
            self.delay, self.pad, self.bank_switch, self.velocity, self.length
        )
    }
}

/// A decoded pattern file.
#[derive(Debug, Clone)]
pub struct Pattern {
    notes: Vec<NoteRecord>,
    bars: i8,
}

impl Pattern {
    /// Decodes a pattern: `size / 8 - 2` note records followed by a 16 byte trailer.
    pub fn decode(bytes: &[u8]) -> Result<Pattern, FormatError> {
        let size = bytes.len();
        if size == 0 || size % NOTE_RECORD_SIZE != 0 || size < TRAILER_SIZE {
            return Err(FormatError::PatternSize(size));
        }

        let note_count = size / NOTE_RECORD_SIZE - 2;
        let (records, trailer) = bytes.split_at(note_count * NOTE_RECORD_SIZE);

        let notes = records
            .chunks_exact(NOTE_RECORD_SIZE)
            .enumerate()
            .map(|(i, chunk)| {
                let mut record = [0u8; NOTE_RECORD_SIZE];
                record.copy_from_slice(chunk);
                let note = NoteRecord::parse(&record);
                debug!(note = i, "{}", note);
                note
            })
            .collect();

        let mut reader = FieldReader::new(trailer);
        reader.skip(BAR_COUNT_OFFSET);
        let bars = reader.i8();
        debug!(note_count, bars, "Decoded pattern");

        Ok(Pattern { notes, bars })
    }

    /// Reads and decodes the pattern file at the given path.
    pub fn read(path: &Path) -> Result<Pattern, FormatError> {
        Pattern::decode(&read_file(path)?)
    }

    /// The notes in playback order.
    pub fn notes(&self) -> &[NoteRecord] {
        &self.notes
    }

    /// The bar count stored in the trailer.
    pub fn bars(&self) -> i8 {
        self.bars
    }

    /// The sum of all note delays in ticks.
    pub fn total_ticks(&self) -> u64 {
        self.notes.iter().map(|note| u64::from(note.delay)).sum()
    }

    /// The pattern length in ticks implied by the bar count, assuming 4/4.
    /// Returns None if the bar count isn't positive.
    pub fn bar_ticks(&self, ticks_per_quarter_note: u16) -> Option<u64> {
        if self.bars <= 0 {
            return None;
        }
        Some(self.bars as u64 * BEATS_PER_BAR * u64::from(ticks_per_quarter_note))
    }
}

/// Derives the pattern file name from a pattern name like "A1" or "b11".
pub fn pattern_file_name(name: &str, pads_per_bank: u32) -> Result<String, FormatError> {
    let invalid = || FormatError::PatternName(name.to_string());

    let mut chars = name.trim().chars();
    let letter = chars
        .next()
        .filter(|c| c.is_ascii_alphabetic())
        .ok_or_else(invalid)?
        .to_ascii_uppercase();
    let number: u32 = chars.as_str().parse().map_err(|_| invalid())?;

    let bank = (letter as u32 - 'A' as u32) * pads_per_bank;
    let pad = number % pads_per_bank;
    Ok(format!("PTN{:05}.BIN", bank + pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{note, pattern_bytes};

    #[test]
    fn test_pattern_file_name() {
        assert_eq!("PTN00001.BIN", pattern_file_name("A1", 12).expect("A1"));
        assert_eq!("PTN00023.BIN", pattern_file_name("B11", 12).expect("B11"));
        assert_eq!("PTN00023.BIN", pattern_file_name("b11", 12).expect("b11"));
        assert_eq!("PTN00012.BIN", pattern_file_name("B12", 12).expect("B12"));
        assert_eq!("PTN00017.BIN", pattern_file_name("B1", 16).expect("B1"));
        assert_eq!("PTN00159.BIN", pattern_file_name("J15", 16).expect("J15"));
    }

    #[test]
    fn test_pattern_file_name_invalid() {
        for name in ["", "1A", "A", "Ax", "A-1", "ÄA1"] {
            assert!(
                matches!(pattern_file_name(name, 12), Err(FormatError::PatternName(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_note_record_layout() {
        let bytes = [0x60, 0x2f, 0x41, 0x00, 0x7f, 0x00, 0x01, 0xe0];
        let note = NoteRecord::parse(&bytes);

        assert_eq!(96, note.delay);
        assert_eq!(47, note.pad);
        assert_eq!(65, note.bank_switch);
        assert_eq!(127, note.velocity);
        assert_eq!(480, note.length);
        assert_eq!(bytes, note.to_bytes());
    }

    #[test]
    fn test_decode_notes_and_trailer() {
        let notes = vec![note(0, 46, 0, 96), note(96, 128, 0, 0), note(48, 57, 1, 48)];
        let pattern = Pattern::decode(&pattern_bytes(&notes, 2)).expect("decode");

        assert_eq!(notes, pattern.notes());
        assert_eq!(2, pattern.bars());
        assert_eq!(144, pattern.total_ticks());
        assert_eq!(Some(768), pattern.bar_ticks(96));
    }

    #[test]
    fn test_decode_empty_pattern() {
        let pattern = Pattern::decode(&pattern_bytes(&[], 1)).expect("decode");

        assert!(pattern.notes().is_empty());
        assert_eq!(1, pattern.bars());
    }

    #[test]
    fn test_decode_negative_bar_count() {
        let pattern = Pattern::decode(&pattern_bytes(&[note(0, 47, 0, 1)], -1)).expect("decode");

        assert_eq!(-1, pattern.bars());
        assert_eq!(None, pattern.bar_ticks(96));
    }

    #[test]
    fn test_decode_bad_sizes() {
        for size in [0, 8, 17, 23, 31] {
            assert!(
                matches!(Pattern::decode(&vec![0u8; size]), Err(FormatError::PatternSize(s)) if s == size),
                "size {size} should be rejected"
            );
        }
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = Pattern::read(&dir.path().join("PTN00001.BIN"));

        assert!(matches!(result, Err(FormatError::Io { .. })));
    }
}
