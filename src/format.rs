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

//! Decoders for the sampler's on-disk binary files.
//!
//! Every device generation uses the same record layouts: big-endian, fixed
//! width, no padding between records. Both decoders share [`FieldReader`] so
//! the field order is the only thing each record type has to describe.

use std::fs;
use std::path::Path;

pub mod error;
pub mod pad;
pub mod pattern;

pub use error::{DecodeError, FormatError};
pub use pad::{PadRecord, PadTable};
pub use pattern::{pattern_file_name, NoteRecord, Pattern};

/// Sequential big-endian field reader over a single fixed-width record.
/// Callers size the record slice up front, so reads never run past it.
pub(crate) struct FieldReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        FieldReader { bytes, position: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut field = [0u8; N];
        field.copy_from_slice(&self.bytes[self.position..self.position + N]);
        self.position += N;
        field
    }

    pub(crate) fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    pub(crate) fn i8(&mut self) -> i8 {
        i8::from_be_bytes(self.take::<1>())
    }

    /// A single byte flag. Any non-zero value is set.
    pub(crate) fn flag(&mut self) -> bool {
        self.u8() != 0
    }

    pub(crate) fn u16(&mut self) -> u16 {
        u16::from_be_bytes(self.take::<2>())
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.take::<4>())
    }

    pub(crate) fn skip(&mut self, count: usize) {
        self.position += count;
    }
}

/// Reads a required input file, attaching the path to any I/O error.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, FormatError> {
    fs::read(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })
}
