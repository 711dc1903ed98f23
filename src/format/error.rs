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
use std::path::PathBuf;

/// The shape of an input file doesn't match the fixed binary layout.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("pad table is {actual} bytes, expected at least {expected}")]
    PadTableTooShort { expected: usize, actual: usize },

    #[error("pattern file is {0} bytes, expected a positive multiple of 8 holding a 16 byte trailer")]
    PatternSize(usize),

    #[error("invalid pattern name '{0}', expected a bank letter followed by a pad number (e.g. A1)")]
    PatternName(String),

    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A field value is outside of the domain the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected bank switch value {0}, expected one of 0, 1, 64 or 65")]
    BankSwitch(u8),
}
