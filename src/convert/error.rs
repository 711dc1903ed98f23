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

use thiserror::Error;

use crate::audio::AudioError;
use crate::config::ConfigError;
use crate::format::FormatError;
use crate::instrument::SoundFontError;
use crate::midi::MidiError;
use crate::timeline::TimelineError;

/// Errors that abort a conversion. Nothing is left in the output directory
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Format(#[from] FormatError),

    #[error("Pattern can't be decoded: {0}")]
    Timeline(#[from] TimelineError),

    #[error("{0}")]
    Midi(#[from] MidiError),

    #[error("Unable to write trimmed sample: {0}")]
    Audio(#[from] AudioError),

    #[error("{0}")]
    SoundFont(#[from] SoundFontError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}
