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

/// Error types for audio source operations
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Unsupported audio file {}: {reason}", path.display())]
    Unsupported { path: PathBuf, reason: String },

    #[error("WAV error: {0}")]
    WavError(#[from] hound::Error),

    #[error("Audio file error: {0}")]
    DecodeError(#[from] symphonia::core::errors::Error),

    #[error("IO error on {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
