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

//! Instrument maps that play a pattern's samples on their assigned keys.

pub mod sf2;
pub mod sfz;

use crate::audio::PcmClip;
use crate::format::PadRecord;

pub use sf2::{write_soundfont, SoundFontError};
pub use sfz::render_sfz;

/// The pad volume that plays a sample at unity gain.
const FULL_VOLUME: u8 = 127;

/// A trimmed sample and the key it plays on.
#[derive(Debug, Clone)]
pub struct InstrumentRegion {
    pub pitch: u8,
    /// The file name stem of the source sample.
    pub stem: String,
    /// The pad the sample was loaded from, for its playback flags.
    pub pad: PadRecord,
    pub clip: PcmClip,
}

impl InstrumentRegion {
    /// The name of the WAV file the clip is written to.
    pub fn sample_file_name(&self) -> String {
        format!("{:03}_{}.wav", self.pitch, self.stem)
    }

    /// The pad volume as gain in decibels. A volume of zero is treated as
    /// unset.
    pub fn volume_db(&self) -> Option<f64> {
        if self.pad.volume == 0 {
            return None;
        }
        Some(20.0 * (f64::from(self.pad.volume) / f64::from(FULL_VOLUME)).log10())
    }
}
