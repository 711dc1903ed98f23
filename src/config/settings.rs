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
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Default velocity value when velocity mode is set to fixed.
pub const DEFAULT_VELOCITY: u8 = 100;

/// Which instrument artifact accompanies the MIDI file.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentFormat {
    /// An SFZ region list plus a directory of trimmed WAV files.
    #[default]
    Sfz,
    /// A single SoundFont 2 bank with the trimmed samples embedded.
    Sf2,
}

/// Velocity handling mode.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VelocityMode {
    /// Every note plays at the default velocity.
    #[default]
    Fixed,
    /// Use the velocity recorded in the pattern.
    Recorded,
}

/// Settings for a single conversion run. Every field has a default, so an
/// empty settings file is valid.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ConversionSettings {
    /// Tempo written to the MIDI file in beats per minute.
    tempo: Option<f64>,

    #[serde(default)]
    instrument: InstrumentFormat,

    #[serde(default)]
    velocity: VelocityMode,

    /// Velocity used when the mode is fixed.
    #[serde(default = "default_velocity")]
    default_velocity: u8,

    /// The MIDI channel notes are written to (0-15).
    #[serde(default)]
    midi_channel: u8,

    /// Where the outputs are written. Defaults to the working directory.
    output_dir: Option<PathBuf>,
}

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}

impl Default for ConversionSettings {
    fn default() -> Self {
        ConversionSettings {
            tempo: None,
            instrument: InstrumentFormat::default(),
            velocity: VelocityMode::default(),
            default_velocity: DEFAULT_VELOCITY,
            midi_channel: 0,
            output_dir: None,
        }
    }
}

impl ConversionSettings {
    pub fn with_tempo(mut self, tempo: f64) -> Self {
        self.tempo = Some(tempo);
        self
    }

    pub fn with_instrument(mut self, instrument: InstrumentFormat) -> Self {
        self.instrument = instrument;
        self
    }

    pub fn with_velocity(mut self, velocity: VelocityMode) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = Some(output_dir);
        self
    }

    /// Checks that the settings can drive a conversion.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.tempo {
            None => return Err(ConfigError::Invalid("a tempo is required".to_string())),
            Some(tempo) if !tempo.is_finite() || tempo <= 0.0 => {
                return Err(ConfigError::Invalid(format!(
                    "tempo must be a positive number of beats per minute, got {}",
                    tempo
                )))
            }
            Some(_) => {}
        }
        if self.midi_channel > 15 {
            return Err(ConfigError::Invalid(format!(
                "midi_channel must be between 0 and 15, got {}",
                self.midi_channel
            )));
        }
        if self.default_velocity == 0 || self.default_velocity > 127 {
            return Err(ConfigError::Invalid(format!(
                "default_velocity must be between 1 and 127, got {}",
                self.default_velocity
            )));
        }
        Ok(())
    }

    /// The tempo in beats per minute. Falls back to 120 if unset; callers
    /// are expected to have validated the settings.
    pub fn tempo(&self) -> f64 {
        self.tempo.unwrap_or(120.0)
    }

    pub fn instrument(&self) -> InstrumentFormat {
        self.instrument
    }

    pub fn midi_channel(&self) -> u8 {
        self.midi_channel
    }

    /// The velocity to write for a note recorded with the given velocity.
    pub fn velocity_for(&self, recorded: u8) -> u8 {
        match self.velocity {
            VelocityMode::Fixed => self.default_velocity,
            VelocityMode::Recorded => recorded.clamp(1, 127),
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(Path::new("."))
    }
}
