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
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// The number of banks on every supported device.
pub const DEFAULT_BANKS: u32 = 10;

/// The pad code both supported devices use for "no sample".
pub const DEFAULT_REST_PAD: u8 = 128;

/// The most pads a bank can hold.
pub const MAX_PADS_PER_BANK: u32 = 255;

/// A built-in device generation.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    /// 12 pads per bank, 96 ticks per quarter note, lettered sample files.
    Sp404sx,
    /// 16 pads per bank, 480 ticks per quarter note, numbered sample files.
    Sp404mkii,
}

impl Device {
    /// All built-in devices.
    pub const ALL: [Device; 2] = [Device::Sp404sx, Device::Sp404mkii];

    /// The built-in profile for this device.
    pub fn profile(&self) -> DeviceProfile {
        match self {
            Device::Sp404sx => DeviceProfile {
                name: "Roland SP404SX".to_string(),
                banks: DEFAULT_BANKS,
                pads_per_bank: 12,
                ticks_per_quarter_note: 96,
                rest_pad: DEFAULT_REST_PAD,
                stem: StemScheme::Lettered,
                extensions: vec!["WAV".to_string(), "AIF".to_string()],
                pad_info: PathBuf::from("ROLAND/SP-404SX/SMPL/PAD_INFO.BIN"),
                pattern_dir: PathBuf::from("ROLAND/SP-404SX/PTN"),
                sample_dir: PathBuf::from("ROLAND/SP-404SX/SMPL"),
            },
            Device::Sp404mkii => DeviceProfile {
                name: "Roland SP404MKII".to_string(),
                banks: DEFAULT_BANKS,
                pads_per_bank: 16,
                ticks_per_quarter_note: 480,
                rest_pad: DEFAULT_REST_PAD,
                stem: StemScheme::Numbered,
                extensions: vec!["WAV".to_string(), "AIF".to_string(), "SMP".to_string()],
                pad_info: PathBuf::from("PADCONF.BIN"),
                pattern_dir: PathBuf::from("PTN"),
                sample_dir: PathBuf::from("SMPL"),
            },
        }
    }
}

/// How a pad index is turned into a sample file name stem.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StemScheme {
    /// `{bank letter}{pad:07}`, e.g. `B0000001`.
    Lettered,
    /// `BANK{bank index}-{pad:02}`, e.g. `BANK1-01`.
    Numbered,
}

impl StemScheme {
    /// Formats a stem from a 0-based bank and a 1-based pad within that bank.
    pub fn format(&self, bank: u32, pad_in_bank: u32) -> String {
        match self {
            StemScheme::Lettered => {
                let letter = char::from_u32('A' as u32 + bank).unwrap_or('?');
                format!("{}{:07}", letter, pad_in_bank)
            }
            StemScheme::Numbered => format!("BANK{}-{:02}", bank, pad_in_bank),
        }
    }
}

/// Everything that differs between device generations. Selected once at
/// startup and passed by reference through the pipeline.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DeviceProfile {
    /// Display name, used in the MIDI track name.
    name: String,

    #[serde(default = "default_banks")]
    banks: u32,

    pads_per_bank: u32,

    ticks_per_quarter_note: u16,

    /// The pad code that marks a rest.
    #[serde(default = "default_rest_pad")]
    rest_pad: u8,

    stem: StemScheme,

    /// Accepted sample extensions, in lookup priority order.
    extensions: Vec<String>,

    /// The pad table, relative to the export root.
    pad_info: PathBuf,

    /// The pattern directory, relative to the export root.
    pattern_dir: PathBuf,

    /// The sample directory, relative to the export root.
    sample_dir: PathBuf,
}

fn default_banks() -> u32 {
    DEFAULT_BANKS
}

fn default_rest_pad() -> u8 {
    DEFAULT_REST_PAD
}

impl DeviceProfile {
    /// Checks the values that the decoders depend on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.banks == 0 || self.banks > 26 {
            return Err(ConfigError::Invalid(format!(
                "banks must be between 1 and 26, got {}",
                self.banks
            )));
        }
        // Pad codes are a single byte.
        if self.pads_per_bank == 0 || self.pads_per_bank > MAX_PADS_PER_BANK {
            return Err(ConfigError::Invalid(format!(
                "pads_per_bank must be between 1 and {}, got {}",
                MAX_PADS_PER_BANK, self.pads_per_bank
            )));
        }
        if self.ticks_per_quarter_note == 0 || self.ticks_per_quarter_note > 0x7fff {
            return Err(ConfigError::Invalid(format!(
                "ticks_per_quarter_note must be between 1 and 32767, got {}",
                self.ticks_per_quarter_note
            )));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one sample extension is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn banks(&self) -> u32 {
        self.banks
    }

    pub fn pads_per_bank(&self) -> u32 {
        self.pads_per_bank
    }

    /// The total number of pad slots.
    pub fn pad_count(&self) -> usize {
        (self.banks * self.pads_per_bank) as usize
    }

    pub fn ticks_per_quarter_note(&self) -> u16 {
        self.ticks_per_quarter_note
    }

    pub fn rest_pad(&self) -> u8 {
        self.rest_pad
    }

    pub fn stem(&self) -> StemScheme {
        self.stem
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// The pad table path under the given export root.
    pub fn pad_info_path(&self, root: &Path) -> PathBuf {
        root.join(&self.pad_info)
    }

    /// The pattern directory under the given export root.
    pub fn pattern_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.pattern_dir)
    }

    /// The sample directory under the given export root.
    pub fn sample_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.sample_dir)
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} banks x {} pads, {} ticks per quarter note, samples: {})",
            self.name,
            self.banks,
            self.pads_per_bank,
            self.ticks_per_quarter_note,
            self.extensions.join("/"),
        )
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    #[test]
    fn test_builtin_profiles() {
        let sx = Device::Sp404sx.profile();
        assert_eq!(120, sx.pad_count());
        assert_eq!(96, sx.ticks_per_quarter_note());
        assert_eq!(128, sx.rest_pad());
        assert_eq!(StemScheme::Lettered, sx.stem());
        assert!(sx.validate().is_ok());

        let mkii = Device::Sp404mkii.profile();
        assert_eq!(160, mkii.pad_count());
        assert_eq!(480, mkii.ticks_per_quarter_note());
        assert_eq!(StemScheme::Numbered, mkii.stem());
        assert_eq!(&["WAV", "AIF", "SMP"], mkii.extensions());
        assert_eq!(
            PathBuf::from("/sd/PADCONF.BIN"),
            mkii.pad_info_path(Path::new("/sd"))
        );
        assert!(mkii.validate().is_ok());
    }

    #[test]
    fn test_stem_schemes() {
        assert_eq!("A0000001", StemScheme::Lettered.format(0, 1));
        assert_eq!("J0000012", StemScheme::Lettered.format(9, 12));
        assert_eq!("BANK0-01", StemScheme::Numbered.format(0, 1));
        assert_eq!("BANK9-16", StemScheme::Numbered.format(9, 16));
    }

    #[test]
    fn test_profile_deserialize() {
        let yaml = r#"
            name: Custom
            pads_per_bank: 16
            ticks_per_quarter_note: 480
            stem: numbered
            extensions:
              - WAV
            pad_info: PADCONF.BIN
            pattern_dir: PTN
            sample_dir: SMPL
        "#;

        let profile: DeviceProfile = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!("Custom", profile.name());
        assert_eq!(DEFAULT_BANKS, profile.banks());
        assert_eq!(DEFAULT_REST_PAD, profile.rest_pad());
        assert_eq!(StemScheme::Numbered, profile.stem());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut profile = Device::Sp404sx.profile();
        profile.pads_per_bank = 0;
        assert!(matches!(profile.validate(), Err(ConfigError::Invalid(_))));

        let mut profile = Device::Sp404sx.profile();
        profile.pads_per_bank = 256;
        assert!(matches!(profile.validate(), Err(ConfigError::Invalid(_))));

        let mut profile = Device::Sp404sx.profile();
        profile.pads_per_bank = 1_000_000_000;
        assert!(matches!(profile.validate(), Err(ConfigError::Invalid(_))));

        let mut profile = Device::Sp404mkii.profile();
        profile.banks = 26;
        profile.pads_per_bank = 255;
        assert!(profile.validate().is_ok());
        assert_eq!(6630, profile.pad_count());

        let mut profile = Device::Sp404sx.profile();
        profile.extensions.clear();
        assert!(matches!(profile.validate(), Err(ConfigError::Invalid(_))));

        let mut profile = Device::Sp404sx.profile();
        profile.ticks_per_quarter_note = 0;
        assert!(matches!(profile.validate(), Err(ConfigError::Invalid(_))));
    }
}
