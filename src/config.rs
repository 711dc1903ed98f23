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
use std::path::Path;

use config::{Config, File};
use tracing::info;

pub mod error;
pub mod profile;
pub mod settings;

pub use error::ConfigError;
pub use profile::{Device, DeviceProfile, StemScheme};
pub use settings::{ConversionSettings, InstrumentFormat, VelocityMode};

/// Loads the profile for the given device. Fields present in the optional
/// override file replace the built-in values.
pub fn load_profile(device: Device, overrides: Option<&Path>) -> Result<DeviceProfile, ConfigError> {
    let builtin = device.profile();
    let profile = match overrides {
        Some(path) => {
            info!(path = ?path, device = ?device, "Loading device profile overrides");
            Config::builder()
                .add_source(Config::try_from(&builtin)?)
                .add_source(File::from(path))
                .build()?
                .try_deserialize::<DeviceProfile>()?
        }
        None => builtin,
    };

    profile.validate()?;
    Ok(profile)
}

/// Loads conversion settings from an optional YAML file.
pub fn load_settings(path: Option<&Path>) -> Result<ConversionSettings, ConfigError> {
    match path {
        Some(path) => {
            info!(path = ?path, "Loading conversion settings");
            Ok(Config::builder()
                .add_source(File::from(path))
                .build()?
                .try_deserialize::<ConversionSettings>()?)
        }
        None => Ok(ConversionSettings::default()),
    }
}
