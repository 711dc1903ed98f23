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
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{crate_version, Parser, Subcommand};
use ptn2mid::config::{self, Device, DeviceProfile, InstrumentFormat, VelocityMode};
use ptn2mid::convert::{self, print_report};
use ptn2mid::format::{pattern_file_name, PadTable, Pattern};
use ptn2mid::samples::{note_sample_number, sample_stem};
use ptn2mid::util::beats_display;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Converts SP-404 patterns into MIDI files and sampler instruments."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converts a pattern into a MIDI file and an instrument map.
    Convert {
        /// The root of the device export (e.g. the SD card).
        root: PathBuf,
        /// The pattern to convert, e.g. "A1".
        pattern: String,
        /// The tempo of the pattern in beats per minute.
        tempo: f64,
        /// The device that produced the export.
        #[arg(short, long, value_enum, default_value_t = Device::Sp404sx)]
        device: Device,
        /// A YAML file overriding fields of the device profile.
        #[arg(long)]
        profile: Option<PathBuf>,
        /// A YAML file with conversion settings.
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// The instrument format to write alongside the MIDI file.
        #[arg(short, long, value_enum)]
        instrument: Option<InstrumentFormat>,
        /// How note velocities are chosen.
        #[arg(long, value_enum)]
        velocity: Option<VelocityMode>,
        /// The directory the outputs are written to.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Prints the decoded pad table of an export.
    Pads {
        /// The root of the device export.
        root: PathBuf,
        /// The device that produced the export.
        #[arg(short, long, value_enum, default_value_t = Device::Sp404sx)]
        device: Device,
        /// A YAML file overriding fields of the device profile.
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Prints the decoded notes of a pattern.
    Pattern {
        /// The root of the device export.
        root: PathBuf,
        /// The pattern to print, e.g. "A1".
        pattern: String,
        /// The device that produced the export.
        #[arg(short, long, value_enum, default_value_t = Device::Sp404sx)]
        device: Device,
        /// A YAML file overriding fields of the device profile.
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Lists the built-in device profiles.
    ListDevices {},
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            root,
            pattern,
            tempo,
            device,
            profile,
            settings,
            instrument,
            velocity,
            output_dir,
        } => {
            let profile = config::load_profile(device, profile.as_deref())?;
            let mut settings = config::load_settings(settings.as_deref())?.with_tempo(tempo);
            if let Some(instrument) = instrument {
                settings = settings.with_instrument(instrument);
            }
            if let Some(velocity) = velocity {
                settings = settings.with_velocity(velocity);
            }
            if let Some(output_dir) = output_dir {
                settings = settings.with_output_dir(output_dir);
            }

            let report = convert::convert(&root, &pattern, &profile, &settings)?;
            print_report(&report);
        }
        Commands::Pads {
            root,
            device,
            profile,
        } => {
            let profile = config::load_profile(device, profile.as_deref())?;
            print_pads(&root, &profile)?;
        }
        Commands::Pattern {
            root,
            pattern,
            device,
            profile,
        } => {
            let profile = config::load_profile(device, profile.as_deref())?;
            print_pattern(&root, &pattern, &profile)?;
        }
        Commands::ListDevices {} => {
            println!("Devices:");
            for device in Device::ALL {
                println!("- {:?}: {}", device, device.profile());
            }
        }
    };

    Ok(())
}

fn print_pads(root: &Path, profile: &DeviceProfile) -> Result<(), Box<dyn Error>> {
    let pads = PadTable::read(&profile.pad_info_path(root), profile.pad_count())?;
    println!("{}: {} pad(s)", profile.name(), pads.len());
    for (index, pad) in pads.iter() {
        let stem = sample_stem(index as i32, profile).unwrap_or_default();
        println!("{:>3} {:<10} {}", index, stem, pad);
    }
    Ok(())
}

fn print_pattern(root: &Path, name: &str, profile: &DeviceProfile) -> Result<(), Box<dyn Error>> {
    let path = profile
        .pattern_dir(root)
        .join(pattern_file_name(name, profile.pads_per_bank())?);
    let pattern = Pattern::read(&path)?;
    let tpqn = profile.ticks_per_quarter_note();

    println!(
        "{}: {} note(s), {} bar(s), {} beat(s)",
        path.display(),
        pattern.notes().len(),
        pattern.bars(),
        beats_display(pattern.total_ticks(), tpqn)
    );

    let mut ticks = 0u64;
    for (i, note) in pattern.notes().iter().enumerate() {
        let target = match note_sample_number(note, profile) {
            Ok(Some(index)) => sample_stem(index, profile)
                .map(|stem| format!("{} ({})", index, stem))
                .unwrap_or_else(|| format!("{} (out of range)", index)),
            Ok(None) => "rest".to_string(),
            Err(e) => e.to_string(),
        };
        println!(
            "{:>4} @{:>9} {:<22} {}",
            i,
            beats_display(ticks, tpqn),
            target,
            note
        );
        ticks += u64::from(note.delay);
    }
    Ok(())
}
