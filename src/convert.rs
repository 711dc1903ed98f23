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

//! Runs a whole pattern conversion.
//!
//! The pad table and pattern are decoded, the timeline is assembled, and the
//! samples it references are trimmed in parallel. Everything is written into a
//! staging directory next to the outputs and only moved into place once every
//! file has been written, so a failed run leaves nothing behind.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::audio::open_audio_source;
use crate::config::{ConversionSettings, DeviceProfile, InstrumentFormat};
use crate::format::{pattern_file_name, PadTable, Pattern};
use crate::instrument::{render_sfz, write_soundfont, InstrumentRegion};
use crate::midi;
use crate::samples::{SampleResolver, TrimWindow};
use crate::timeline::{PitchAssignment, Timeline};
use crate::util::filename_display;

pub mod error;
pub mod report;

pub use error::ConvertError;
pub use report::{print_report, ConversionReport, Issue, Severity};

use report::{CATEGORY_BAR_COUNT, CATEGORY_SAMPLE_READ, CATEGORY_TRIM};

/// Holds the outputs being replaced while a run is committed.
const PREVIOUS_DIR: &str = ".previous";

/// The base name shared by every output of a pattern, e.g. "PTN_A1".
pub fn output_stem(pattern_name: &str) -> String {
    format!("PTN_{}", pattern_name.to_uppercase())
}

/// The MIDI track name for a pattern.
pub fn track_name(profile: &DeviceProfile, pattern_name: &str) -> String {
    format!("{} Pattern {}", profile.name(), pattern_name.to_uppercase())
}

/// Converts one pattern of the export at `root` into a MIDI file and an
/// instrument map in the settings' output directory.
pub fn convert(
    root: &Path,
    pattern_name: &str,
    profile: &DeviceProfile,
    settings: &ConversionSettings,
) -> Result<ConversionReport, ConvertError> {
    settings.validate()?;
    let pattern_name = pattern_name.trim();

    let pads = PadTable::read(&profile.pad_info_path(root), profile.pad_count())?;
    let pattern_path = profile
        .pattern_dir(root)
        .join(pattern_file_name(pattern_name, profile.pads_per_bank())?);
    info!(pattern = pattern_name, path = ?pattern_path, "Reading pattern");
    let pattern = Pattern::read(&pattern_path)?;

    let mut report = ConversionReport {
        notes: pattern.notes().len(),
        ..Default::default()
    };
    if let Some(issue) = check_bar_count(&pattern, profile.ticks_per_quarter_note()) {
        warn!(message = %issue.message, "Bar count mismatch");
        report.push(issue);
    }

    let mut resolver = SampleResolver::new(profile, &profile.sample_dir(root));
    let timeline = Timeline::assemble(pattern.notes(), profile, &mut resolver)?;
    report.rests = timeline.rests();
    report.events = timeline.events().len();
    for skipped in timeline.skipped() {
        report.push(Issue::skipped_note(skipped));
    }

    let (regions, issues) = trim_samples(&timeline, &pads);
    report.issues.extend(issues);
    report.samples = regions.len();

    let name = track_name(profile, pattern_name);
    let midi = midi::write_pattern(&timeline, &name, settings)?;

    let output_dir = settings.output_dir();
    fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;
    let staging = tempfile::Builder::new()
        .prefix(".ptn2mid-")
        .tempdir_in(output_dir)
        .map_err(|e| ConvertError::io(output_dir, e))?;
    debug!(path = ?staging.path(), "Staging outputs");

    let stem = output_stem(pattern_name);
    let mut staged = Vec::new();

    let midi_name = format!("{stem}.mid");
    write_file(&staging.path().join(&midi_name), &midi)?;
    staged.push(midi_name);

    match settings.instrument() {
        InstrumentFormat::Sfz => {
            let sample_dir_name = format!("{stem}_samples");
            let sample_dir = staging.path().join(&sample_dir_name);
            fs::create_dir(&sample_dir).map_err(|e| ConvertError::io(&sample_dir, e))?;
            regions.par_iter().try_for_each(|region| {
                region
                    .clip
                    .write_wav(&sample_dir.join(region.sample_file_name()))
            })?;
            staged.push(sample_dir_name.clone());

            let sfz_name = format!("{stem}.sfz");
            let sfz = render_sfz(&name, &sample_dir_name, &regions);
            write_file(&staging.path().join(&sfz_name), sfz.as_bytes())?;
            staged.push(sfz_name);
        }
        InstrumentFormat::Sf2 => {
            let sf2_name = format!("{stem}.sf2");
            let sf2 = write_soundfont(&stem, &regions)?;
            write_file(&staging.path().join(&sf2_name), &sf2)?;
            staged.push(sf2_name);
        }
    }

    report.outputs = commit(staging.path(), output_dir, &staged)?;
    info!(
        pattern = pattern_name,
        events = report.events,
        samples = report.samples,
        issues = report.issues.len(),
        "Converted pattern"
    );
    Ok(report)
}

/// Compares the pattern's bar count against the sum of its delays. A
/// mismatch is worth a warning but never stops the run.
fn check_bar_count(pattern: &Pattern, ticks_per_quarter_note: u16) -> Option<Issue> {
    let expected = pattern.bar_ticks(ticks_per_quarter_note)?;
    let actual = pattern.total_ticks();
    if expected == actual {
        return None;
    }
    Some(Issue::warning(
        CATEGORY_BAR_COUNT,
        "pattern".to_string(),
        format!(
            "{} bar(s) should last {} ticks but the note delays add up to {}",
            pattern.bars(),
            expected,
            actual
        ),
    ))
}

/// Trims every sample in the pitch map, one job per sample. The regions come
/// back in pitch order; samples that can't be read are left out.
fn trim_samples(timeline: &Timeline, pads: &PadTable) -> (Vec<InstrumentRegion>, Vec<Issue>) {
    let results: Vec<(Option<InstrumentRegion>, Vec<Issue>)> = timeline
        .pitches()
        .assignments()
        .par_iter()
        .map(|assignment| trim_sample(assignment, pads))
        .collect();

    let mut regions = Vec::with_capacity(results.len());
    let mut issues = Vec::new();
    for (region, found) in results {
        regions.extend(region);
        issues.extend(found);
    }
    (regions, issues)
}

fn trim_sample(
    assignment: &PitchAssignment,
    pads: &PadTable,
) -> (Option<InstrumentRegion>, Vec<Issue>) {
    let sample = &assignment.sample;
    let subject = format!("pad {}", sample.index);
    let mut issues = Vec::new();

    let pad = pads.get(sample.index).copied().unwrap_or_default();
    let window = match TrimWindow::for_pad(&pad) {
        Ok(window) => window,
        Err(e) => {
            warn!(pad = sample.index, err = %e, "Using the whole sample");
            issues.push(Issue::warning(
                CATEGORY_TRIM,
                subject.clone(),
                format!("{}, using the whole sample", e),
            ));
            TrimWindow::Untrimmed
        }
    };

    let clip = open_audio_source(&sample.path).and_then(|mut source| {
        let frames = window.frames(source.frame_count());
        debug!(
            pad = sample.index,
            file = filename_display(&sample.path),
            format = %source.format(),
            start = frames.start,
            end = frames.end,
            "Trimming sample"
        );
        source.read_frames(frames)
    });

    match clip {
        Ok(clip) => {
            let region = InstrumentRegion {
                pitch: assignment.pitch,
                stem: sample.stem.clone(),
                pad,
                clip,
            };
            (Some(region), issues)
        }
        Err(e) => {
            error!(pad = sample.index, path = ?sample.path, err = %e, "Unable to read sample");
            issues.push(Issue::error(
                CATEGORY_SAMPLE_READ,
                subject,
                format!("{}: {}", filename_display(&sample.path), e),
            ));
            (None, issues)
        }
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), ConvertError> {
    fs::write(path, contents).map_err(|e| ConvertError::io(path, e))
}

/// Moves staged entries into the output directory, replacing what's there.
/// Either every entry is moved or the output directory is left as it was.
fn commit(
    staging: &Path,
    output_dir: &Path,
    names: &[String],
) -> Result<Vec<PathBuf>, ConvertError> {
    // Existing outputs are parked here until every staged entry is in place.
    let previous = staging.join(PREVIOUS_DIR);
    fs::create_dir(&previous).map_err(|e| ConvertError::io(&previous, e))?;

    let mut parked = Vec::new();
    let mut placed = Vec::new();
    let result = names.iter().try_for_each(|name| -> Result<(), ConvertError> {
        let target = output_dir.join(name);
        if fs::symlink_metadata(&target).is_ok() {
            fs::rename(&target, previous.join(name)).map_err(|e| ConvertError::io(&target, e))?;
            parked.push(name);
        }
        Ok(())
    });
    let result = result.and_then(|()| {
        names.iter().try_for_each(|name| -> Result<(), ConvertError> {
            let target = output_dir.join(name);
            fs::rename(staging.join(name), &target).map_err(|e| ConvertError::io(&target, e))?;
            debug!(path = ?target, "Wrote output");
            placed.push(target);
            Ok(())
        })
    });

    if let Err(e) = result {
        error!(err = %e, "Unable to move outputs into place, restoring previous outputs");
        rollback(output_dir, &previous, &placed, &parked);
        return Err(e);
    }
    Ok(placed)
}

/// Removes newly placed outputs and moves parked ones back.
fn rollback(output_dir: &Path, previous: &Path, placed: &[PathBuf], parked: &[&String]) {
    for target in placed {
        let removed = if target.is_dir() {
            fs::remove_dir_all(target)
        } else {
            fs::remove_file(target)
        };
        if let Err(e) = removed {
            warn!(path = ?target, err = %e, "Unable to remove output");
        }
    }
    for name in parked {
        let target = output_dir.join(name);
        if let Err(e) = fs::rename(previous.join(name), &target) {
            warn!(path = ?target, err = %e, "Unable to restore previous output");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use hound::WavReader;
    use midly::Smf;

    use super::*;
    use crate::config::Device;
    use crate::format::PadRecord;
    use crate::testutil::{note, trimmed_pad, ExportTree};

    fn settings(output_dir: &Path, instrument: InstrumentFormat) -> ConversionSettings {
        ConversionSettings::default()
            .with_tempo(120.0)
            .with_instrument(instrument)
            .with_output_dir(output_dir.to_path_buf())
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("read dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn wav_samples(path: &Path) -> (u16, Vec<i32>) {
        let mut reader = WavReader::open(path).expect("open wav");
        let channels = reader.spec().channels;
        let samples = reader.samples::<i32>().map(|s| s.expect("sample")).collect();
        (channels, samples)
    }

    /// Pads 1 and 71 have samples; pad 2 is referenced but missing.
    fn sp404sx_export() -> ExportTree {
        let tree = ExportTree::new(Device::Sp404sx.profile()).expect("tree");
        tree.write_pads(&[(1, trimmed_pad(10, 60)), (71, trimmed_pad(0, 500))])
            .expect("pads");
        tree.write_sample("A0000001.WAV", 1, &(0..100).collect::<Vec<i32>>())
            .expect("sample");
        tree.write_sample("F0000011.WAV", 2, &(0..80).collect::<Vec<i32>>())
            .expect("sample");
        tree.write_pattern(
            "A1",
            &[
                note(0, 47, 0, 96),
                note(96, 128, 0, 0),
                note(48, 57, 1, 48),
                note(0, 48, 0, 10),
            ],
            1,
        )
        .expect("pattern");
        tree
    }

    #[test]
    fn test_convert_to_sfz() {
        let tree = sp404sx_export();
        let out = tempfile::tempdir().expect("tempdir");
        let profile = Device::Sp404sx.profile();

        let report = convert(
            tree.root(),
            "a1",
            &profile,
            &settings(out.path(), InstrumentFormat::Sfz),
        )
        .expect("convert");

        assert_eq!(
            vec!["PTN_A1.mid", "PTN_A1.sfz", "PTN_A1_samples"],
            entries(out.path())
        );
        assert_eq!(
            vec!["036_A0000001.wav", "037_F0000011.wav"],
            entries(&out.path().join("PTN_A1_samples"))
        );
        assert_eq!(3, report.outputs.len());

        let samples_dir = out.path().join("PTN_A1_samples");
        let (channels, samples) = wav_samples(&samples_dir.join("036_A0000001.wav"));
        assert_eq!(1, channels);
        assert_eq!((10..60).collect::<Vec<i32>>(), samples);
        // The trim end is past the end of the file, so it's clamped.
        let (channels, samples) = wav_samples(&samples_dir.join("037_F0000011.wav"));
        assert_eq!(2, channels);
        assert_eq!((0..80).collect::<Vec<i32>>(), samples);

        let sfz = fs::read_to_string(out.path().join("PTN_A1.sfz")).expect("sfz");
        assert!(sfz.contains("default_path=PTN_A1_samples/"));
        assert!(sfz.contains("sample=036_A0000001.wav\nkey=36\n"));
        assert!(sfz.contains("sample=037_F0000011.wav\nkey=37\n"));

        let midi = fs::read(out.path().join("PTN_A1.mid")).expect("midi");
        let smf = Smf::parse(&midi).expect("parse midi");
        assert_eq!(1, smf.tracks.len());

        assert_eq!(4, report.notes);
        assert_eq!(1, report.rests);
        assert_eq!(2, report.events);
        assert_eq!(1, report.skipped_notes());
        assert_eq!(2, report.samples);
        let categories: Vec<&str> = report.issues.iter().map(|i| i.category).collect();
        assert_eq!(vec!["bar-count", "missing-sample"], categories);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_convert_to_sf2() {
        let profile = Device::Sp404mkii.profile();
        let tree = ExportTree::new(profile.clone()).expect("tree");
        tree.write_pads(&[(1, trimmed_pad(0, 4))]).expect("pads");
        tree.write_sample("BANK0-01.WAV", 1, &[5, 6, 7, 8, 9, 10])
            .expect("sample");
        tree.write_pattern("A1", &[note(240, 47, 64, 480), note(240, 47, 0, 480)], 0)
            .expect("pattern");
        let out = tempfile::tempdir().expect("tempdir");

        let report = convert(
            tree.root(),
            "A1",
            &profile,
            &settings(out.path(), InstrumentFormat::Sf2),
        )
        .expect("convert");

        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(vec!["PTN_A1.mid", "PTN_A1.sf2"], entries(out.path()));

        let bytes = fs::read(out.path().join("PTN_A1.sf2")).expect("sf2");
        let soundfont = rustysynth::SoundFont::new(&mut Cursor::new(&bytes)).expect("parse");
        let header = &soundfont.get_sample_headers()[0];
        assert_eq!("036_BANK0-01", header.get_name());
        assert_eq!(
            &[5, 6, 7, 8],
            &soundfont.get_wave_data()[header.get_start() as usize..header.get_end() as usize]
        );
    }

    #[test]
    fn test_bad_bank_switch_leaves_no_output() {
        let tree = sp404sx_export();
        tree.write_pattern("B1", &[note(0, 47, 0, 1), note(0, 47, 3, 1)], 1)
            .expect("pattern");
        let out = tempfile::tempdir().expect("tempdir");
        let profile = Device::Sp404sx.profile();

        let result = convert(
            tree.root(),
            "B1",
            &profile,
            &settings(out.path(), InstrumentFormat::Sfz),
        );

        assert!(matches!(result, Err(ConvertError::Timeline(_))));
        assert!(entries(out.path()).is_empty());
    }

    #[test]
    fn test_missing_pad_table_is_fatal() {
        let tree = ExportTree::new(Device::Sp404sx.profile()).expect("tree");
        tree.write_pattern("A1", &[note(0, 47, 0, 1)], 1).expect("pattern");
        let out = tempfile::tempdir().expect("tempdir");

        let result = convert(
            tree.root(),
            "A1",
            &Device::Sp404sx.profile(),
            &settings(out.path(), InstrumentFormat::Sfz),
        );

        assert!(matches!(result, Err(ConvertError::Format(_))));
        assert!(entries(out.path()).is_empty());
    }

    #[test]
    fn test_missing_tempo_is_rejected() {
        let tree = sp404sx_export();
        let out = tempfile::tempdir().expect("tempdir");
        let settings = ConversionSettings::default().with_output_dir(out.path().to_path_buf());

        let result = convert(tree.root(), "A1", &Device::Sp404sx.profile(), &settings);

        assert!(matches!(result, Err(ConvertError::Config(_))));
    }

    #[test]
    fn test_bad_trim_and_unreadable_sample() {
        let tree = ExportTree::new(Device::Sp404sx.profile()).expect("tree");
        tree.write_pads(&[
            (
                1,
                PadRecord {
                    user_start: 513,
                    user_end: 600,
                    ..Default::default()
                },
            ),
            (2, trimmed_pad(0, 2)),
        ])
        .expect("pads");
        tree.write_sample("A0000001.WAV", 1, &[1, 2, 3]).expect("sample");
        let broken = Device::Sp404sx
            .profile()
            .sample_dir(tree.root())
            .join("A0000002.WAV");
        fs::write(broken, b"not a wav file").expect("write");
        tree.write_pattern("A1", &[note(96, 47, 0, 48), note(96, 48, 0, 48)], 0)
            .expect("pattern");
        let out = tempfile::tempdir().expect("tempdir");

        let report = convert(
            tree.root(),
            "A1",
            &Device::Sp404sx.profile(),
            &settings(out.path(), InstrumentFormat::Sfz),
        )
        .expect("convert");

        // Both notes still play; only the readable sample gets a region.
        assert_eq!(2, report.events);
        assert_eq!(1, report.samples);
        let categories: Vec<(&str, Severity)> = report
            .issues
            .iter()
            .map(|i| (i.category, i.severity))
            .collect();
        assert_eq!(
            vec![("trim", Severity::Warning), ("sample-read", Severity::Error)],
            categories
        );
        let (_, samples) = wav_samples(&out.path().join("PTN_A1_samples/036_A0000001.wav"));
        assert_eq!(vec![1, 2, 3], samples);
    }

    #[test]
    fn test_outputs_are_replaced() {
        let tree = sp404sx_export();
        let out = tempfile::tempdir().expect("tempdir");
        fs::write(out.path().join("PTN_A1.mid"), b"old").expect("write");
        fs::create_dir(out.path().join("PTN_A1_samples")).expect("mkdir");
        fs::write(out.path().join("PTN_A1_samples/stale.wav"), b"old").expect("write");

        convert(
            tree.root(),
            "A1",
            &Device::Sp404sx.profile(),
            &settings(out.path(), InstrumentFormat::Sfz),
        )
        .expect("convert");

        assert_ne!(b"old".to_vec(), fs::read(out.path().join("PTN_A1.mid")).expect("read"));
        assert!(!out.path().join("PTN_A1_samples/stale.wav").exists());
    }

    #[test]
    fn test_failed_commit_restores_previous_outputs() {
        let staging = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        fs::write(staging.path().join("PTN_A1.mid"), b"new").expect("write");
        fs::write(out.path().join("PTN_A1.mid"), b"old").expect("write");
        fs::write(out.path().join("PTN_A1.sfz"), b"old").expect("write");

        // PTN_A1.sfz was never staged, so moving it into place fails after
        // the MIDI file has already been replaced.
        let result = commit(
            staging.path(),
            out.path(),
            &["PTN_A1.mid".to_string(), "PTN_A1.sfz".to_string()],
        );

        assert!(matches!(result, Err(ConvertError::Io { .. })));
        assert_eq!(b"old".to_vec(), fs::read(out.path().join("PTN_A1.mid")).expect("read"));
        assert_eq!(b"old".to_vec(), fs::read(out.path().join("PTN_A1.sfz")).expect("read"));
        assert_eq!(vec!["PTN_A1.mid", "PTN_A1.sfz"], entries(out.path()));
    }

    #[test]
    fn test_commit_moves_every_entry() {
        let staging = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        fs::write(staging.path().join("PTN_A1.mid"), b"new").expect("write");
        fs::create_dir(staging.path().join("PTN_A1_samples")).expect("mkdir");
        fs::write(out.path().join("PTN_A1.mid"), b"old").expect("write");

        let outputs = commit(
            staging.path(),
            out.path(),
            &["PTN_A1.mid".to_string(), "PTN_A1_samples".to_string()],
        )
        .expect("commit");

        assert_eq!(
            vec![out.path().join("PTN_A1.mid"), out.path().join("PTN_A1_samples")],
            outputs
        );
        assert_eq!(b"new".to_vec(), fs::read(out.path().join("PTN_A1.mid")).expect("read"));
        assert!(out.path().join("PTN_A1_samples").is_dir());
    }

    #[test]
    fn test_pattern_name_is_trimmed() {
        let tree = sp404sx_export();
        let out = tempfile::tempdir().expect("tempdir");

        convert(
            tree.root(),
            " a1 ",
            &Device::Sp404sx.profile(),
            &settings(out.path(), InstrumentFormat::Sf2),
        )
        .expect("convert");

        assert_eq!(vec!["PTN_A1.mid", "PTN_A1.sf2"], entries(out.path()));
        let midi = fs::read(out.path().join("PTN_A1.mid")).expect("midi");
        let smf = Smf::parse(&midi).expect("parse midi");
        assert!(smf.tracks[0].iter().any(|e| e.kind
            == midly::TrackEventKind::Meta(midly::MetaMessage::TrackName(
                &b"Roland SP404SX Pattern A1"[..]
            ))));
    }

    #[test]
    fn test_check_bar_count() {
        let pattern = Pattern::decode(&crate::testutil::pattern_bytes(
            &[note(96, 47, 0, 1), note(255, 128, 0, 0), note(33, 128, 0, 0)],
            1,
        ))
        .expect("pattern");
        assert_eq!(None, check_bar_count(&pattern, 96));
        assert!(check_bar_count(&pattern, 480).is_some());
    }

    #[test]
    fn test_output_names() {
        assert_eq!("PTN_B11", output_stem("b11"));
        assert_eq!(
            "Roland SP404SX Pattern C3",
            track_name(&Device::Sp404sx.profile(), "c3")
        );
    }
}
