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

//! Turns a pattern's notes into timed MIDI events.
//!
//! The notes are walked once, in file order. Every note advances the clock by
//! its delay, whether or not it makes a sound, and every distinct sample is
//! given the next free pitch the first time it's heard. Because the clock only
//! moves forward, the events come out ordered by start time without sorting.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config::DeviceProfile;
use crate::format::{DecodeError, NoteRecord};
use crate::samples::{note_sample_number, MissingSampleError, ResolvedSample, SampleLookup};

/// The pitch given to the first sample in a pattern (C1).
pub const BASE_PITCH: u8 = 36;

/// The highest MIDI pitch.
pub const MAX_PITCH: u8 = 127;

/// A note to be written to the MIDI file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEvent {
    pub pitch: u8,
    pub start_ticks: u64,
    pub duration_ticks: u16,
    /// The velocity recorded on the device.
    pub velocity: u8,
}

impl TimelineEvent {
    pub fn start_beats(&self, ticks_per_quarter_note: u16) -> f64 {
        self.start_ticks as f64 / f64::from(ticks_per_quarter_note)
    }

    pub fn duration_beats(&self, ticks_per_quarter_note: u16) -> f64 {
        f64::from(self.duration_ticks) / f64::from(ticks_per_quarter_note)
    }
}

/// A sample and the pitch it plays on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchAssignment {
    pub pitch: u8,
    pub sample: ResolvedSample,
}

/// Stable sample to pitch assignments in first-occurrence order.
#[derive(Debug, Clone, Default)]
pub struct PitchMap {
    assignments: Vec<PitchAssignment>,
    by_path: HashMap<PathBuf, u8>,
}

impl PitchMap {
    /// Returns the sample's pitch, assigning the next free one if the sample
    /// hasn't been seen. Returns None once the pitch range is used up.
    pub fn pitch_for(&mut self, sample: &ResolvedSample) -> Option<u8> {
        if let Some(pitch) = self.by_path.get(&sample.path) {
            return Some(*pitch);
        }

        let next = usize::from(BASE_PITCH) + self.assignments.len();
        let pitch = u8::try_from(next).ok().filter(|p| *p <= MAX_PITCH)?;
        debug!(pitch, path = ?sample.path, "Assigned pitch");
        self.by_path.insert(sample.path.clone(), pitch);
        self.assignments.push(PitchAssignment {
            pitch,
            sample: sample.clone(),
        });
        Some(pitch)
    }

    /// The assignments in pitch order.
    pub fn assignments(&self) -> &[PitchAssignment] {
        &self.assignments
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Why a note didn't produce an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Missing(MissingSampleError),
    /// Every pitch from the base pitch up is already taken.
    NoPitchAvailable,
}

/// A note that was dropped from the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedNote {
    /// Position of the note in the pattern.
    pub note: usize,
    /// The pad index the note referred to.
    pub index: i32,
    pub reason: SkipReason,
}

#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("note {note}: {source}")]
    Decode {
        note: usize,
        #[source]
        source: DecodeError,
    },
}

/// The assembled events of one pattern.
#[derive(Debug, Clone)]
pub struct Timeline {
    ticks_per_quarter_note: u16,
    events: Vec<TimelineEvent>,
    pitches: PitchMap,
    skipped: Vec<SkippedNote>,
    rests: usize,
    elapsed_ticks: u64,
}

impl Timeline {
    /// Walks the notes in order, resolving each one through `lookup`.
    /// A malformed bank switch aborts the whole pattern.
    pub fn assemble<L: SampleLookup>(
        notes: &[NoteRecord],
        profile: &DeviceProfile,
        lookup: &mut L,
    ) -> Result<Timeline, TimelineError> {
        let mut timeline = Timeline {
            ticks_per_quarter_note: profile.ticks_per_quarter_note(),
            events: Vec::new(),
            pitches: PitchMap::default(),
            skipped: Vec::new(),
            rests: 0,
            elapsed_ticks: 0,
        };

        for (i, note) in notes.iter().enumerate() {
            let number = note_sample_number(note, profile)
                .map_err(|source| TimelineError::Decode { note: i, source })?;

            match number {
                None => {
                    debug!(note = i, "Rest");
                    timeline.rests += 1;
                }
                Some(index) => timeline.trigger(i, index, note, lookup),
            }

            timeline.elapsed_ticks += u64::from(note.delay);
        }

        Ok(timeline)
    }

    fn trigger<L: SampleLookup>(&mut self, i: usize, index: i32, note: &NoteRecord, lookup: &mut L) {
        let sample = match lookup.lookup(index) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(note = i, index, err = %e, "Skipping note with missing sample");
                self.skipped.push(SkippedNote {
                    note: i,
                    index,
                    reason: SkipReason::Missing(e),
                });
                return;
            }
        };

        let Some(pitch) = self.pitches.pitch_for(&sample) else {
            warn!(note = i, index, "Skipping note, no MIDI pitches left");
            self.skipped.push(SkippedNote {
                note: i,
                index,
                reason: SkipReason::NoPitchAvailable,
            });
            return;
        };

        self.events.push(TimelineEvent {
            pitch,
            start_ticks: self.elapsed_ticks,
            duration_ticks: note.length,
            velocity: note.velocity,
        });
    }

    pub fn ticks_per_quarter_note(&self) -> u16 {
        self.ticks_per_quarter_note
    }

    /// The events in start order.
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn pitches(&self) -> &PitchMap {
        &self.pitches
    }

    pub fn skipped(&self) -> &[SkippedNote] {
        &self.skipped
    }

    /// The number of rest notes.
    pub fn rests(&self) -> usize {
        self.rests
    }

    /// The total of all note delays in ticks.
    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    pub fn elapsed_beats(&self) -> f64 {
        self.elapsed_ticks as f64 / f64::from(self.ticks_per_quarter_note)
    }
}
