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
use std::io;

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use tracing::debug;

use crate::config::ConversionSettings;
use crate::timeline::Timeline;

#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("tempo {0} BPM can't be written to a MIDI file")]
    Tempo(f64),

    #[error("{what} {value} is out of range for a MIDI file")]
    OutOfRange { what: &'static str, value: u64 },

    #[error("unable to serialize MIDI file: {0}")]
    Io(#[from] io::Error),
}

const MAX_TEMPO_MICROS: u32 = 0x00ff_ffff;

/// Microseconds per quarter note for the given tempo.
pub fn tempo_micros(bpm: f64) -> Result<u24, MidiError> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(MidiError::Tempo(bpm));
    }
    let micros = (60_000_000.0 / bpm).round();
    if !(1.0..=f64::from(MAX_TEMPO_MICROS)).contains(&micros) {
        return Err(MidiError::Tempo(bpm));
    }
    Ok(u24::new(micros as u32))
}

// Events at the same tick are written in this order. A zero length note has
// its off after the ons so it isn't cut before it starts.
const RANK_NOTE_OFF: u8 = 0;
const RANK_NOTE_ON: u8 = 1;
const RANK_ZERO_LENGTH_OFF: u8 = 2;

struct Scheduled {
    tick: u64,
    rank: u8,
    message: MidiMessage,
}

/// Serializes a timeline as a single track standard MIDI file using the
/// timeline's own tick resolution.
pub fn write_pattern(
    timeline: &Timeline,
    track_name: &str,
    settings: &ConversionSettings,
) -> Result<Vec<u8>, MidiError> {
    let tpqn = timeline.ticks_per_quarter_note();
    let timing = u15::try_from(tpqn).ok_or(MidiError::OutOfRange {
        what: "ticks per quarter note",
        value: u64::from(tpqn),
    })?;
    let channel = u4::try_from(settings.midi_channel()).ok_or(MidiError::OutOfRange {
        what: "channel",
        value: u64::from(settings.midi_channel()),
    })?;
    let tempo = tempo_micros(settings.tempo())?;

    let mut scheduled = Vec::with_capacity(timeline.events().len() * 2);
    for event in timeline.events() {
        let key = u7::try_from(event.pitch).ok_or(MidiError::OutOfRange {
            what: "pitch",
            value: u64::from(event.pitch),
        })?;
        let vel = u7::try_from(settings.velocity_for(event.velocity)).ok_or(
            MidiError::OutOfRange {
                what: "velocity",
                value: u64::from(event.velocity),
            },
        )?;

        scheduled.push(Scheduled {
            tick: event.start_ticks,
            rank: RANK_NOTE_ON,
            message: MidiMessage::NoteOn { key, vel },
        });
        scheduled.push(Scheduled {
            tick: event.start_ticks + u64::from(event.duration_ticks),
            rank: if event.duration_ticks == 0 {
                RANK_ZERO_LENGTH_OFF
            } else {
                RANK_NOTE_OFF
            },
            message: MidiMessage::NoteOff { key, vel: u7::new(0) },
        });
    }
    // Stable, so repeated triggers keep their order.
    scheduled.sort_by_key(|s| (s.tick, s.rank));

    let mut track = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(track_name.as_bytes())),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(tempo)),
        },
    ];

    let mut last_tick = 0;
    for s in scheduled {
        track.push(TrackEvent {
            delta: delta(s.tick - last_tick)?,
            kind: TrackEventKind::Midi {
                channel,
                message: s.message,
            },
        });
        last_tick = s.tick;
    }

    let end = last_tick.max(timeline.elapsed_ticks());
    track.push(TrackEvent {
        delta: delta(end - last_tick)?,
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    debug!(events = track.len(), end_tick = end, "Built MIDI track");

    let smf = Smf {
        header: Header::new(Format::SingleTrack, Timing::Metrical(timing)),
        tracks: vec![track],
    };
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

fn delta(ticks: u64) -> Result<u28, MidiError> {
    u32::try_from(ticks)
        .ok()
        .and_then(u28::try_from)
        .ok_or(MidiError::OutOfRange {
            what: "delta time",
            value: ticks,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Device, VelocityMode};
    use crate::format::NoteRecord;
    use crate::testutil::{note, StubLookup};

    /// Flattens a parsed track into (absolute tick, kind) pairs.
    fn absolute<'a>(smf: &Smf<'a>) -> Vec<(u64, TrackEventKind<'a>)> {
        let mut tick = 0;
        smf.tracks[0]
            .iter()
            .map(|e| {
                tick += u64::from(e.delta.as_int());
                (tick, e.kind)
            })
            .collect()
    }

    fn note_events(events: &[(u64, TrackEventKind)]) -> Vec<(u64, bool, u8, u8)> {
        events
            .iter()
            .filter_map(|(tick, kind)| match kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, vel },
                    ..
                } => Some((*tick, true, key.as_int(), vel.as_int())),
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { key, vel },
                    ..
                } => Some((*tick, false, key.as_int(), vel.as_int())),
                _ => None,
            })
            .collect()
    }

    fn timeline(notes: &[NoteRecord], device: Device) -> Timeline {
        Timeline::assemble(notes, &device.profile(), &mut StubLookup::default()).expect("timeline")
    }

    #[test]
    fn test_write_three_note_pattern() {
        let timeline = timeline(
            &[note(0, 46, 0, 96), note(96, 128, 0, 0), note(48, 57, 1, 48)],
            Device::Sp404sx,
        );
        let settings = ConversionSettings::default().with_tempo(120.0);

        let bytes = write_pattern(&timeline, "Roland SP404SX Pattern A1", &settings).expect("midi");
        let smf = Smf::parse(&bytes).expect("parse");

        assert_eq!(Format::SingleTrack, smf.header.format);
        assert_eq!(Timing::Metrical(u15::new(96)), smf.header.timing);
        assert_eq!(1, smf.tracks.len());

        let events = absolute(&smf);
        assert_eq!(
            TrackEventKind::Meta(MetaMessage::TrackName(&b"Roland SP404SX Pattern A1"[..])),
            events[0].1
        );
        assert_eq!(
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(500_000))),
            events[1].1
        );
        assert_eq!(
            vec![
                (0, true, 36, 100),
                (96, false, 36, 0),
                (96, true, 37, 100),
                (144, false, 37, 0),
            ],
            note_events(&events)
        );
        assert_eq!(
            Some(&(144, TrackEventKind::Meta(MetaMessage::EndOfTrack))),
            events.last()
        );
    }

    #[test]
    fn test_note_off_before_note_on_at_same_tick() {
        let timeline = timeline(
            &[note(96, 47, 0, 96), note(0, 47, 0, 96), note(0, 48, 0, 0)],
            Device::Sp404sx,
        );
        let settings = ConversionSettings::default()
            .with_tempo(90.0)
            .with_velocity(VelocityMode::Recorded);

        let bytes = write_pattern(&timeline, "t", &settings).expect("midi");
        let smf = Smf::parse(&bytes).expect("parse");

        // The first note ends at 96 exactly where the repeat starts.
        assert_eq!(
            vec![
                (0, true, 36, 90),
                (96, false, 36, 0),
                (96, true, 36, 90),
                (96, true, 37, 90),
                (96, false, 37, 0),
                (192, false, 36, 0),
            ],
            note_events(&absolute(&smf))
        );
    }

    #[test]
    fn test_end_of_track_covers_trailing_rests() {
        let timeline = timeline(
            &[note(0, 47, 0, 10), note(200, 128, 0, 0), note(184, 128, 0, 0)],
            Device::Sp404mkii,
        );
        let settings = ConversionSettings::default().with_tempo(100.0);

        let bytes = write_pattern(&timeline, "t", &settings).expect("midi");
        let smf = Smf::parse(&bytes).expect("parse");

        assert_eq!(Timing::Metrical(u15::new(480)), smf.header.timing);
        let events = absolute(&smf);
        assert_eq!(
            Some(&(384, TrackEventKind::Meta(MetaMessage::EndOfTrack))),
            events.last()
        );
    }

    #[test]
    fn test_tempo_micros() {
        assert_eq!(u24::new(500_000), tempo_micros(120.0).expect("tempo"));
        assert_eq!(u24::new(631_579), tempo_micros(95.0).expect("tempo"));
        assert!(matches!(tempo_micros(0.0), Err(MidiError::Tempo(_))));
        assert!(matches!(tempo_micros(1.0), Err(MidiError::Tempo(_))));
    }
}
