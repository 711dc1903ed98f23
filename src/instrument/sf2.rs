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

//! A SoundFont 2 writer for a single preset holding one instrument.
//!
//! Every region becomes one zone keyed to its pitch, or two zones panned hard
//! left and right when the clip is stereo. The sample data is embedded as
//! 16-bit PCM.

use tracing::{debug, warn};

use super::InstrumentRegion;

/// Zero samples that must follow each sample in the smpl chunk.
const SAMPLE_PADDING: usize = 46;

const NAME_SIZE: usize = 20;

const PRESET_HEADER_SIZE: usize = 38;
const INSTRUMENT_HEADER_SIZE: usize = 22;
const SAMPLE_HEADER_SIZE: usize = 46;
const BAG_SIZE: usize = 4;
const MODULATOR_SIZE: usize = 10;
const GENERATOR_SIZE: usize = 4;

// Generator operators.
const GEN_PAN: u16 = 17;
const GEN_INSTRUMENT: u16 = 41;
const GEN_KEY_RANGE: u16 = 43;
const GEN_INITIAL_ATTENUATION: u16 = 48;
const GEN_SAMPLE_ID: u16 = 53;
const GEN_SAMPLE_MODES: u16 = 54;
const GEN_OVERRIDING_ROOT_KEY: u16 = 58;

const SAMPLE_TYPE_MONO: u16 = 1;
const SAMPLE_TYPE_RIGHT: u16 = 2;
const SAMPLE_TYPE_LEFT: u16 = 4;

/// Pan in tenths of a percent.
const PAN_LEFT: i16 = -500;
const PAN_RIGHT: i16 = 500;

const LOOP_CONTINUOUS: i16 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SoundFontError {
    #[error("{0} sample points don't fit in a SoundFont")]
    TooManySamplePoints(usize),

    #[error("{what} count {count} doesn't fit in a SoundFont")]
    TooMany { what: &'static str, count: usize },
}

/// A generator as it's stored in a pgen or igen record.
#[derive(Debug, Clone, Copy)]
struct Generator {
    oper: u16,
    amount: [u8; 2],
}

impl Generator {
    fn signed(oper: u16, value: i16) -> Self {
        Generator {
            oper,
            amount: value.to_le_bytes(),
        }
    }

    fn unsigned(oper: u16, value: u16) -> Self {
        Generator {
            oper,
            amount: value.to_le_bytes(),
        }
    }

    fn range(oper: u16, lo: u8, hi: u8) -> Self {
        Generator {
            oper,
            amount: [lo, hi],
        }
    }
}

struct SampleHeader {
    name: String,
    start: u32,
    end: u32,
    start_loop: u32,
    end_loop: u32,
    sample_rate: u32,
    original_pitch: u8,
    link: u16,
    sample_type: u16,
}

/// Accumulates the sample data and the hydra records.
#[derive(Default)]
struct Builder {
    points: Vec<i16>,
    samples: Vec<SampleHeader>,
    /// The generator index each instrument zone starts at.
    zones: Vec<usize>,
    generators: Vec<Generator>,
}

impl Builder {
    /// Appends sample data and returns the new sample's index.
    fn add_sample(
        &mut self,
        name: String,
        data: Vec<i16>,
        region: &InstrumentRegion,
        sample_type: u16,
    ) -> Result<usize, SoundFontError> {
        let start = self.points.len();
        self.points.extend(data);
        let end = self.points.len();
        self.points.resize(end + SAMPLE_PADDING, 0);

        let start = to_u32(start)?;
        let end = to_u32(end)?;
        self.samples.push(SampleHeader {
            name,
            start,
            end,
            start_loop: start,
            end_loop: end,
            sample_rate: region.clip.sample_rate(),
            original_pitch: region.pitch,
            link: 0,
            sample_type,
        });
        Ok(self.samples.len() - 1)
    }

    /// Adds an instrument zone. The key range comes first and the sample ID
    /// last, as readers expect.
    fn add_zone(
        &mut self,
        region: &InstrumentRegion,
        sample: usize,
        pan: Option<i16>,
    ) -> Result<(), SoundFontError> {
        let sample = to_u16("sample", sample)?;

        self.zones.push(self.generators.len());
        let generators = &mut self.generators;
        generators.push(Generator::range(GEN_KEY_RANGE, region.pitch, region.pitch));
        if let Some(pan) = pan {
            generators.push(Generator::signed(GEN_PAN, pan));
        }
        if let Some(attenuation) = attenuation_centibels(region) {
            generators.push(Generator::signed(GEN_INITIAL_ATTENUATION, attenuation));
        }
        if region.pad.looping {
            generators.push(Generator::signed(GEN_SAMPLE_MODES, LOOP_CONTINUOUS));
        }
        generators.push(Generator::signed(
            GEN_OVERRIDING_ROOT_KEY,
            i16::from(region.pitch),
        ));
        generators.push(Generator::unsigned(GEN_SAMPLE_ID, sample));
        Ok(())
    }

    fn add_region(&mut self, region: &InstrumentRegion) -> Result<(), SoundFontError> {
        let base = format!("{:03}_{}", region.pitch, region.stem);
        let reverse = |mut data: Vec<i16>| {
            if region.pad.reverse {
                data.reverse();
            }
            data
        };

        match region.clip.channels() {
            0 => {
                warn!(pitch = region.pitch, "Skipping clip without channels");
            }
            1 => {
                let data = reverse(region.clip.channel_i16(0));
                let sample = self.add_sample(base, data, region, SAMPLE_TYPE_MONO)?;
                self.add_zone(region, sample, None)?;
            }
            channels => {
                if channels > 2 {
                    warn!(pitch = region.pitch, channels, "Only the first two channels are kept");
                }
                let left_data = reverse(region.clip.channel_i16(0));
                let right_data = reverse(region.clip.channel_i16(1));
                let left =
                    self.add_sample(format!("{base}L"), left_data, region, SAMPLE_TYPE_LEFT)?;
                let right =
                    self.add_sample(format!("{base}R"), right_data, region, SAMPLE_TYPE_RIGHT)?;
                self.samples[left].link = to_u16("sample", right)?;
                self.samples[right].link = to_u16("sample", left)?;
                self.add_zone(region, left, Some(PAN_LEFT))?;
                self.add_zone(region, right, Some(PAN_RIGHT))?;
            }
        }
        Ok(())
    }
}

/// Initial attenuation for the pad volume, in centibels.
fn attenuation_centibels(region: &InstrumentRegion) -> Option<i16> {
    let db = region.volume_db()?;
    let centibels = (-db * 10.0).round();
    if centibels <= 0.0 {
        return None;
    }
    Some(centibels.min(1440.0) as i16)
}

fn to_u32(value: usize) -> Result<u32, SoundFontError> {
    u32::try_from(value).map_err(|_| SoundFontError::TooManySamplePoints(value))
}

fn to_u16(what: &'static str, count: usize) -> Result<u16, SoundFontError> {
    u16::try_from(count).map_err(|_| SoundFontError::TooMany { what, count })
}

/// Writes a fixed size, zero terminated name field.
fn put_name(out: &mut Vec<u8>, name: &str) {
    let mut field = [0u8; NAME_SIZE];
    let bytes: Vec<u8> = name.bytes().filter(u8::is_ascii).take(NAME_SIZE - 1).collect();
    field[..bytes.len()].copy_from_slice(&bytes);
    out.extend_from_slice(&field);
}

/// A zero terminated string padded to an even length.
fn zstr(text: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = text.bytes().filter(u8::is_ascii).collect();
    bytes.push(0);
    if bytes.len() % 2 != 0 {
        bytes.push(0);
    }
    bytes
}

fn chunk(id: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + data.len() + 1);
    out.extend_from_slice(id);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    if data.len() % 2 != 0 {
        out.push(0);
    }
    out
}

fn list(kind: &[u8; 4], chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut data = kind.to_vec();
    for c in chunks {
        data.extend_from_slice(c);
    }
    chunk(b"LIST", &data)
}

fn put_bag(out: &mut Vec<u8>, generator: u16, modulator: u16) {
    out.extend_from_slice(&generator.to_le_bytes());
    out.extend_from_slice(&modulator.to_le_bytes());
}

fn put_generator(out: &mut Vec<u8>, generator: Generator) {
    out.extend_from_slice(&generator.oper.to_le_bytes());
    out.extend_from_slice(&generator.amount);
}

/// Builds a SoundFont 2 bank with a single preset named `name`.
pub fn write_soundfont(
    name: &str,
    regions: &[InstrumentRegion],
) -> Result<Vec<u8>, SoundFontError> {
    let mut builder = Builder::default();
    for region in regions {
        builder.add_region(region)?;
    }
    let zone_count = to_u16("zone", builder.zones.len())?;
    let generator_count = to_u16("generator", builder.generators.len())?;

    // Preset: one bag holding one generator pointing at instrument 0.
    let mut phdr = Vec::with_capacity(PRESET_HEADER_SIZE * 2);
    put_name(&mut phdr, name);
    phdr.extend_from_slice(&0u16.to_le_bytes()); // preset
    phdr.extend_from_slice(&0u16.to_le_bytes()); // bank
    phdr.extend_from_slice(&0u16.to_le_bytes()); // bag
    phdr.extend_from_slice(&[0u8; 12]); // library, genre, morphology
    put_name(&mut phdr, "EOP");
    phdr.extend_from_slice(&0u16.to_le_bytes());
    phdr.extend_from_slice(&0u16.to_le_bytes());
    phdr.extend_from_slice(&1u16.to_le_bytes());
    phdr.extend_from_slice(&[0u8; 12]);

    let mut pbag = Vec::with_capacity(BAG_SIZE * 2);
    put_bag(&mut pbag, 0, 0);
    put_bag(&mut pbag, 1, 0);

    let pmod = vec![0u8; MODULATOR_SIZE];

    let mut pgen = Vec::with_capacity(GENERATOR_SIZE * 2);
    put_generator(&mut pgen, Generator::unsigned(GEN_INSTRUMENT, 0));
    pgen.extend_from_slice(&[0u8; GENERATOR_SIZE]);

    let mut inst = Vec::with_capacity(INSTRUMENT_HEADER_SIZE * 2);
    put_name(&mut inst, name);
    inst.extend_from_slice(&0u16.to_le_bytes());
    put_name(&mut inst, "EOI");
    inst.extend_from_slice(&zone_count.to_le_bytes());

    let mut ibag = Vec::with_capacity(BAG_SIZE * (builder.zones.len() + 1));
    for start in &builder.zones {
        put_bag(&mut ibag, *start as u16, 0);
    }
    put_bag(&mut ibag, generator_count, 0);

    let imod = vec![0u8; MODULATOR_SIZE];

    let mut igen = Vec::with_capacity(GENERATOR_SIZE * (builder.generators.len() + 1));
    for generator in &builder.generators {
        put_generator(&mut igen, *generator);
    }
    igen.extend_from_slice(&[0u8; GENERATOR_SIZE]);

    let mut shdr = Vec::with_capacity(SAMPLE_HEADER_SIZE * (builder.samples.len() + 1));
    for sample in &builder.samples {
        put_name(&mut shdr, &sample.name);
        shdr.extend_from_slice(&sample.start.to_le_bytes());
        shdr.extend_from_slice(&sample.end.to_le_bytes());
        shdr.extend_from_slice(&sample.start_loop.to_le_bytes());
        shdr.extend_from_slice(&sample.end_loop.to_le_bytes());
        shdr.extend_from_slice(&sample.sample_rate.to_le_bytes());
        shdr.push(sample.original_pitch);
        shdr.push(0); // pitch correction
        shdr.extend_from_slice(&sample.link.to_le_bytes());
        shdr.extend_from_slice(&sample.sample_type.to_le_bytes());
    }
    put_name(&mut shdr, "EOS");
    shdr.extend_from_slice(&[0u8; SAMPLE_HEADER_SIZE - NAME_SIZE]);

    let smpl: Vec<u8> = builder.points.iter().flat_map(|p| p.to_le_bytes()).collect();

    let info = list(
        b"INFO",
        &[
            chunk(b"ifil", &[2, 0, 1, 0]),
            chunk(b"isng", &zstr("EMU8000")),
            chunk(b"INAM", &zstr(name)),
        ],
    );
    let sdta = list(b"sdta", &[chunk(b"smpl", &smpl)]);
    let pdta = list(
        b"pdta",
        &[
            chunk(b"phdr", &phdr),
            chunk(b"pbag", &pbag),
            chunk(b"pmod", &pmod),
            chunk(b"pgen", &pgen),
            chunk(b"inst", &inst),
            chunk(b"ibag", &ibag),
            chunk(b"imod", &imod),
            chunk(b"igen", &igen),
            chunk(b"shdr", &shdr),
        ],
    );

    let mut body = b"sfbk".to_vec();
    body.extend_from_slice(&info);
    body.extend_from_slice(&sdta);
    body.extend_from_slice(&pdta);

    debug!(
        samples = builder.samples.len(),
        zones = builder.zones.len(),
        points = builder.points.len(),
        "Built SoundFont"
    );
    Ok(chunk(b"RIFF", &body))
}
