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

//! Conversion of a pad's stored trim points into PCM frame offsets.
//!
//! The device stores user trim points as byte offsets into 16-bit PCM with a
//! fixed 512 unit bias. Both constants are exact.

use std::ops::Range;

use crate::format::PadRecord;

/// Bias baked into the device's trim point encoding.
pub const TRIM_BIAS: i64 = 512;

/// Trim points count bytes of 16-bit PCM.
pub const BYTES_PER_FRAME: i64 = 2;

/// Frame offsets computed from a pad's trim points, before any validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimPoints {
    pub start_frame: i64,
    pub end_frame: i64,
}

impl TrimPoints {
    /// `(user_start - 512) / 2` and `(user_end - 512) / 2`, rounding down.
    pub fn from_pad(pad: &PadRecord) -> TrimPoints {
        TrimPoints {
            start_frame: (i64::from(pad.user_start) - TRIM_BIAS).div_euclid(BYTES_PER_FRAME),
            end_frame: (i64::from(pad.user_end) - TRIM_BIAS).div_euclid(BYTES_PER_FRAME),
        }
    }
}

/// Why a pad's trim points can't be used as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTrimWindow {
    #[error("trim points {user_start}..{user_end} don't land on 16-bit frame boundaries")]
    Misaligned { user_start: u32, user_end: u32 },

    #[error("trim window starts before the sample ({start}..{end})")]
    Negative { start: i64, end: i64 },

    #[error("trim window is empty at frame {0}")]
    Empty(i64),

    #[error("trim window is inverted ({start}..{end})")]
    Inverted { start: i64, end: i64 },
}

/// The portion of a sample to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimWindow {
    /// A frame range, end exclusive.
    Frames { start: u64, end: u64 },
    /// The whole sample.
    Untrimmed,
}

impl TrimWindow {
    /// Computes the trim window for a pad. Callers recover from an error by
    /// using [`TrimWindow::Untrimmed`].
    pub fn for_pad(pad: &PadRecord) -> Result<TrimWindow, InvalidTrimWindow> {
        let start_bytes = i64::from(pad.user_start) - TRIM_BIAS;
        let end_bytes = i64::from(pad.user_end) - TRIM_BIAS;
        if start_bytes.rem_euclid(BYTES_PER_FRAME) != 0 || end_bytes.rem_euclid(BYTES_PER_FRAME) != 0
        {
            return Err(InvalidTrimWindow::Misaligned {
                user_start: pad.user_start,
                user_end: pad.user_end,
            });
        }

        let TrimPoints {
            start_frame,
            end_frame,
        } = TrimPoints::from_pad(pad);
        if start_frame < 0 || end_frame < 0 {
            return Err(InvalidTrimWindow::Negative {
                start: start_frame,
                end: end_frame,
            });
        }
        if start_frame == end_frame {
            return Err(InvalidTrimWindow::Empty(start_frame));
        }
        if end_frame < start_frame {
            return Err(InvalidTrimWindow::Inverted {
                start: start_frame,
                end: end_frame,
            });
        }

        Ok(TrimWindow::Frames {
            start: start_frame as u64,
            end: end_frame as u64,
        })
    }

    /// The frame range to extract from a sample of `frame_count` frames. The
    /// end is clamped to the sample length; a window that starts past the end
    /// of the sample falls back to the whole sample.
    pub fn frames(&self, frame_count: u64) -> Range<u64> {
        match *self {
            TrimWindow::Frames { start, end } => {
                let end = end.min(frame_count);
                if start >= end {
                    0..frame_count
                } else {
                    start..end
                }
            }
            TrimWindow::Untrimmed => 0..frame_count,
        }
    }
}
