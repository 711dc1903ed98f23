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

/// Extracts a displayable file name from a path, returning a fallback if the name is unreadable.
pub fn filename_display(path: &Path) -> &str {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Outputs a tick count as beats with millibeat precision.
pub fn beats_display(ticks: u64, ticks_per_quarter_note: u16) -> String {
    format!("{:.3}", ticks as f64 / f64::from(ticks_per_quarter_note.max(1)))
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use crate::util::{beats_display, filename_display};

    #[test]
    fn test_filename_display() {
        assert_eq!("PAD_INFO.BIN", filename_display(Path::new("SMPL/PAD_INFO.BIN")));
        assert_eq!("unreadable file name", filename_display(Path::new("/")));
    }

    #[test]
    fn test_beats_display() {
        assert_eq!("0.000", beats_display(0, 96));
        assert_eq!("1.500", beats_display(144, 96));
        assert_eq!("0.250", beats_display(120, 480));
    }
}
