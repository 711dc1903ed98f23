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
use super::InstrumentRegion;

/// Renders an SFZ region list. Sample paths are relative to `sample_dir`,
/// which is itself relative to the SFZ file.
pub fn render_sfz(title: &str, sample_dir: &str, regions: &[InstrumentRegion]) -> String {
    let mut sfz = String::new();
    sfz.push_str(&format!("// {}\n\n", title));
    sfz.push_str("<control>\n");
    sfz.push_str(&format!("default_path={}/\n\n", sample_dir.replace('\\', "/")));
    sfz.push_str("<group>\n");

    for region in regions {
        sfz.push_str("\n<region>\n");
        sfz.push_str(&format!("sample={}\n", region.sample_file_name()));
        sfz.push_str(&format!("key={}\n", region.pitch));

        if region.pad.looping {
            let frames = region.clip.frame_count();
            sfz.push_str("loop_mode=loop_continuous\n");
            sfz.push_str("loop_start=0\n");
            sfz.push_str(&format!("loop_end={}\n", frames.saturating_sub(1)));
        } else if region.pad.gate {
            sfz.push_str("loop_mode=no_loop\n");
        } else {
            sfz.push_str("loop_mode=one_shot\n");
        }

        if region.pad.reverse {
            sfz.push_str("direction=reverse\n");
        }
        if let Some(volume) = region.volume_db() {
            sfz.push_str(&format!("volume={volume:.2}\n"));
        }
    }

    sfz
}
