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

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::timeline::{SkipReason, SkippedNote};

pub const CATEGORY_MISSING_SAMPLE: &str = "missing-sample";
pub const CATEGORY_PITCH_RANGE: &str = "pitch-range";
pub const CATEGORY_TRIM: &str = "trim";
pub const CATEGORY_SAMPLE_READ: &str = "sample-read";
pub const CATEGORY_BAR_COUNT: &str = "bar-count";

/// Severity level for a conversion issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Something that was skipped or worked around during a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub category: &'static str,
    /// What the issue is about, e.g. "note 4" or "pad 13".
    pub subject: String,
    pub message: String,
}

impl Issue {
    pub fn warning(category: &'static str, subject: String, message: String) -> Issue {
        Issue {
            severity: Severity::Warning,
            category,
            subject,
            message,
        }
    }

    pub fn error(category: &'static str, subject: String, message: String) -> Issue {
        Issue {
            severity: Severity::Error,
            category,
            subject,
            message,
        }
    }

    /// The issue for a note the timeline had to drop.
    pub fn skipped_note(skipped: &SkippedNote) -> Issue {
        let subject = format!("note {}", skipped.note);
        match &skipped.reason {
            SkipReason::Missing(e) => Issue::warning(
                CATEGORY_MISSING_SAMPLE,
                subject,
                format!("pad {}: {}", skipped.index, e),
            ),
            SkipReason::NoPitchAvailable => Issue::error(
                CATEGORY_PITCH_RANGE,
                subject,
                format!("pad {} needs a pitch above 127", skipped.index),
            ),
        }
    }
}

/// The outcome of a conversion that ran to completion.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    pub issues: Vec<Issue>,
    /// Files written to the output directory.
    pub outputs: Vec<PathBuf>,
    /// Notes in the pattern, rests included.
    pub notes: usize,
    pub rests: usize,
    /// Notes written to the MIDI file.
    pub events: usize,
    /// Samples in the instrument map.
    pub samples: usize,
}

impl ConversionReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Notes that didn't make it into the MIDI file for a reason other than
    /// being a rest.
    pub fn skipped_notes(&self) -> usize {
        self.notes - self.rests - self.events
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }
}

/// Prints a report grouped by category.
pub fn print_report(report: &ConversionReport) {
    println!(
        "{} note(s), {} rest(s), {} written, {} skipped, {} sample(s)",
        report.notes,
        report.rests,
        report.events,
        report.skipped_notes(),
        report.samples
    );

    let mut by_category: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
    for issue in &report.issues {
        by_category.entry(issue.category).or_default().push(issue);
    }
    for (category, issues) in &by_category {
        println!("[{}] {} issue(s)", category, issues.len());
        for issue in issues {
            let severity_icon = match issue.severity {
                Severity::Warning => "\u{26a0}\u{fe0f} ",
                Severity::Error => "\u{274c}",
            };
            println!("   {} {}: {}", severity_icon, issue.subject, issue.message);
        }
    }

    for output in &report.outputs {
        println!("\u{2705} {}", output.display());
    }
}
