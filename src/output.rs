//! CLI output formatting.
//!
//! Every user-facing inventory goes through here. Diagnostics (stage
//! progress, warnings, skipped duplicates) go through `tracing` instead.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Collection
//!     12 items, 15 files
//!     9 remote, 6 in archive
//! ```
//!
//! ## Build
//!
//! ```text
//! Streaming 15 files
//!     001/015 files/intro.mp4
//!         Source: https://example.com/intro.mp4
//!     002/015 files/guide.pdf
//!         Source: raw/guide.pdf (archive)
//!
//! Package → output/test_2024-03.zim
//!     12 items, 15 files (9 downloaded, 6 extracted)
//!     22 entries
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::scraper::{CheckSummary, RunSummary};
use crate::stream::StreamEvent;
use std::error::Error;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(count: usize, word: &str) -> String {
    counted(count, word, &format!("{word}s"))
}

fn counted(count: usize, singular: &str, plural: &str) -> String {
    let word = if count == 1 { singular } else { plural };
    format!("{count} {word}")
}

// ============================================================================
// Check
// ============================================================================

/// Format the result of a successful collection check.
pub fn format_check_summary(summary: &CheckSummary) -> Vec<String> {
    vec![
        "Collection".to_string(),
        format!(
            "    {}, {}",
            plural(summary.items, "item"),
            plural(summary.files, "file")
        ),
        format!("    {} remote, {} in archive", summary.remote, summary.local),
    ]
}

pub fn print_check_summary(summary: &CheckSummary) {
    for line in format_check_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format a single streaming progress event as display lines.
///
/// The package path leads; the source is shown as indented context.
pub fn format_stream_event(event: &StreamEvent) -> Vec<String> {
    match event {
        StreamEvent::Started { total } => vec![format!("Streaming {}", plural(*total, "file"))],
        StreamEvent::FileAdded {
            index,
            total,
            uri,
            package_path,
            remote,
        } => {
            let origin = if *remote { "" } else { " (archive)" };
            vec![
                format!(
                    "    {}/{} {}",
                    format_index(*index),
                    format_index(*total),
                    package_path
                ),
                format!("        Source: {}{}", uri, origin),
            ]
        }
    }
}

/// Format the final report of a successful build.
pub fn format_run_summary(summary: &RunSummary) -> Vec<String> {
    vec![
        String::new(),
        format!("Package → {}", summary.zim_path.display()),
        format!(
            "    {}, {} ({} downloaded, {} extracted)",
            plural(summary.items, "item"),
            plural(summary.stats.total(), "file"),
            summary.stats.downloaded,
            summary.stats.extracted
        ),
        format!("    {}", counted(summary.package_items, "entry", "entries")),
    ]
}

pub fn print_run_summary(summary: &RunSummary) {
    for line in format_run_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Failures
// ============================================================================

/// Format a fatal error. With `debug`, every underlying cause follows.
pub fn format_failure(err: &dyn Error, debug: bool) -> Vec<String> {
    let mut lines = vec![format!("FAILED. An error occurred: {err}")];
    if debug {
        let mut source = err.source();
        while let Some(cause) = source {
            lines.push(format!("    Caused by: {cause}"));
            source = cause.source();
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamStats;
    use std::fmt;
    use std::path::PathBuf;

    #[test]
    fn check_summary_lines() {
        let lines = format_check_summary(&CheckSummary {
            items: 1,
            files: 3,
            remote: 2,
            local: 1,
        });
        assert_eq!(
            lines,
            vec!["Collection", "    1 item, 3 files", "    2 remote, 1 in archive"]
        );
    }

    #[test]
    fn started_event() {
        let lines = format_stream_event(&StreamEvent::Started { total: 1 });
        assert_eq!(lines, vec!["Streaming 1 file"]);
    }

    #[test]
    fn remote_file_event() {
        let lines = format_stream_event(&StreamEvent::FileAdded {
            index: 2,
            total: 15,
            uri: "https://example.com/intro.mp4".into(),
            package_path: "files/intro.mp4".into(),
            remote: true,
        });
        assert_eq!(
            lines,
            vec![
                "    002/015 files/intro.mp4",
                "        Source: https://example.com/intro.mp4",
            ]
        );
    }

    #[test]
    fn archive_file_event_is_marked() {
        let lines = format_stream_event(&StreamEvent::FileAdded {
            index: 1,
            total: 1,
            uri: "raw/guide.pdf".into(),
            package_path: "files/guide.pdf".into(),
            remote: false,
        });
        assert_eq!(lines[1], "        Source: raw/guide.pdf (archive)");
    }

    #[test]
    fn run_summary_lines() {
        let lines = format_run_summary(&RunSummary {
            zim_path: PathBuf::from("output/test.zim"),
            items: 12,
            stats: StreamStats {
                downloaded: 9,
                extracted: 6,
            },
            package_items: 22,
        });
        assert_eq!(lines[1], "Package → output/test.zim");
        assert_eq!(lines[2], "    12 items, 15 files (9 downloaded, 6 extracted)");
        assert_eq!(lines[3], "    22 entries");
    }

    #[derive(Debug)]
    struct Layered(&'static str, Option<Box<Layered>>);

    impl fmt::Display for Layered {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Error for Layered {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            self.1.as_deref().map(|e| e as &(dyn Error + 'static))
        }
    }

    #[test]
    fn failure_hides_causes_without_debug() {
        let err = Layered("outer", Some(Box::new(Layered("inner", None))));
        assert_eq!(
            format_failure(&err, false),
            vec!["FAILED. An error occurred: outer"]
        );
    }

    #[test]
    fn failure_lists_causes_with_debug() {
        let err = Layered("outer", Some(Box::new(Layered("inner", None))));
        assert_eq!(
            format_failure(&err, true),
            vec!["FAILED. An error occurred: outer", "    Caused by: inner"]
        );
    }
}
