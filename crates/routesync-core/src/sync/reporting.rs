//! Sync operation reporting

use std::fmt::Write;

use super::SyncResult;
use crate::comparison::{ChangeEntry, ChangeKind, ChangeSet};

/// Summarises apply results
pub struct SyncReporter;

impl SyncReporter {
    /// Generate a summary report
    #[must_use]
    pub fn generate_summary(result: &SyncResult) -> String {
        let mut output = String::new();

        let title = if result.dry_run {
            "Sync Summary (dry run)"
        } else {
            "Sync Summary"
        };
        let _ = writeln!(output, "\n=== {title} ===");
        let _ = writeln!(output, "Applied:  {}", result.applied_count);
        let _ = writeln!(output, "Skipped:  {}", result.skipped_count);
        let _ = writeln!(output, "Failed:   {}", result.failures.len());

        if !result.failures.is_empty() {
            let _ = writeln!(output, "\nFailures ({}):", result.failures.len());
            for failure in &result.failures {
                let _ = writeln!(output, "  - {}: {}", failure.target_path, failure.reason);
            }
        }

        let _ = writeln!(output, "\nTotal entries: {}", result.total());

        if result.is_success() {
            output.push_str("Status: ✓ Success\n");
        } else {
            output.push_str("Status: ✗ Completed with failures\n");
        }

        output
    }
}

/// Renders change sets one entry per line
pub struct ChangeSetReporter;

impl ChangeSetReporter {
    /// Status line for one entry, e.g. `M  docs/guide.md (+3 -1)`
    #[must_use]
    pub fn entry_line(entry: &ChangeEntry) -> String {
        let mut line = format!("{}  {}", entry.kind.status_char(), entry.target_path);

        if let Some(source) = &entry.source_path {
            if *source != entry.target_path {
                let _ = write!(line, " <- {source}");
            }
        }
        if let Some(diff) = &entry.content_diff {
            let _ = write!(line, " (+{} -{})", diff.insertions, diff.deletions);
        }
        if entry.binary {
            line.push_str(" [binary]");
        }
        if entry.truncated {
            line.push_str(" [too large to diff]");
        }
        line
    }

    /// Listing of a change set, hiding unchanged entries unless `show_unchanged`
    #[must_use]
    pub fn render(change_set: &ChangeSet, show_unchanged: bool, show_hunks: bool) -> String {
        let mut output = String::new();

        for entry in &change_set.entries {
            if entry.kind == ChangeKind::Unchanged && !show_unchanged {
                continue;
            }
            output.push_str(&Self::entry_line(entry));
            output.push('\n');

            if show_hunks {
                if let Some(diff) = &entry.content_diff {
                    let _ = write!(output, "{diff}");
                }
            }
        }

        for conflict in &change_set.conflicts {
            let sources: Vec<String> = conflict.sources.iter().map(ToString::to_string).collect();
            let _ = writeln!(
                output,
                "!  {} claimed by {} (using {})",
                conflict.target_path,
                sources.join(", "),
                conflict.winner()
            );
        }

        let counts = change_set.counts();
        let _ = writeln!(
            output,
            "\n{} added, {} modified, {} deleted, {} unchanged",
            counts.added, counts.modified, counts.deleted, counts.unchanged
        );
        if !change_set.warnings.is_empty() {
            let _ = writeln!(output, "{} unreadable entries skipped", change_set.warnings.len());
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ContentDiff;
    use crate::path::RelativePath;
    use crate::sync::SyncFailure;

    fn entry(target: &str, kind: ChangeKind, source: Option<&str>) -> ChangeEntry {
        ChangeEntry {
            target_path: RelativePath::parse(target).unwrap(),
            kind,
            source_path: source.map(|s| RelativePath::parse(s).unwrap()),
            content_diff: None,
            delta: None,
            binary: false,
            truncated: false,
        }
    }

    #[test]
    fn test_sync_reporter() {
        let result = SyncResult {
            applied_count: 5,
            skipped_count: 2,
            ..SyncResult::default()
        };

        let summary = SyncReporter::generate_summary(&result);

        assert!(summary.contains("Applied:  5"));
        assert!(summary.contains("Skipped:  2"));
        assert!(summary.contains("Total entries: 7"));
        assert!(summary.contains("✓ Success"));
    }

    #[test]
    fn test_sync_reporter_with_failures() {
        let result = SyncResult {
            applied_count: 1,
            failures: vec![SyncFailure {
                target_path: RelativePath::parse("dist/a.ts").unwrap(),
                reason: "permission denied".to_string(),
            }],
            ..SyncResult::default()
        };

        let summary = SyncReporter::generate_summary(&result);

        assert!(summary.contains("Failures (1)"));
        assert!(summary.contains("dist/a.ts: permission denied"));
        assert!(summary.contains("✗ Completed with failures"));
    }

    #[test]
    fn test_entry_lines() {
        assert_eq!(
            ChangeSetReporter::entry_line(&entry("a.ts", ChangeKind::Added, Some("a.ts"))),
            "A  a.ts"
        );
        assert_eq!(
            ChangeSetReporter::entry_line(&entry("dist/a.ts", ChangeKind::Added, Some("src/a.ts"))),
            "A  dist/a.ts <- src/a.ts"
        );

        let mut modified = entry("notes.md", ChangeKind::Modified, Some("notes.md"));
        modified.content_diff = Some(ContentDiff::compute("a\n", "b\nc\n", 3));
        assert_eq!(ChangeSetReporter::entry_line(&modified), "M  notes.md (+2 -1)");

        let mut binary = entry("logo.png", ChangeKind::Modified, Some("logo.png"));
        binary.binary = true;
        assert!(ChangeSetReporter::entry_line(&binary).ends_with("[binary]"));

        assert_eq!(
            ChangeSetReporter::entry_line(&entry("old.txt", ChangeKind::Deleted, None)),
            "D  old.txt"
        );
    }
}
