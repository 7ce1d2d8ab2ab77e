//! Text detection and line-level hunks

use std::fmt;

use similar::{Algorithm, ChangeTag, TextDiff};

/// Whether a buffer looks like text: no NUL byte within the first `sniff_len` bytes
#[must_use]
pub fn is_text(bytes: &[u8], sniff_len: usize) -> bool {
    let prefix = &bytes[..bytes.len().min(sniff_len)];
    !prefix.contains(&0)
}

/// Role of one line inside a hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    /// Present on both sides
    Context,
    /// Only in the source (would be written)
    Added,
    /// Only in the current target (would be replaced)
    Removed,
}

impl LineTag {
    const fn sign(self) -> char {
        match self {
            Self::Context => ' ',
            Self::Added => '+',
            Self::Removed => '-',
        }
    }
}

/// A line inside a hunk, without its line terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// Role of the line
    pub tag: LineTag,
    /// Line text
    pub text: String,
}

/// A contiguous group of changed lines with surrounding context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Zero-based first line in the current target
    pub old_start: usize,
    /// Number of target lines covered
    pub old_len: usize,
    /// Zero-based first line in the source
    pub new_start: usize,
    /// Number of source lines covered
    pub new_len: usize,
    /// Lines in order
    pub lines: Vec<DiffLine>,
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{} +{} @@",
            UnifiedRange(self.old_start, self.old_len),
            UnifiedRange(self.new_start, self.new_len)
        )?;
        for line in &self.lines {
            writeln!(f, "{}{}", line.tag.sign(), line.text)?;
        }
        Ok(())
    }
}

struct UnifiedRange(usize, usize);

impl fmt::Display for UnifiedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            0 => write!(f, "{},0", self.0),
            1 => write!(f, "{}", self.0 + 1),
            len => write!(f, "{},{len}", self.0 + 1),
        }
    }
}

/// Line-level difference between the current target and the source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentDiff {
    /// Hunks in file order
    pub hunks: Vec<Hunk>,
    /// Lines only in the source
    pub insertions: usize,
    /// Lines only in the target
    pub deletions: usize,
}

impl ContentDiff {
    /// Compute hunks with `context` unchanged lines around each change
    ///
    /// `old` is the current target content, `new` the source content.
    #[must_use]
    pub fn compute(old: &str, new: &str, context: usize) -> Self {
        let diff = TextDiff::configure()
            .algorithm(Algorithm::Lcs)
            .diff_lines(old, new);

        let mut result = Self::default();
        for group in diff.grouped_ops(context) {
            let (Some(first), Some(last)) = (group.first(), group.last()) else {
                continue;
            };

            let old_start = first.old_range().start;
            let new_start = first.new_range().start;
            let mut hunk = Hunk {
                old_start,
                old_len: last.old_range().end - old_start,
                new_start,
                new_len: last.new_range().end - new_start,
                lines: Vec::new(),
            };

            for op in &group {
                for change in diff.iter_changes(op) {
                    let tag = match change.tag() {
                        ChangeTag::Equal => LineTag::Context,
                        ChangeTag::Insert => {
                            result.insertions += 1;
                            LineTag::Added
                        }
                        ChangeTag::Delete => {
                            result.deletions += 1;
                            LineTag::Removed
                        }
                    };
                    hunk.lines.push(DiffLine {
                        tag,
                        text: change
                            .value()
                            .trim_end_matches('\n')
                            .trim_end_matches('\r')
                            .to_string(),
                    });
                }
            }

            result.hunks.push(hunk);
        }

        result
    }

    /// Whether the two sides had identical lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

impl fmt::Display for ContentDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for hunk in &self.hunks {
            write!(f, "{hunk}")?;
        }
        Ok(())
    }
}
