//! Target path templates
//!
//! A template is filled positionally with the captures of the source glob.
//! `*`, `?` and whole-segment `**` are placeholders; everything else is
//! literal.

use crate::error::{Error, Result};
use crate::path::RelativePath;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Whole-segment `**`, may expand to zero or more segments
    Recursive,
    Pieces(Vec<Piece>),
}

/// Compiled target side of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TargetTemplate {
    /// Empty target: keep the source path
    Identity,
    /// Wildcard-free target ending in `/`: place the source path under it
    Prefix(RelativePath),
    /// Positional template
    Pattern {
        /// Template text as written
        raw: String,
        /// Parsed segments
        segments: Vec<Segment>,
        /// Number of placeholders
        wildcards: usize,
    },
}

impl TargetTemplate {
    /// Parse a target template
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if a `**` is not a whole segment, an
    /// escape dangles, or a prefix target leaves the repository root.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.split('/').all(|s| s.is_empty() || s == ".") {
            return Ok(Self::Identity);
        }

        let mut segments = Vec::new();
        let mut wildcards = 0;
        for segment in trimmed.split('/').filter(|s| !s.is_empty() && *s != ".") {
            if segment == "**" {
                segments.push(Segment::Recursive);
                wildcards += 1;
                continue;
            }
            let pieces = parse_pieces(raw, segment)?;
            wildcards += pieces.iter().filter(|p| **p == Piece::Wildcard).count();
            segments.push(Segment::Pieces(pieces));
        }

        if wildcards == 0 && trimmed.ends_with('/') {
            let prefix = RelativePath::parse(trimmed).ok_or_else(|| {
                Error::invalid_pattern(raw, "target prefix must stay inside the repository")
            })?;
            return Ok(Self::Prefix(prefix));
        }

        Ok(Self::Pattern {
            raw: raw.to_string(),
            segments,
            wildcards,
        })
    }

    /// Placeholder count, `None` when the template takes the whole source path
    #[must_use]
    pub const fn wildcards(&self) -> Option<usize> {
        match self {
            Self::Identity | Self::Prefix(_) => None,
            Self::Pattern { wildcards, .. } => Some(*wildcards),
        }
    }

    /// Fill the template for one matched path
    ///
    /// The error string says why the template cannot be filled; the caller
    /// attaches the rule index.
    pub fn render(
        &self,
        source: &RelativePath,
        captures: &[String],
    ) -> std::result::Result<RelativePath, String> {
        let (raw, segments, wildcards) = match self {
            Self::Identity => return Ok(source.clone()),
            Self::Prefix(prefix) => return Ok(source.prefixed(prefix)),
            Self::Pattern {
                raw,
                segments,
                wildcards,
            } => (raw, segments, *wildcards),
        };

        if captures.len() != wildcards {
            return Err(format!(
                "target pattern '{raw}' has {wildcards} wildcard(s) but the source pattern has {}",
                captures.len()
            ));
        }

        let mut values = captures.iter();
        let mut rendered = Vec::with_capacity(segments.len());
        for segment in segments {
            match segment {
                Segment::Recursive => {
                    if let Some(value) = values.next() {
                        rendered.push(value.clone());
                    }
                }
                Segment::Pieces(pieces) => {
                    let mut text = String::new();
                    for piece in pieces {
                        match piece {
                            Piece::Literal(literal) => text.push_str(literal),
                            Piece::Wildcard => {
                                if let Some(value) = values.next() {
                                    text.push_str(value);
                                }
                            }
                        }
                    }
                    rendered.push(text);
                }
            }
        }

        let joined = rendered.join("/");
        RelativePath::parse(&joined)
            .ok_or_else(|| format!("rendered target '{joined}' is not a path inside the target repository"))
    }
}

fn parse_pieces(raw: &str, segment: &str) -> Result<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = segment.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' | '?' => {
                if c == '*' && chars.peek() == Some(&'*') {
                    return Err(Error::invalid_pattern(raw, "`**` must be a whole path segment"));
                }
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(Piece::Wildcard);
            }
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| Error::invalid_pattern(raw, "dangling escape"))?;
                literal.push(escaped);
            }
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }

    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> RelativePath {
        RelativePath::parse(raw).unwrap()
    }

    fn caps(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_identity_and_prefix() {
        assert_eq!(TargetTemplate::parse("").unwrap(), TargetTemplate::Identity);
        assert_eq!(TargetTemplate::parse("./").unwrap(), TargetTemplate::Identity);

        let prefix = TargetTemplate::parse("vendor/lib/").unwrap();
        assert_eq!(prefix.wildcards(), None);
        assert_eq!(
            prefix.render(&path("src/a.ts"), &caps(&["a"])).unwrap(),
            "vendor/lib/src/a.ts"
        );
    }

    #[test]
    fn test_positional_substitution() {
        let template = TargetTemplate::parse("dist/**/*.ts").unwrap();
        assert_eq!(template.wildcards(), Some(2));

        let rendered = template.render(&path("src/a/b.ts"), &caps(&["a", "b"])).unwrap();
        assert_eq!(rendered, "dist/a/b.ts");
    }

    #[test]
    fn test_empty_recursive_capture_collapses() {
        let template = TargetTemplate::parse("dist/**/*.js").unwrap();
        let rendered = template.render(&path("src/b.ts"), &caps(&["", "b"])).unwrap();
        assert_eq!(rendered, "dist/b.js");
    }

    #[test]
    fn test_arity_mismatch_reported() {
        let template = TargetTemplate::parse("dist/*.ts").unwrap();
        let err = template
            .render(&path("src/a/b.ts"), &caps(&["a", "b"]))
            .unwrap_err();
        assert!(err.contains("1 wildcard(s)"));
        assert!(err.contains("has 2"));
    }

    #[test]
    fn test_literal_rename_without_wildcards() {
        let template = TargetTemplate::parse("docs/README.md").unwrap();
        assert_eq!(template.wildcards(), Some(0));
        assert_eq!(
            template.render(&path("README.md"), &[]).unwrap(),
            "docs/README.md"
        );
    }

    #[test]
    fn test_escaping_target_rejected() {
        let template = TargetTemplate::parse("out/*").unwrap();
        assert!(template.render(&path("x"), &caps(&[".."])).is_err());
        assert!(TargetTemplate::parse("../outside/").is_err());
    }

    #[test]
    fn test_invalid_target_syntax() {
        assert!(TargetTemplate::parse("dist/a**").is_err());
        assert!(TargetTemplate::parse("dist\\").is_err());
    }
}
