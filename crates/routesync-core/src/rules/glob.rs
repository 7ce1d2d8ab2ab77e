//! Glob compilation with positional wildcard captures
//!
//! Supported syntax, matched against `/`-separated relative paths:
//!
//! - `*` any run of characters within one segment
//! - `?` exactly one character within one segment
//! - `[abc]`, `[a-z]`, `[!x]` / `[^x]` one character from a class, never `/`
//! - `**` as a whole segment: zero or more segments
//! - `\x` the literal character `x`
//!
//! Every wildcard is a capture, numbered left to right. A trailing `/` is
//! shorthand for `/**`.

use regex::Regex;

use crate::error::{Error, Result};

/// A compiled source glob
#[derive(Debug, Clone)]
pub(crate) struct CompiledGlob {
    pattern: String,
    regex: Regex,
    wildcards: usize,
}

impl CompiledGlob {
    /// Compile a glob
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] on malformed syntax.
    pub fn new(pattern: &str) -> Result<Self> {
        let (source, wildcards) = translate(pattern)?;
        let regex = Regex::new(&source)
            .map_err(|e| Error::invalid_pattern(pattern, format!("cannot compile: {e}")))?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            wildcards,
        })
    }

    /// Original pattern text
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Number of wildcard captures
    #[must_use]
    pub const fn wildcards(&self) -> usize {
        self.wildcards
    }

    /// Whether the whole path matches
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Wildcard captures in order, or `None` if the path does not match
    ///
    /// A `**` that matched zero segments captures an empty string.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(path)?;
        Some(
            (1..=self.wildcards)
                .map(|i| caps.get(i).map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }
}

/// Translate a glob into an anchored regex and its wildcard count
fn translate(pattern: &str) -> Result<(String, usize)> {
    let mut normalized = pattern.trim();
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest;
    }
    let normalized = normalized.trim_start_matches('/');
    let expanded = if normalized.ends_with('/') {
        format!("{normalized}**")
    } else {
        normalized.to_string()
    };

    let segments: Vec<&str> = expanded.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(Error::invalid_pattern(pattern, "pattern has no path segments"));
    }

    let mut regex = String::from("^");
    let mut wildcards = 0;
    let mut need_separator = false;
    let last = segments.len() - 1;

    for (idx, segment) in segments.iter().enumerate() {
        if need_separator {
            regex.push('/');
        }

        if *segment == "**" {
            wildcards += 1;
            if idx == last {
                regex.push_str("(.*)");
            } else {
                // consumes its own trailing separator so that zero segments match
                regex.push_str("(?:(.+)/)?");
                need_separator = false;
                continue;
            }
        } else {
            wildcards += translate_segment(pattern, segment, &mut regex)?;
        }
        need_separator = true;
    }

    regex.push('$');
    Ok((regex, wildcards))
}

/// Translate one non-`**` segment, returning the number of wildcards in it
fn translate_segment(pattern: &str, segment: &str, out: &mut String) -> Result<usize> {
    let mut wildcards = 0;
    let mut chars = segment.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    return Err(Error::invalid_pattern(
                        pattern,
                        "`**` must be a whole path segment",
                    ));
                }
                out.push_str("([^/]*)");
                wildcards += 1;
            }
            '?' => {
                out.push_str("([^/])");
                wildcards += 1;
            }
            '[' => {
                translate_class(pattern, &mut chars, out)?;
                wildcards += 1;
            }
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| Error::invalid_pattern(pattern, "dangling escape"))?;
                out.push_str(&regex::escape(&escaped.to_string()));
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    Ok(wildcards)
}

/// Translate a `[...]` class; the opening bracket is already consumed
fn translate_class(
    pattern: &str,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    out: &mut String,
) -> Result<()> {
    let mut body = Vec::new();
    let mut negated = false;

    if matches!(chars.peek(), Some('!' | '^')) {
        negated = true;
        chars.next();
    }

    let mut closed = false;
    while let Some(c) = chars.next() {
        if c == ']' && !body.is_empty() {
            closed = true;
            break;
        }
        body.push(c);
    }
    if !closed {
        return Err(Error::invalid_pattern(pattern, "unclosed character class"));
    }

    out.push_str(if negated { "([^/" } else { "([" });
    let last = body.len() - 1;
    for (idx, c) in body.iter().enumerate() {
        match c {
            '-' if idx != 0 && idx != last => out.push('-'),
            '\\' | '[' | ']' | '^' | '&' | '~' | '-' => {
                out.push('\\');
                out.push(*c);
            }
            other => out.push(*other),
        }
    }
    // a class never matches the separator, even through a range
    out.push_str(if negated { "])" } else { "&&[^/]])" });

    Ok(())
}
