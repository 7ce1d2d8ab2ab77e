//! Ordered mapping rules compiled into a matcher
//!
//! Rules are evaluated last-match-wins: a later rule overrides every earlier
//! rule for the paths it matches, so a route reads top to bottom as a series
//! of refinements (copy everything, ignore the logs, but keep `debug.log`).

mod glob;
mod template;


pub(crate) use glob::CompiledGlob;
use template::TargetTemplate;
use tracing::debug;

use crate::error::{Error, Result};
use crate::path::RelativePath;
use crate::route::{MappingRule, RuleMode};

/// Outcome of looking a path up in a rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Zero-based index of the winning rule
    pub rule_index: usize,
    /// Mode of the winning rule
    pub mode: RuleMode,
    /// Target path; for [`RuleMode::Ignore`] this is the source path unchanged
    pub target: RelativePath,
}

/// Explanation of how one path is handled by a rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    /// Path that was explained
    pub path: RelativePath,
    /// Indices of every rule whose source glob matches, in list order
    pub matching_rules: Vec<usize>,
    /// Winning rule and its target, `None` when no rule matches
    pub outcome: Option<RuleMatch>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    index: usize,
    source: CompiledGlob,
    target: TargetTemplate,
    mode: RuleMode,
}

/// Immutable compiled form of an ordered rule list
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    rules: Vec<CompiledRule>,
}

impl CompiledRuleSet {
    /// Compile rules in list order
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first rule whose source glob
    /// or target template cannot be parsed.
    pub fn compile(rules: &[MappingRule]) -> Result<Self> {
        let compiled = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                if rule.source_glob.trim().is_empty() {
                    return Err(Error::invalid_pattern(
                        &rule.source_glob,
                        "source glob cannot be empty",
                    ));
                }
                let target = match rule.mode {
                    RuleMode::Copy => TargetTemplate::parse(&rule.target_glob)?,
                    RuleMode::Ignore => TargetTemplate::Identity,
                };
                Ok(CompiledRule {
                    index,
                    source: CompiledGlob::new(&rule.source_glob)?,
                    target,
                    mode: rule.mode,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(rules = compiled.len(), "compiled rule set");
        Ok(Self { rules: compiled })
    }

    /// Number of rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules (nothing will ever be copied)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve a source path
    ///
    /// Returns `Ok(None)` when no rule matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PatternSubstitution`] when the winning rule's target
    /// template cannot be filled for this path.
    pub fn resolve(&self, path: &RelativePath) -> Result<Option<RuleMatch>> {
        let text = path.to_string();
        let Some((rule, captures)) = self
            .rules
            .iter()
            .rev()
            .find_map(|rule| rule.source.captures(&text).map(|caps| (rule, caps)))
        else {
            return Ok(None);
        };

        let target = match rule.mode {
            RuleMode::Ignore => path.clone(),
            RuleMode::Copy => {
                rule.target
                    .render(path, &captures)
                    .map_err(|reason| Error::PatternSubstitution {
                        rule: rule.index,
                        path: text.clone(),
                        reason,
                    })?
            }
        };

        Ok(Some(RuleMatch {
            rule_index: rule.index,
            mode: rule.mode,
            target,
        }))
    }

    /// Explain how a path would be handled, whether or not it exists on disk
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `path` is not a relative path
    /// inside the repository, or [`Error::PatternSubstitution`] as
    /// [`CompiledRuleSet::resolve`] does.
    pub fn explain(&self, path: &str) -> Result<Explanation> {
        let path = RelativePath::parse(path)
            .ok_or_else(|| Error::invalid_pattern(path, "not a relative path inside the repository"))?;
        let text = path.to_string();

        let matching_rules = self
            .rules
            .iter()
            .filter(|rule| rule.source.is_match(&text))
            .map(|rule| rule.index)
            .collect();
        let outcome = self.resolve(&path)?;

        Ok(Explanation {
            path,
            matching_rules,
            outcome,
        })
    }

    /// Rules whose target template can never be filled from their source glob
    ///
    /// Each entry is `(rule index, reason)`. Lookups through these rules fail
    /// with [`Error::PatternSubstitution`]; this lets callers flag them while
    /// the route is being edited.
    #[must_use]
    pub fn arity_mismatches(&self) -> Vec<(usize, String)> {
        self.rules
            .iter()
            .filter(|rule| rule.mode == RuleMode::Copy)
            .filter_map(|rule| {
                let expected = rule.target.wildcards()?;
                (expected != rule.source.wildcards()).then(|| {
                    (
                        rule.index,
                        format!(
                            "target has {expected} wildcard(s) but source glob '{}' has {}",
                            rule.source.pattern(),
                            rule.source.wildcards()
                        ),
                    )
                })
            })
            .collect()
    }
}
