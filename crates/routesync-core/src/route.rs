//! Route and mapping rule types
//!
//! These are owned by the calling application; the engine only borrows them
//! for the duration of a call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of a repository in the caller's registry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoId(pub String);

/// Identifier of a route
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Create an identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier text
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(RepoId);
string_id!(RouteId);

/// What a matching rule does with a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleMode {
    /// Copy the file into the target tree
    #[default]
    Copy,
    /// Leave the file out
    Ignore,
}

impl fmt::Display for RuleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => f.write_str("copy"),
            Self::Ignore => f.write_str("ignore"),
        }
    }
}

/// One ordered rule of a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMappingRule")]
pub struct MappingRule {
    /// Glob relative to the source repository root
    #[serde(rename = "source")]
    pub source_glob: String,
    /// Target template; empty means "same relative path"
    #[serde(rename = "target")]
    pub target_glob: String,
    /// Copy or ignore
    pub mode: RuleMode,
}

#[derive(Deserialize)]
struct RawMappingRule {
    source: String,
    #[serde(default)]
    target: String,
    #[serde(default)]
    mode: RuleMode,
}

impl TryFrom<RawMappingRule> for MappingRule {
    type Error = Error;

    fn try_from(raw: RawMappingRule) -> Result<Self> {
        Self::new(raw.source, raw.target, raw.mode)
    }
}

impl MappingRule {
    /// Create a rule
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `source_glob` is empty.
    pub fn new(
        source_glob: impl Into<String>,
        target_glob: impl Into<String>,
        mode: RuleMode,
    ) -> Result<Self> {
        let source_glob = source_glob.into();
        if source_glob.trim().is_empty() {
            return Err(Error::invalid_pattern(source_glob, "source glob cannot be empty"));
        }

        Ok(Self {
            source_glob,
            target_glob: target_glob.into(),
            mode,
        })
    }

    /// Copy rule with an explicit target template
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `source_glob` is empty.
    pub fn copy(source_glob: impl Into<String>, target_glob: impl Into<String>) -> Result<Self> {
        Self::new(source_glob, target_glob, RuleMode::Copy)
    }

    /// Ignore rule
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `source_glob` is empty.
    pub fn ignore(source_glob: impl Into<String>) -> Result<Self> {
        Self::new(source_glob, String::new(), RuleMode::Ignore)
    }
}

/// A source/target repository pair with its ordered rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Route identifier, also the key for locks and sync records
    pub id: RouteId,
    /// Repository files are read from
    #[serde(rename = "source")]
    pub source_repo_id: RepoId,
    /// Repository files are written to
    #[serde(rename = "target")]
    pub target_repo_id: RepoId,
    /// Rules in list order; later rules override earlier ones
    #[serde(default)]
    pub rules: Vec<MappingRule>,
}

impl Route {
    /// Create a route without rules
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: RouteId::new(id),
            source_repo_id: RepoId::new(source),
            target_repo_id: RepoId::new(target),
            rules: Vec::new(),
        }
    }

    /// Append a rule
    #[must_use]
    pub fn with_rule(mut self, rule: MappingRule) -> Self {
        self.rules.push(rule);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_glob_rejected() {
        let result = MappingRule::copy("  ", "dist/");
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_rule_mode_serde() {
        assert_eq!(serde_json::to_string(&RuleMode::Copy).unwrap(), r#""copy""#);
        assert_eq!(serde_json::to_string(&RuleMode::Ignore).unwrap(), r#""ignore""#);
    }

    #[test]
    fn test_rule_deserialize_defaults() {
        let rule: MappingRule = serde_json::from_str(r#"{"source": "src/**"}"#).unwrap();
        assert_eq!(rule.source_glob, "src/**");
        assert_eq!(rule.target_glob, "");
        assert_eq!(rule.mode, RuleMode::Copy);
    }

    #[test]
    fn test_rule_deserialize_rejects_empty_source() {
        let result = serde_json::from_str::<MappingRule>(r#"{"source": "", "mode": "ignore"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_route_builder_keeps_order() {
        let route = Route::new("r1", "app", "lib")
            .with_rule(MappingRule::copy("**/*", "").unwrap())
            .with_rule(MappingRule::ignore("*.log").unwrap());

        assert_eq!(route.id.as_str(), "r1");
        assert_eq!(route.rules.len(), 2);
        assert_eq!(route.rules[1].mode, RuleMode::Ignore);
    }
}
