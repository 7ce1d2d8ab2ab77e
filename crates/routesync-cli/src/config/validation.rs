//! Configuration validation and error reporting

use std::collections::HashSet;
use std::slice;

use anyhow::bail;
use routesync::CompiledRuleSet;
use tracing::warn;

use super::types::Config;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a configuration before any engine call
    ///
    /// Rules whose target can never be filled from their source are only
    /// logged; the resolver reports them per route.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate or unusable route ids, routes that
    /// reference unknown repositories, and rules that do not compile.
    pub fn validate(config: &Config) -> anyhow::Result<()> {
        let mut seen = HashSet::new();

        for route in &config.routes {
            let id = route.id.as_str();
            if id.trim().is_empty() {
                bail!("Route id cannot be empty");
            }
            if id.contains(['/', '\\']) || id == "." || id == ".." {
                bail!("Route id '{id}' cannot contain path separators");
            }
            if !seen.insert(id) {
                bail!("Duplicate route id '{id}'");
            }

            for repo in [&route.source, &route.target] {
                if !config.repositories.contains_key(repo) {
                    bail!("Route '{id}' references unknown repository '{repo}'");
                }
            }

            for (idx, rule) in route.rules.iter().enumerate() {
                let compiled = match CompiledRuleSet::compile(slice::from_ref(rule)) {
                    Ok(compiled) => compiled,
                    Err(e) => bail!("Route '{id}' rule #{}: {e}", idx + 1),
                };
                for (_, reason) in compiled.arity_mismatches() {
                    warn!(route = id, rule = idx + 1, "{reason}");
                }
            }
        }

        Ok(())
    }
}
