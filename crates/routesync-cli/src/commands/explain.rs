use anyhow::Context;
use routesync::RuleMode;

use super::common::Session;

pub struct Explain;

impl Explain {
    pub fn execute(session: &Session, route_id: &str, path: &str) -> anyhow::Result<()> {
        let route = session.route(route_id)?;
        let explanation = session
            .engine
            .explain(&route, path)
            .with_context(|| format!("Failed to explain '{path}'"))?;

        if explanation.matching_rules.is_empty() {
            println!("{}: no rule matches, not synced", explanation.path);
            return Ok(());
        }

        let numbers: Vec<String> = explanation
            .matching_rules
            .iter()
            .map(|idx| format!("#{}", idx + 1))
            .collect();
        println!("{}: matched by rule(s) {}", explanation.path, numbers.join(", "));

        if let Some(outcome) = explanation.outcome {
            match outcome.mode {
                RuleMode::Copy => println!(
                    "rule #{} wins: copy to {}",
                    outcome.rule_index + 1,
                    outcome.target
                ),
                RuleMode::Ignore => {
                    println!("rule #{} wins: ignored", outcome.rule_index + 1);
                }
            }
        }
        Ok(())
    }
}
