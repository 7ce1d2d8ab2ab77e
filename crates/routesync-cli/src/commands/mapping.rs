use anyhow::Context;

use super::common::Session;

pub struct Mapping;

impl Mapping {
    pub fn execute(session: &Session, route_id: &str) -> anyhow::Result<()> {
        let route = session.route(route_id)?;
        let resolution = session
            .engine
            .preview_mapping(&route)
            .with_context(|| format!("Failed to resolve route '{route_id}'"))?;

        for mapping in &resolution.mappings {
            println!("{} -> {}", mapping.source_path, mapping.target_path);
        }

        for conflict in &resolution.conflicts {
            let sources: Vec<String> = conflict.sources.iter().map(ToString::to_string).collect();
            println!(
                "! {} claimed by {} (using {})",
                conflict.target_path,
                sources.join(", "),
                conflict.winner()
            );
        }

        for failure in &resolution.rule_failures {
            println!(
                "✗ rule #{}: {} ({} path(s), first: {})",
                failure.rule_index + 1,
                failure.reason,
                failure.affected,
                failure.first_path
            );
        }

        for warning in &resolution.warnings {
            println!("⚠ skipped {}: {warning}", warning.path.display());
        }

        println!(
            "\n{} file(s) mapped, {} conflict(s), {} rule error(s)",
            resolution.mappings.len(),
            resolution.conflicts.len(),
            resolution.rule_failures.len()
        );
        Ok(())
    }
}
