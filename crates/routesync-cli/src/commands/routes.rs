use routesync::{RepoId, RuleMode};

use super::common::Session;

pub struct Routes;

impl Routes {
    #[allow(clippy::unnecessary_wraps)]
    pub fn execute(session: &Session, verbose: bool) -> anyhow::Result<()> {
        let config = &session.config.config;
        if config.routes.is_empty() {
            println!("No routes configured in {}", session.config.path.display());
            return Ok(());
        }

        for route in &config.routes {
            let root = |id: &RepoId| {
                session
                    .engine
                    .repository_root(id)
                    .map_or_else(|_| "?".to_string(), |p| p.display().to_string())
            };

            match &route.name {
                Some(name) => println!("{} ({name})", route.id),
                None => println!("{}", route.id),
            }
            if let Some(description) = &route.description {
                println!("  {description}");
            }
            println!("  source: {} [{}]", route.source, root(&route.source));
            println!("  target: {} [{}]", route.target, root(&route.target));
            println!("  rules:  {}", route.rules.len());

            if verbose {
                for (idx, rule) in route.rules.iter().enumerate() {
                    match rule.mode {
                        RuleMode::Copy if rule.target_glob.is_empty() => {
                            println!("    #{} copy {}", idx + 1, rule.source_glob);
                        }
                        RuleMode::Copy => println!(
                            "    #{} copy {} -> {}",
                            idx + 1,
                            rule.source_glob,
                            rule.target_glob
                        ),
                        RuleMode::Ignore => println!("    #{} ignore {}", idx + 1, rule.source_glob),
                    }
                }
            }
        }

        Ok(())
    }
}
