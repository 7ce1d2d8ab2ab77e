use anyhow::Context;
use routesync::RepoId;

use super::common::Session;

pub struct TestGlob;

impl TestGlob {
    pub fn execute(session: &Session, repo: &str, pattern: &str) -> anyhow::Result<()> {
        let preview = session
            .engine
            .test_glob(&RepoId::new(repo), pattern)
            .with_context(|| format!("Failed to test pattern '{pattern}'"))?;

        if preview.matches.is_empty() {
            println!("No files match '{pattern}'");
            return Ok(());
        }

        for path in &preview.matches {
            println!("{path}");
        }
        if preview.truncated {
            println!("\n(more matches not shown; showing the first {})", preview.matches.len());
        } else {
            println!("\n{} match(es)", preview.matches.len());
        }
        Ok(())
    }
}
