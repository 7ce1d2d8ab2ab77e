use anyhow::Context;
use routesync::ChangeSetReporter;

use super::common::Session;

pub struct Diff;

impl Diff {
    pub fn execute(session: &Session, route_id: &str, hunks: bool, all: bool) -> anyhow::Result<()> {
        let route = session.route(route_id)?;
        let record = session.state.load(&route.id)?;
        if record.is_none() {
            tracing::info!(route = route_id, "no sync record yet, deletions are not detected");
        }

        let change_set = session
            .engine
            .preview_diff(&route, record.as_ref())
            .with_context(|| format!("Failed to diff route '{route_id}'"))?;

        print!("{}", ChangeSetReporter::render(&change_set, all, hunks));
        if change_set.is_blocked() {
            println!("Conflicting mappings must be acknowledged with --ack-conflicts before applying.");
        }
        Ok(())
    }
}
