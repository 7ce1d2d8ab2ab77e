use anyhow::{Context, bail};
use routesync::{
    ChangeSet, ChangeSetReporter, RelativePath, Selection, SyncReporter, SyncResult,
};

use super::common::Session;
use crate::interactive::{ABORTED, InteractivePrompter};

/// Flags of the `apply` command
#[allow(clippy::struct_excessive_bools)]
pub struct ApplyOptions<'a> {
    /// Accept every entry without prompting
    pub yes_all: bool,
    /// Count what would be applied without writing
    pub dry_run: bool,
    /// Restrict the apply to these target paths
    pub only: &'a [String],
    /// Go ahead despite conflicting mappings
    pub ack_conflicts: bool,
}

impl ApplyOptions<'_> {
    const fn interactive(&self) -> bool {
        !self.yes_all && !self.dry_run && self.only.is_empty()
    }
}

pub struct Apply;

impl Apply {
    /// Run the apply; `Ok(false)` when some entries failed
    pub fn execute(
        session: &Session,
        route_id: &str,
        options: &ApplyOptions<'_>,
    ) -> anyhow::Result<bool> {
        let route = session.route(route_id)?;

        // held from before the diff until the record is saved
        let _record_lock = if options.dry_run {
            None
        } else {
            Some(session.state.lock(&route.id)?)
        };
        let token = session
            .locks
            .acquire(&route.id)
            .with_context(|| format!("Failed to lock route '{route_id}'"))?;

        let record = session.state.load(&route.id)?;
        let mut change_set = session
            .engine
            .preview_diff(&route, record.as_ref())
            .with_context(|| format!("Failed to diff route '{route_id}'"))?;

        if change_set.pending().next().is_none() {
            println!("Route '{route_id}' is already in sync.");
            if !options.dry_run {
                let next = record
                    .unwrap_or_default()
                    .updated(&change_set, &SyncResult::default());
                session.state.save(&route.id, &next)?;
            }
            return Ok(true);
        }

        if !change_set.conflicts.is_empty() {
            if options.ack_conflicts {
                change_set.acknowledge_conflicts();
            } else if options.interactive() {
                if !InteractivePrompter::confirm_conflicts(&change_set.conflicts)? {
                    println!("Sync cancelled.");
                    return Ok(true);
                }
                change_set.acknowledge_conflicts();
            }
        }

        let selection = if !options.only.is_empty() {
            Self::only_selection(options.only, &change_set)?
        } else if options.interactive() {
            match InteractivePrompter::new().select(&change_set) {
                Ok(selection) => selection,
                Err(e) if e.to_string() == ABORTED => {
                    eprintln!("\nSync cancelled by user.");
                    return Ok(true);
                }
                Err(e) => return Err(e).context("Failed to read selection"),
            }
        } else {
            Selection::All
        };

        if options.dry_run {
            print!("{}", ChangeSetReporter::render(&change_set, false, false));
        }

        let result = session
            .engine
            .clone()
            .with_dry_run(options.dry_run)
            .apply_sync(&route, &change_set, &selection, &token)
            .with_context(|| format!("Failed to apply route '{route_id}'"))?;

        println!("{}", SyncReporter::generate_summary(&result));

        if !result.dry_run {
            let next = record.unwrap_or_default().updated(&change_set, &result);
            session.state.save(&route.id, &next)?;
        }

        Ok(result.is_success())
    }

    fn only_selection(
        raw: &[String],
        change_set: &ChangeSet,
    ) -> anyhow::Result<Selection> {
        let mut paths = Vec::with_capacity(raw.len());
        for text in raw {
            let Some(path) = RelativePath::parse(text) else {
                bail!("Invalid target path '{text}'");
            };
            if change_set.entry(&path).is_none() {
                tracing::warn!(path = %path, "not part of the change set, ignored");
            }
            paths.push(path);
        }
        Ok(Selection::only(paths))
    }
}
