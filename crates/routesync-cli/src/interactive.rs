//! Interactive approval of change set entries

use std::fmt::Write as _;
use std::io::Write as _;

use anyhow::{Context, Result, bail};
use dialoguer::Confirm;
use dialoguer::console::Term;
use routesync::{ChangeEntry, ChangeKind, ChangeSet, MappingConflict, Selection};

/// Message carried by the error returned when the user quits
pub const ABORTED: &str = "User aborted sync operation";

/// User's choice for one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChoice {
    /// Apply this entry
    Yes,
    /// Skip this entry
    No,
    /// Apply this and all remaining entries
    All,
    /// Skip this and all remaining entries
    None,
    /// Show the diff and ask again
    Diff,
    /// Stop without applying anything
    Quit,
}

impl UserChoice {
    /// Map a key press; Enter means "no"
    #[must_use]
    pub const fn from_key(key: char) -> Option<Self> {
        match key {
            'y' | 'Y' => Some(Self::Yes),
            'n' | 'N' | '\n' | '\r' => Some(Self::No),
            'a' | 'A' => Some(Self::All),
            's' | 'S' => Some(Self::None),
            'd' | 'D' => Some(Self::Diff),
            'q' | 'Q' => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Session state tracking for "all" or "none" choices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionDecision {
    AskEach,
    ApproveAll,
    SkipAll,
}

/// Builds a selection by asking about each pending entry
pub struct InteractivePrompter {
    session_state: SessionDecision,
    term: Term,
}

impl InteractivePrompter {
    /// Create a prompter reading keys from the terminal
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_state: SessionDecision::AskEach,
            term: Term::stderr(),
        }
    }

    /// Ask about every entry that needs action
    ///
    /// # Errors
    ///
    /// Returns an error carrying [`ABORTED`] if the user quits, or if the
    /// terminal cannot be read.
    pub fn select(&mut self, change_set: &ChangeSet) -> Result<Selection> {
        let mut selection = Selection::none();
        for entry in change_set.pending() {
            if self.prompt(entry)? {
                selection.insert(entry.target_path.clone());
            }
        }
        Ok(selection)
    }

    /// Prompt for one entry; `true` to apply it
    ///
    /// # Errors
    ///
    /// As [`InteractivePrompter::select`].
    pub fn prompt(&mut self, entry: &ChangeEntry) -> Result<bool> {
        match self.session_state {
            SessionDecision::ApproveAll => return Ok(true),
            SessionDecision::SkipAll => return Ok(false),
            SessionDecision::AskEach => {}
        }

        println!("\n{}", Self::describe_entry(entry));

        loop {
            match self.read_choice()? {
                UserChoice::Yes => return Ok(true),
                UserChoice::No => return Ok(false),
                UserChoice::All => {
                    self.session_state = SessionDecision::ApproveAll;
                    return Ok(true);
                }
                UserChoice::None => {
                    self.session_state = SessionDecision::SkipAll;
                    return Ok(false);
                }
                UserChoice::Diff => println!("{}", Self::render_diff(entry)),
                UserChoice::Quit => bail!(ABORTED),
            }
        }
    }

    fn read_choice(&self) -> Result<UserChoice> {
        print!("Apply? [y/n/a/s/d/q] (yes/no/all/skip-all/diff/quit): ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        loop {
            let key = self.term.read_char().context("Failed to read user input")?;
            println!("{key}");

            if let Some(choice) = UserChoice::from_key(key) {
                return Ok(choice);
            }
            print!("Invalid key. Press y/n/a/s/d/q: ");
            std::io::stdout().flush().context("Failed to flush stdout")?;
        }
    }

    /// Ask whether to go ahead despite conflicting mappings
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    pub fn confirm_conflicts(conflicts: &[MappingConflict]) -> Result<bool> {
        println!("\nSeveral sources map to the same target:");
        for conflict in conflicts {
            println!(
                "  {} <- {} (using {})",
                conflict.target_path,
                conflict
                    .sources
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                conflict.winner()
            );
        }

        Confirm::new()
            .with_prompt("Apply anyway, using the first source for each?")
            .default(false)
            .interact()
            .context("Failed to read confirmation")
    }

    /// One-paragraph description of an entry
    #[must_use]
    pub fn describe_entry(entry: &ChangeEntry) -> String {
        let action = match entry.kind {
            ChangeKind::Added => "Create new file",
            ChangeKind::Modified => "Overwrite file",
            ChangeKind::Deleted => "Delete file",
            ChangeKind::Unchanged => "Unchanged file",
        };

        let mut text = format!("{action}:\n  Target: {}", entry.target_path);
        if let Some(source) = &entry.source_path {
            let _ = write!(text, "\n  Source: {source}");
        }
        if let Some(delta) = &entry.delta {
            let _ = write!(
                text,
                "\n  Size:   {} -> {} bytes",
                delta.target_size, delta.source_size
            );
        }
        text
    }

    /// Diff text for the `d` key
    #[must_use]
    pub fn render_diff(entry: &ChangeEntry) -> String {
        if let Some(diff) = &entry.content_diff {
            return format!("\n--- {0}\n+++ {0}\n{diff}", entry.target_path);
        }
        if entry.truncated {
            return "\n--- File too large to diff ---".to_string();
        }
        if entry.binary {
            return "\n--- Binary files differ ---".to_string();
        }
        match entry.kind {
            ChangeKind::Added => "\n--- New file ---".to_string(),
            ChangeKind::Deleted => "\n--- File will be deleted ---".to_string(),
            ChangeKind::Modified | ChangeKind::Unchanged => "\n--- No diff ---".to_string(),
        }
    }
}

impl Default for InteractivePrompter {
    fn default() -> Self {
        Self::new()
    }
}
