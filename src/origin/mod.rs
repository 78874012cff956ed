//! The read side of a migration: where revisions come from.

mod folder;
mod git;

use std::ops::ControlFlow;
use std::path::Path;

pub use folder::FolderOrigin;
pub use git::{GitOrigin, GitRepoType};

use crate::error::Result;
use crate::revision::{Change, Revision};

/// An origin supplies revisions: it resolves references, materializes trees
/// and enumerates history.
#[derive(Debug)]
pub enum Origin {
    Git(GitOrigin),
    Folder(FolderOrigin),
}

impl Origin {
    /// Resolve a reference string (or the configured default when absent)
    /// to a concrete revision, guaranteed checkout-able for the rest of the
    /// run.
    pub fn resolve(&self, reference: Option<&str>) -> Result<Revision> {
        match self {
            Origin::Git(origin) => origin.resolve(reference),
            Origin::Folder(origin) => origin.resolve(reference),
        }
    }

    /// Populate `workdir` with the exact tree at `rev`, replacing whatever
    /// was there.
    pub fn checkout(&self, rev: &Revision, workdir: &Path) -> Result<()> {
        match self {
            Origin::Git(origin) => origin.checkout(rev, workdir),
            Origin::Folder(origin) => origin.checkout(rev, workdir),
        }
    }

    /// First-parent changes in `(from, to]`, oldest first. A `None` start
    /// walks back to the beginning of history.
    pub fn changes(&self, from: Option<&Revision>, to: &Revision) -> Result<Vec<Change>> {
        match self {
            Origin::Git(origin) => origin.changes(from, to),
            Origin::Folder(origin) => origin.changes(from, to),
        }
    }

    /// The single change at `rev`.
    pub fn change(&self, rev: &Revision) -> Result<Change> {
        match self {
            Origin::Git(origin) => origin.change(rev),
            Origin::Folder(origin) => origin.change(rev),
        }
    }

    /// Walk the first-parent chain from `start` toward the root, stopping
    /// when the visitor breaks or history ends.
    pub fn visit_changes(
        &self,
        start: &Revision,
        visitor: impl FnMut(&Change) -> ControlFlow<()>,
    ) -> Result<()> {
        match self {
            Origin::Git(origin) => origin.visit_changes(start, visitor),
            Origin::Folder(origin) => origin.visit_changes(start, visitor),
        }
    }

    /// The label under which migrated revision ids are stamped into
    /// destination commit messages.
    pub fn label_name(&self) -> &'static str {
        match self {
            Origin::Git(_) => "GitOrigin-RevId",
            Origin::Folder(_) => "FolderOrigin-RevId",
        }
    }
}
