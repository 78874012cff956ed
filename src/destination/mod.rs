//! The write side of a migration: where transformed trees land.

mod folder;
mod git;

use std::path::PathBuf;

pub use folder::FolderDestination;
pub use git::GitDestination;

use chrono::{DateTime, FixedOffset};

use crate::authoring::Author;
use crate::error::Result;
use crate::matcher::PathMatcher;
use crate::revision::Revision;
use crate::styling::Console;

/// Everything the engine hands to a destination for one write: the staged
/// tree, the origin revision it came from, the files in the destination
/// that must survive, and the commit metadata the workflow derived.
#[derive(Debug)]
pub struct TransformResult {
    pub workdir: PathBuf,
    pub origin_revision: Revision,
    pub destination_excludes: PathMatcher,
    pub message: String,
    pub author: Author,
    pub date: DateTime<FixedOffset>,
}

/// Where a write ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Files were mirrored into this folder.
    Folder { path: PathBuf },
    /// This commit was pushed.
    Git { revision: Revision },
}

impl std::fmt::Display for WriteResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteResult::Folder { path } => write!(f, "folder {}", path.display()),
            WriteResult::Git { revision } => write!(f, "commit {}", revision.short()),
        }
    }
}

#[derive(Debug)]
pub enum Destination {
    Git(GitDestination),
    Folder(FolderDestination),
}

impl Destination {
    /// Apply a staged tree to the destination.
    pub fn write(&self, result: &TransformResult, console: &Console) -> Result<WriteResult> {
        match self {
            Destination::Git(dest) => dest.write(result, console),
            Destination::Folder(dest) => dest.write(result, console),
        }
    }

    /// The most recent origin revision this destination recorded under
    /// `label_name`, if any. Folder destinations keep no history.
    pub fn last_migrated_revision(&self, label_name: &str) -> Result<Option<Revision>> {
        match self {
            Destination::Git(dest) => dest.last_migrated_revision(label_name),
            Destination::Folder(_) => Ok(None),
        }
    }
}
