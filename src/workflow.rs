//! The migration engine: one run takes revisions from an origin, transforms
//! the tree and writes it to a destination.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;

use crate::authoring::{Author, Authoring};
use crate::config::MigrationConfig;
use crate::destination::{Destination, TransformResult, WriteResult};
use crate::error::{MigrateError, Result};
use crate::labels::{format_label, parse_label};
use crate::matcher::PathMatcher;
use crate::origin::Origin;
use crate::revision::{Change, Revision};
use crate::styling::Console;
use crate::transform::Transformation;
use crate::tree::{self, Workdir};

/// How origin changes map to destination writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WorkflowMode {
    /// All new changes collapse into one destination commit.
    #[default]
    Squash,
    /// Each origin change produces one destination commit.
    Iterative,
}

/// A named, fully constructed migration pipeline.
#[derive(Debug)]
pub struct Workflow {
    pub project: String,
    pub name: String,
    pub origin: Origin,
    pub destination: Destination,
    pub authoring: Authoring,
    pub transformation: Transformation,
    pub last_rev_override: Option<Revision>,
    pub exclude_in_origin: PathMatcher,
    pub exclude_in_destination: PathMatcher,
    pub mode: WorkflowMode,
    pub reversible_check: bool,
    pub ask_for_confirmation: bool,
}

/// Runs workflows out of a loaded configuration.
///
/// Single-threaded and synchronous: one run is a straight line from
/// resolve to write, and the destination write is the sole commit point.
pub struct WorkflowEngine<'a> {
    config: &'a MigrationConfig,
    console: Console,
    workdir_parent: Option<PathBuf>,
}

impl<'a> WorkflowEngine<'a> {
    pub fn new(config: &'a MigrationConfig, console: Console) -> Self {
        Self {
            config,
            console,
            workdir_parent: None,
        }
    }

    /// Create working directories under `parent` instead of the system
    /// temp dir (`--work-dir`).
    pub fn with_workdir_parent(mut self, parent: Option<PathBuf>) -> Self {
        self.workdir_parent = parent;
        self
    }

    /// Run one workflow: resolve the requested reference (or the origin's
    /// default), enumerate new changes, and write them out in the
    /// workflow's mode.
    pub fn run(&self, workflow_name: &str, reference: Option<&str>) -> Result<Vec<WriteResult>> {
        let workflow = self.config.workflow(workflow_name)?;

        let to_rev = workflow.origin.resolve(reference)?;
        self.console
            .progress(format!("Resolved origin reference to {to_rev}"));

        let label_name = workflow.origin.label_name();
        let from_rev = match &workflow.last_rev_override {
            Some(rev) => Some(rev.clone()),
            None => workflow.destination.last_migrated_revision(label_name)?,
        };
        if let Some(from) = &from_rev {
            self.console
                .progress(format!("Migrating changes after {}", from.short()));
        }

        let changes = workflow.origin.changes(from_rev.as_ref(), &to_rev)?;

        match workflow.mode {
            WorkflowMode::Squash => {
                if changes.is_empty() {
                    return Err(MigrateError::NoWork {
                        last: from_rev.unwrap_or(to_rev).to_string(),
                    });
                }
                let newest = changes.last().expect("changes is non-empty");
                let message = squash_message(&workflow.project, &changes, label_name, &to_rev);
                let result = self.migrate_one(
                    workflow,
                    &to_rev,
                    &newest.author,
                    newest.date,
                    message,
                    changes.len(),
                )?;
                Ok(vec![result])
            }
            WorkflowMode::Iterative => {
                let mut results = Vec::with_capacity(changes.len());
                // A failure stops the run; earlier writes stay committed.
                for change in &changes {
                    let message = iterative_message(change, label_name);
                    results.push(self.migrate_one(
                        workflow,
                        &change.revision,
                        &change.author,
                        change.date,
                        message,
                        1,
                    )?);
                }
                Ok(results)
            }
        }
    }

    /// Checkout, transform and write a single revision.
    fn migrate_one(
        &self,
        workflow: &Workflow,
        rev: &Revision,
        author: &Author,
        date: DateTime<FixedOffset>,
        message: String,
        change_count: usize,
    ) -> Result<WriteResult> {
        let workdir = Workdir::new(self.workdir_parent.as_deref())?;
        workflow.origin.checkout(rev, workdir.path())?;
        tree::delete_matching(workdir.path(), &workflow.exclude_in_origin)?;

        if workflow.reversible_check {
            apply_checking_reversible(&workflow.transformation, workdir.path(), &self.console)?;
        } else {
            workflow.transformation.apply(workdir.path(), &self.console)?;
        }

        if workflow.ask_for_confirmation {
            let question = if change_count == 1 {
                format!("Write {} to the destination?", rev.short())
            } else {
                format!(
                    "Write {change_count} squashed changes at {} to the destination?",
                    rev.short()
                )
            };
            if !self.console.confirm(&question) {
                return Err(MigrateError::Canceled);
            }
        }

        let result = TransformResult {
            workdir: workdir.path().to_path_buf(),
            origin_revision: rev.clone(),
            destination_excludes: workflow.exclude_in_destination.clone(),
            message,
            author: workflow.authoring.resolve(author).clone(),
            date,
        };
        workflow.destination.write(&result, &self.console)
    }
}

/// Apply the transformation, then prove it round-trips: the reverse applied
/// to a copy of the transformed tree must reproduce the pre-transform tree
/// byte for byte.
fn apply_checking_reversible(
    transformation: &Transformation,
    workdir: &Path,
    console: &Console,
) -> Result<()> {
    let original = tempfile::tempdir()?;
    tree::copy_tree(workdir, original.path())?;

    transformation.apply(workdir, console)?;
    let reverse = transformation.reverse()?;

    let roundtrip = tempfile::tempdir()?;
    tree::copy_tree(workdir, roundtrip.path())?;
    reverse.apply(roundtrip.path(), console)?;

    if !tree::trees_equal(original.path(), roundtrip.path())? {
        return Err(MigrateError::Reversibility(format!(
            "reversing {reverse:?} did not reproduce the original tree"
        )));
    }
    Ok(())
}

/// The synthetic squash commit message: a digest line per change (oldest
/// first), the labels collected from the range, and the stamped revision.
fn squash_message(
    project: &str,
    changes: &[Change],
    label_name: &str,
    to_rev: &Revision,
) -> String {
    let mut message = format!("Import of {project}.\n\nThis change squashes the following commits:\n\n");
    for change in changes {
        message.push_str(&format!(
            "  - {} {} by {}\n",
            change.revision.short(),
            change.first_line(),
            change.author
        ));
    }
    message.push('\n');

    let mut labels: IndexMap<&str, &str> = IndexMap::new();
    for change in changes {
        for (name, value) in &change.labels {
            labels.insert(name, value);
        }
    }
    for (name, value) in labels {
        message.push_str(&format_label(name, value));
        message.push('\n');
    }
    message.push_str(&format_label(label_name, to_rev.as_str()));
    message.push('\n');
    message
}

/// The iterative commit message: the origin message with the revision
/// stamped at the end, joining an existing trailing label block when there
/// is one.
fn iterative_message(change: &Change, label_name: &str) -> String {
    let mut message = change.message.trim_end().to_string();
    let ends_with_label = message
        .lines()
        .next_back()
        .is_some_and(|line| parse_label(line).is_some());

    if message.is_empty() {
        // Nothing but the stamp
    } else if ends_with_label {
        message.push('\n');
    } else {
        message.push_str("\n\n");
    }
    message.push_str(&format_label(label_name, change.revision.as_str()));
    message.push('\n');
    message
}
