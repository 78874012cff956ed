//! Reversible working-tree transformations.
//!
//! A transformation mutates the workdir in place. Reversal produces the
//! inverse transformation, which the engine uses for round-trip checks when
//! a workflow sets `reversible-check`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, Result};
use crate::styling::Console;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformation {
    /// Rename `before` to `after`. Either side may be empty, meaning the
    /// workdir root: `Move("", "dir")` pushes the whole tree down into
    /// `dir`, `Move("dir", "")` hoists `dir`'s contents up to the root.
    Move { before: String, after: String },
    /// Ordered list, applied front to back. Stops at the first failure.
    Sequence(Vec<Transformation>),
}

impl Transformation {
    /// Validated `Move` constructor. Both sides must be relative
    /// `/`-separated paths without `..` segments; empty means the root.
    pub fn move_of(before: impl Into<String>, after: impl Into<String>) -> Result<Self> {
        let before = before.into();
        let after = after.into();
        validate_move_path(&before)?;
        validate_move_path(&after)?;
        Ok(Transformation::Move { before, after })
    }

    pub fn sequence(steps: Vec<Transformation>) -> Self {
        Transformation::Sequence(steps)
    }

    /// Apply this transformation to `workdir` in place.
    pub fn apply(&self, workdir: &Path, console: &Console) -> Result<()> {
        match self {
            Transformation::Move { before, after } => {
                console.progress(format!("Moving '{before}' to '{after}'"));
                apply_move(workdir, before, after)
            }
            Transformation::Sequence(steps) => {
                for step in steps {
                    step.apply(workdir, console)?;
                }
                Ok(())
            }
        }
    }

    /// The inverse transformation.
    ///
    /// `Move` reverses by swapping its sides. A `Sequence` reverses to the
    /// reverses of its steps in reverse order. Unreversible members surface
    /// as configuration errors, which the engine's reversibility check
    /// re-raises.
    pub fn reverse(&self) -> Result<Transformation> {
        match self {
            Transformation::Move { before, after } => Ok(Transformation::Move {
                before: after.clone(),
                after: before.clone(),
            }),
            Transformation::Sequence(steps) => {
                let reversed = steps
                    .iter()
                    .rev()
                    .map(Transformation::reverse)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Transformation::Sequence(reversed))
            }
        }
    }
}

fn validate_move_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Ok(());
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(MigrateError::config(format!(
            "move path '{path}' must be relative without trailing '/'"
        )));
    }
    if path.split('/').any(|seg| seg.is_empty() || seg == ".." || seg == ".") {
        return Err(MigrateError::config(format!(
            "move path '{path}' cannot contain empty, '.' or '..' segments"
        )));
    }
    Ok(())
}

fn apply_move(workdir: &Path, before: &str, after: &str) -> Result<()> {
    if before == after {
        return Ok(());
    }
    if before.is_empty() {
        return move_root_into(workdir, after);
    }
    if after.is_empty() {
        return move_up_to_root(workdir, before);
    }

    let src = workdir.join(before);
    if !src.exists() {
        return Err(MigrateError::transform(format!(
            "cannot move '{before}': path does not exist"
        )));
    }

    let dst = workdir.join(after);
    let dst = if dst.is_dir() {
        // An existing directory target receives the source inside it
        let name = src
            .file_name()
            .ok_or_else(|| MigrateError::transform(format!("cannot move '{before}'")))?;
        dst.join(name)
    } else if dst.exists() {
        return Err(MigrateError::transform(format!(
            "cannot move '{before}' to '{after}': target exists and is a file"
        )));
    } else {
        dst
    };

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&src, &dst)?;
    Ok(())
}

/// `Move("", after)`: push the entire workdir tree down into `after`.
///
/// Staged through a temporary sibling so `after` landing inside the moved
/// tree cannot swallow itself.
fn move_root_into(workdir: &Path, after: &str) -> Result<()> {
    let staging = tempfile::tempdir_in(workdir)?;
    for entry in fs::read_dir(workdir)? {
        let path = entry?.path();
        if path == staging.path() {
            continue;
        }
        let name = entry_name(&path)?;
        fs::rename(&path, staging.path().join(name))?;
    }

    let staging = staging.keep();
    let dst = workdir.join(after);
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&staging, &dst)?;
    Ok(())
}

/// `Move(before, "")`: hoist the contents of `before` up to the root.
fn move_up_to_root(workdir: &Path, before: &str) -> Result<()> {
    let src = workdir.join(before);
    if !src.is_dir() {
        return Err(MigrateError::transform(format!(
            "cannot move '{before}' to the root: not a directory"
        )));
    }

    for entry in fs::read_dir(&src)? {
        let path = entry?.path();
        let name = entry_name(&path)?;
        let dst = workdir.join(&name);
        if dst.exists() {
            return Err(MigrateError::transform(format!(
                "cannot move '{before}' to the root: '{name}' already exists"
            )));
        }
        fs::rename(&path, &dst)?;
    }
    fs::remove_dir(&src)?;
    // Ancestors of a nested `before` stay behind only if now empty
    let mut parent = PathBuf::from(before);
    while parent.pop() && parent.as_os_str() != "" {
        let dir = workdir.join(&parent);
        if fs::read_dir(&dir)?.next().is_some() {
            break;
        }
        fs::remove_dir(&dir)?;
    }
    Ok(())
}

fn entry_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MigrateError::transform(format!("unnamed path '{}'", path.display())))
}
