//! Folder origin: imports a local directory as a single synthetic change.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::authoring::Author;
use crate::error::{MigrateError, Result};
use crate::revision::{Change, Revision};

/// Origin over a plain directory. There is no history: every run sees one
/// synthetic change whose revision renders the canonical folder path.
#[derive(Debug)]
pub struct FolderOrigin {
    path: PathBuf,
    author: Author,
}

impl FolderOrigin {
    pub fn new(path: impl Into<PathBuf>, author: Option<Author>) -> Self {
        Self {
            path: path.into(),
            author: author.unwrap_or(Author {
                name: "Caravan".to_string(),
                email: "noreply@caravan.invalid".to_string(),
            }),
        }
    }

    /// The reference, when given, overrides the configured folder path.
    pub fn resolve(&self, reference: Option<&str>) -> Result<Revision> {
        let path = match reference.filter(|r| !r.is_empty()) {
            Some(reference) => PathBuf::from(reference),
            None => self.path.clone(),
        };
        let canonical = dunce::canonicalize(&path).map_err(|e| {
            MigrateError::config(format!(
                "origin folder '{}' is not readable: {e}",
                path.display()
            ))
        })?;
        if !canonical.is_dir() {
            return Err(MigrateError::config(format!(
                "origin folder '{}' is not a directory",
                canonical.display()
            )));
        }
        Ok(Revision::new(canonical.to_string_lossy()))
    }

    /// Copy the folder's tree into the workdir, skipping any `.git`
    /// directory so a work-in-progress clone can be imported directly.
    pub fn checkout(&self, rev: &Revision, workdir: &Path) -> Result<()> {
        let src = PathBuf::from(rev.as_str());
        if workdir.exists() {
            for entry in fs::read_dir(workdir)? {
                let path = entry?.path();
                if path.is_dir() {
                    fs::remove_dir_all(&path)?;
                } else {
                    fs::remove_file(&path)?;
                }
            }
        } else {
            fs::create_dir_all(workdir)?;
        }
        copy_skipping_git(&src, workdir)
    }

    pub fn changes(&self, _from: Option<&Revision>, to: &Revision) -> Result<Vec<Change>> {
        Ok(vec![self.change(to)?])
    }

    pub fn change(&self, rev: &Revision) -> Result<Change> {
        Ok(Change {
            revision: rev.clone(),
            author: self.author.clone(),
            message: format!("Import of {}", rev),
            date: chrono::Local::now().fixed_offset(),
            labels: IndexMap::new(),
            parents: Vec::new(),
        })
    }

    pub fn visit_changes(
        &self,
        start: &Revision,
        mut visitor: impl FnMut(&Change) -> std::ops::ControlFlow<()>,
    ) -> Result<()> {
        let change = self.change(start)?;
        let _ = visitor(&change);
        Ok(())
    }
}

fn copy_skipping_git(src: &Path, dst: &Path) -> Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        if path.is_dir() {
            if name == ".git" {
                continue;
            }
            let target = dst.join(&name);
            fs::create_dir_all(&target)?;
            copy_skipping_git(&path, &target)?;
        } else {
            fs::copy(&path, dst.join(&name))?;
        }
    }
    Ok(())
}
