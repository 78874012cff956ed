//! Folder destination: mirrors the staged tree into a local directory.

use std::fs;
use std::path::PathBuf;

use color_print::cformat;

use crate::error::Result;
use crate::styling::Console;
use crate::tree;

use super::{TransformResult, WriteResult};

/// Writes the staged tree into a local folder, deleting whatever was there
/// before except files the exclusion matcher protects.
#[derive(Debug)]
pub struct FolderDestination {
    folder: Option<PathBuf>,
    project: String,
    /// Base for the fallback output path. `None` means the process working
    /// directory, read at write time.
    base_dir: Option<PathBuf>,
}

impl FolderDestination {
    pub fn new(folder: Option<PathBuf>, project: impl Into<String>) -> Self {
        Self {
            folder: folder.map(Into::into),
            project: project.into(),
            base_dir: None,
        }
    }

    /// Resolve the fallback output path against `dir` instead of the
    /// process working directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// The target folder: the configured one, or a fresh timestamped
    /// directory under `<base>/caravan/out/<project>`.
    fn target(&self) -> Result<PathBuf> {
        if let Some(folder) = &self.folder {
            return Ok(folder.clone());
        }
        let project: String = self
            .project
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
        let base = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        Ok(base
            .join("caravan")
            .join("out")
            .join(project)
            .join(stamp.to_string()))
    }

    pub fn write(&self, result: &TransformResult, console: &Console) -> Result<WriteResult> {
        let target = self.target()?;
        fs::create_dir_all(&target)?;

        // Everything the excludes don't protect goes away first, so the
        // final contents are exactly (workdir) ∪ (protected pre-existing).
        for rel in tree::list_files(&target)? {
            if !result.destination_excludes.matches(&rel) {
                fs::remove_file(target.join(&rel))?;
            }
        }
        tree::prune_empty_dirs(&target)?;

        tree::copy_tree(&result.workdir, &target)?;

        console.info(cformat!(
            "Wrote <bold>{}</> at {} to {}",
            result.origin_revision.short(),
            result.date.format("%Y-%m-%d %H:%M:%S %:z"),
            target.display()
        ));
        Ok(WriteResult::Folder { path: target })
    }
}
