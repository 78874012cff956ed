//! Working-tree filesystem helpers.
//!
//! Relative paths are always rendered with `/` separators so matcher
//! semantics are host-independent. Empty directories are invisible to these
//! helpers where content is compared: the unit of migration is the file.

use std::fs;
use std::path::Path;

use path_slash::PathExt as _;

use crate::error::Result;
use crate::matcher::PathMatcher;

/// All files under `root`, as sorted `/`-relative paths.
pub fn list_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let rel = path.strip_prefix(root).expect("path is under root");
            out.push(rel.to_slash_lossy().into_owned());
        }
    }
    Ok(())
}

/// Copy every file under `src` into `dst`, creating directories as needed.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for rel in list_files(src)? {
        let from = src.join(&rel);
        let to = dst.join(&rel);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&from, &to)?;
    }
    Ok(())
}

/// Byte-for-byte comparison of the files under two roots.
pub fn trees_equal(a: &Path, b: &Path) -> Result<bool> {
    let files_a = list_files(a)?;
    let files_b = list_files(b)?;
    if files_a != files_b {
        return Ok(false);
    }
    for rel in &files_a {
        if fs::read(a.join(rel))? != fs::read(b.join(rel))? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Delete every file under `root` whose relative path matches, then prune
/// directories the deletions emptied.
pub fn delete_matching(root: &Path, matcher: &PathMatcher) -> Result<()> {
    if matcher.is_empty() {
        return Ok(());
    }
    for rel in list_files(root)? {
        if matcher.matches(&rel) {
            fs::remove_file(root.join(&rel))?;
        }
    }
    prune_empty_dirs(root)?;
    Ok(())
}

/// Remove empty directories below `root` (deepest first). `root` itself
/// stays.
pub fn prune_empty_dirs(root: &Path) -> Result<()> {
    prune_below(root)?;
    Ok(())
}

fn prune_below(dir: &Path) -> Result<bool> {
    let mut empty = true;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if prune_below(&path)? {
                fs::remove_dir(&path)?;
            } else {
                empty = false;
            }
        } else {
            empty = false;
        }
    }
    Ok(empty)
}

/// A fresh working directory for one migration run.
///
/// Created under the system temp dir (or a caller-supplied parent) and
/// removed on drop unless the caller keeps it.
pub struct Workdir {
    dir: tempfile::TempDir,
}

impl Workdir {
    pub fn new(parent: Option<&Path>) -> Result<Self> {
        let dir = match parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                tempfile::Builder::new().prefix("caravan-").tempdir_in(parent)?
            }
            None => tempfile::Builder::new().prefix("caravan-").tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_list_files_sorted_relative() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "b.txt", "");
        write(tmp.path(), "a/deep/c.txt", "");

        assert_eq!(list_files(tmp.path()).unwrap(), vec!["a/deep/c.txt", "b.txt"]);
    }

    #[test]
    fn test_copy_and_compare() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        write(src.path(), "x/y.txt", "same");

        copy_tree(src.path(), dst.path()).unwrap();
        assert!(trees_equal(src.path(), dst.path()).unwrap());

        write(dst.path(), "x/y.txt", "different");
        assert!(!trees_equal(src.path(), dst.path()).unwrap());
    }

    #[test]
    fn test_trees_differ_on_extra_file() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write(a.path(), "only.txt", "");
        assert!(!trees_equal(a.path(), b.path()).unwrap());
    }

    #[test]
    fn test_delete_matching_prunes_empty_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "keep.rs", "");
        write(tmp.path(), "docs/guide.md", "");
        write(tmp.path(), "docs/img/logo.md", "");

        let matcher = PathMatcher::of(vec!["**.md".to_string()]).unwrap();
        delete_matching(tmp.path(), &matcher).unwrap();

        assert_eq!(list_files(tmp.path()).unwrap(), vec!["keep.rs"]);
        assert!(!tmp.path().join("docs").exists());
    }

    #[test]
    fn test_empty_matcher_deletes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.txt", "");
        delete_matching(tmp.path(), &PathMatcher::empty()).unwrap();
        assert_eq!(list_files(tmp.path()).unwrap(), vec!["a.txt"]);
    }
}
