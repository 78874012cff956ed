//! Bare repository cache and git command execution.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{MigrateError, Result};
use crate::revision::{Change, Revision};

/// Escape a repository URL into a filesystem-safe cache directory name.
///
/// Keeps `[A-Za-z0-9_-]`, maps space to `+` and percent-encodes every other
/// byte as uppercase `%XX`. The escape set is on-disk state: changing it
/// orphans existing caches.
pub fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for b in url.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => out.push(b as char),
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// A bare git repository driven through subprocesses.
///
/// Cache instances live under the storage root, one per escaped origin or
/// destination URL, and are reused across runs. Not safe for concurrent use
/// by two runs sharing a cache directory; callers serialize.
#[derive(Debug, Clone)]
pub struct GitRepo {
    git_dir: PathBuf,
}

impl GitRepo {
    /// Open (initializing if absent) the bare cache repository for `url`
    /// under `storage_root`. Idempotent.
    pub fn bare_cache(storage_root: &Path, url: &str) -> Result<Self> {
        let git_dir = storage_root.join(escape_url(url));
        fs::create_dir_all(&git_dir)?;

        let repo = Self { git_dir };
        if !repo.git_dir.join("HEAD").exists() {
            repo.run(&["init", "--bare"])?;
        }
        Ok(repo)
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Run a git command in this repository and return stdout.
    ///
    /// Non-zero exit becomes a VCS error carrying trimmed stderr (falling
    /// back to stdout, since some git commands report errors there).
    pub fn run(&self, args: &[&str]) -> Result<String> {
        self.run_with_env(args, &[])
    }

    /// Like [`run`](Self::run), with extra environment variables (used for
    /// throwaway index files and author identity).
    pub fn run_with_env(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<String> {
        self.exec(&self.git_dir, args, envs)
    }

    /// Run a git command with `cwd` as the working directory. Work-tree
    /// operations run rooted at the work tree so pathspecs resolve there.
    pub fn run_in(&self, cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<String> {
        self.exec(cwd, args, envs)
    }

    fn exec(&self, cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<String> {
        log::debug!("$ git {} [{}]", args.join(" "), cwd.display());

        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(cwd);
        for (key, value) in envs {
            cmd.env(key, value);
        }

        let output = cmd
            .output()
            .map_err(|e| MigrateError::vcs(format!("failed to execute git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Git uses \r for progress updates; normalize for stable messages
            let stderr = stderr.replace('\r', "\n");
            let stdout = String::from_utf8_lossy(&output.stdout);
            let error_msg = [stderr.trim(), stdout.trim()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(MigrateError::vcs(format!(
                "git {} failed: {error_msg}",
                args.first().copied().unwrap_or("")
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Fetch refspecs from a remote URL into this repository.
    pub fn fetch(&self, url: &str, refspecs: &[&str]) -> Result<()> {
        let mut args = vec!["fetch", "-f", url];
        args.extend_from_slice(refspecs);
        self.run(&args)?;
        Ok(())
    }

    /// Resolve a revision expression to a full commit id.
    pub fn rev_parse(&self, rev: &str) -> Result<Revision> {
        let expr = format!("{rev}^{{commit}}");
        let out = self.run(&["rev-parse", "--verify", "--quiet", &expr])?;
        let sha = out.trim();
        if sha.is_empty() {
            return Err(MigrateError::vcs(format!("cannot resolve '{rev}'")));
        }
        Ok(Revision::new(sha))
    }

    /// Materialize `rev`'s tree into `workdir`, replacing any existing
    /// contents. Uses a throwaway index so the bare repository's state is
    /// untouched.
    pub fn checkout(&self, rev: &Revision, workdir: &Path) -> Result<()> {
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

        let scratch = tempfile::tempdir()?;
        let index = scratch.path().join("index");
        let git_dir = self.git_dir.to_string_lossy().into_owned();
        let work_tree = workdir.to_string_lossy().into_owned();

        // cwd is the workdir too, so the `.` pathspec resolves at its root.
        // The explicit --work-tree overrides the cache repo's bareness.
        self.run_in(
            workdir,
            &[
                "--git-dir",
                &git_dir,
                "--work-tree",
                &work_tree,
                "checkout",
                "-q",
                "-f",
                rev.as_str(),
                "--",
                ".",
            ],
            &[("GIT_INDEX_FILE", &index.to_string_lossy())],
        )
        .map_err(|e| MigrateError::vcs(format!("cannot check out {rev}: {e}")))?;
        Ok(())
    }

    /// First-parent log over `range`, parsed into changes, newest first
    /// (git's native order).
    pub fn log(&self, range: &str, limit: Option<usize>) -> Result<Vec<Change>> {
        let mut args = vec![
            "log".to_string(),
            "--no-color".to_string(),
            "--date=iso-strict".to_string(),
            "--parents".to_string(),
            "--first-parent".to_string(),
        ];
        if let Some(n) = limit {
            args.push(format!("-{n}"));
        }
        args.push(range.to_string());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.run(&arg_refs)?;
        super::parse_log(&output)
    }
}
