// Helper functions are shared across test binaries; not every binary uses
// every helper.
#![allow(dead_code)]

//! Test utilities: throwaway git repositories with deterministic
//! timestamps and identity, fully isolated from the host git config.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

use tempfile::TempDir;

/// Monotonic counter so every commit in a test run gets a distinct,
/// increasing timestamp.
static COMMIT_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A git repository in a temporary directory.
///
/// Commits get deterministic, strictly increasing author/committer dates
/// and a pinned identity, so history-ordering assertions are stable.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let repo = Self { dir };
        repo.git(&["init", "-q", "-b", "main"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo
    }

    /// A bare repository, for use as a push target.
    pub fn new_bare() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let repo = Self { dir };
        repo.git(&["init", "-q", "--bare", "--initial-branch", "main"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The repository path as a string, for config files and remote URLs.
    pub fn url(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    /// Run git in this repository with an isolated environment. Panics on
    /// failure, printing stderr.
    pub fn git(&self, args: &[&str]) -> String {
        self.git_with_env(args, &[])
    }

    pub fn git_with_env(&self, args: &[&str], envs: &[(&str, &str)]) -> String {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(self.dir.path())
            // No interference from the host's git configuration
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_CONFIG_GLOBAL", "/dev/null")
            .env("GIT_AUTHOR_NAME", "Test User")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "Test User")
            .env("GIT_COMMITTER_EMAIL", "test@example.com");
        for (key, value) in envs {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    pub fn write_file(&self, rel: &str, contents: &str) {
        let path = self.dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    /// Stage everything and commit with the pinned identity and the next
    /// deterministic timestamp. Returns the commit id.
    pub fn commit(&self, message: &str) -> String {
        self.commit_as("Test User", "test@example.com", message)
    }

    pub fn commit_as(&self, name: &str, email: &str, message: &str) -> String {
        let tick = COMMIT_COUNTER.fetch_add(1, Ordering::Relaxed);
        let date = format!("2024-05-01T10:{:02}:{:02}+02:00", tick / 60, tick % 60);
        self.git(&["add", "-A"]);
        self.git_with_env(
            &["commit", "-q", "--allow-empty", "-m", message],
            &[
                ("GIT_AUTHOR_NAME", name),
                ("GIT_AUTHOR_EMAIL", email),
                ("GIT_AUTHOR_DATE", &date),
                ("GIT_COMMITTER_DATE", &date),
            ],
        );
        self.head()
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"]).trim().to_string()
    }
}

/// Write a caravan config file into a temp dir and return its path.
pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("migrate.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

/// Sorted relative file listing of a directory tree (files only).
pub fn list_tree(root: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                out.push(
                    path.strip_prefix(root)
                        .unwrap()
                        .to_string_lossy()
                        .replace('\\', "/"),
                );
            }
        }
    }
    let mut files = Vec::new();
    walk(root, root, &mut files);
    files.sort();
    files
}
