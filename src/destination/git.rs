//! Git destination: builds a commit from the staged tree and pushes it.

use std::path::PathBuf;

use color_print::cformat;

use crate::error::{MigrateError, Result};
use crate::git::GitRepo;
use crate::revision::Revision;
use crate::styling::Console;

use super::{TransformResult, WriteResult};

/// How far back the label scan walks when recovering the last migrated
/// revision from destination history.
const HISTORY_SCAN_LIMIT: usize = 200;

/// Writes commits to a remote git repository through a bare cache repo.
///
/// Each write constructs a commit whose tree is exactly the staged workdir
/// (plus files the exclusion matcher imports from the current tip) and
/// pushes it to the configured ref.
#[derive(Debug)]
pub struct GitDestination {
    url: String,
    push_ref: String,
    storage_root: PathBuf,
}

impl GitDestination {
    pub fn new(
        url: impl Into<String>,
        push_ref: impl Into<String>,
        storage_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            push_ref: push_ref.into(),
            storage_root: storage_root.into(),
        }
    }

    fn repo(&self) -> Result<GitRepo> {
        GitRepo::bare_cache(&self.storage_root, &self.url)
    }

    fn full_push_ref(&self) -> String {
        if self.push_ref.starts_with("refs/") {
            self.push_ref.clone()
        } else {
            format!("refs/heads/{}", self.push_ref)
        }
    }

    /// Fetch the current tip of the push ref. An absent ref (first-ever
    /// migration) is not an error.
    fn fetch_tip(&self, repo: &GitRepo) -> Result<Option<Revision>> {
        match repo.fetch(&self.url, &[&self.full_push_ref()]) {
            Ok(()) => Ok(Some(repo.rev_parse("FETCH_HEAD")?)),
            Err(_) => Ok(None),
        }
    }

    pub fn last_migrated_revision(&self, label_name: &str) -> Result<Option<Revision>> {
        let repo = self.repo()?;
        let Some(tip) = self.fetch_tip(&repo)? else {
            return Ok(None);
        };

        let changes = repo.log(tip.as_str(), Some(HISTORY_SCAN_LIMIT))?;
        Ok(changes
            .iter()
            .find_map(|change| change.labels.get(label_name))
            .map(Revision::new))
    }

    pub fn write(&self, result: &TransformResult, console: &Console) -> Result<WriteResult> {
        let repo = self.repo()?;
        let tip = self.fetch_tip(&repo)?;

        if let Some(tip) = &tip {
            self.restore_excluded(&repo, tip, result)?;
        }

        let scratch = tempfile::tempdir()?;
        let index = scratch.path().join("index");
        let index = index.to_string_lossy();
        let git_dir = repo.git_dir().to_string_lossy().into_owned();
        let work_tree = result.workdir.to_string_lossy().into_owned();
        let index_env: &[(&str, &str)] = &[("GIT_INDEX_FILE", &index)];

        repo.run_in(
            &result.workdir,
            &["--git-dir", &git_dir, "--work-tree", &work_tree, "add", "-A", "."],
            index_env,
        )?;
        let tree = repo.run_with_env(&["write-tree"], index_env)?;
        let tree = tree.trim();

        let author_date = result.date.to_rfc3339();
        let mut commit_args = vec!["commit-tree", tree];
        if let Some(tip) = &tip {
            commit_args.extend_from_slice(&["-p", tip.as_str()]);
        }
        commit_args.extend_from_slice(&["-m", &result.message]);

        let commit = repo.run_with_env(
            &commit_args,
            &[
                ("GIT_AUTHOR_NAME", &result.author.name),
                ("GIT_AUTHOR_EMAIL", &result.author.email),
                ("GIT_AUTHOR_DATE", &author_date),
                ("GIT_COMMITTER_NAME", &result.author.name),
                ("GIT_COMMITTER_EMAIL", &result.author.email),
            ],
        )?;
        let commit = Revision::new(commit.trim());

        let refspec = format!("{}:{}", commit.as_str(), self.full_push_ref());
        repo.run(&["push", &self.url, &refspec]).map_err(|e| {
            MigrateError::vcs(format!("push to {} failed: {e}", self.url))
        })?;

        console.info(cformat!(
            "Pushed <bold>{}</> to {} ({})",
            commit.short(),
            self.url,
            self.push_ref
        ));
        Ok(WriteResult::Git { revision: commit })
    }

    /// Copy files matching the exclusion matcher from the destination tip
    /// into the workdir, so the new commit carries them forward untouched.
    fn restore_excluded(
        &self,
        repo: &GitRepo,
        tip: &Revision,
        result: &TransformResult,
    ) -> Result<()> {
        if result.destination_excludes.is_empty() {
            return Ok(());
        }

        let listing = repo.run(&["ls-tree", "-r", "--name-only", "-z", tip.as_str()])?;
        let preserved: Vec<&str> = listing
            .split('\0')
            .filter(|path| !path.is_empty() && result.destination_excludes.matches(path))
            .collect();
        if preserved.is_empty() {
            return Ok(());
        }

        let scratch = tempfile::tempdir()?;
        let index = scratch.path().join("index");
        let index = index.to_string_lossy();
        let git_dir = repo.git_dir().to_string_lossy().into_owned();
        let work_tree = result.workdir.to_string_lossy().into_owned();

        let mut args = vec![
            "--git-dir",
            git_dir.as_str(),
            "--work-tree",
            work_tree.as_str(),
            "checkout",
            "-q",
            "-f",
            tip.as_str(),
            "--",
        ];
        args.extend(preserved);
        repo.run_in(&result.workdir, &args, &[("GIT_INDEX_FILE", &index)])?;
        Ok(())
    }
}
