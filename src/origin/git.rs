//! Git origin: fetches from a remote URL through a bare cache repository.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MigrateError, Result};
use crate::git::GitRepo;
use crate::revision::{Change, Revision};

/// Refspec fetched before resolving a raw commit id. Some hosting providers
/// refuse fetch-by-sha, so the heads are fetched wholesale instead.
const DEFAULT_REFSPEC: &str = "+refs/heads/*:refs/heads/*";

/// How many log entries one `visit_changes` subprocess call covers.
const VISIT_BATCH: usize = 200;

static SHA1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").expect("sha regex is valid"));

/// Hosting flavor of a git origin. Symbolic references may need translation
/// into fetchable refs before the fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GitRepoType {
    /// Fetch the reference exactly as given.
    #[default]
    Plain,
    /// Gerrit: a numeric change (optionally `<change>/<patchset>`) becomes
    /// `refs/changes/<NN>/<change>/<patchset>`.
    Gerrit,
    /// GitHub: a numeric pull request number becomes
    /// `refs/pull/<number>/head`.
    GithubPr,
}

impl GitRepoType {
    /// Translate a symbolic reference into the ref to fetch.
    fn translate(&self, reference: &str) -> String {
        match self {
            GitRepoType::Plain => reference.to_string(),
            GitRepoType::Gerrit => {
                let (change, patchset) = match reference.split_once('/') {
                    Some((change, patchset)) if change.bytes().all(|b| b.is_ascii_digit()) => {
                        (change, patchset)
                    }
                    _ => (reference, "1"),
                };
                match change.parse::<u64>() {
                    // Gerrit shards change refs by the last two digits
                    Ok(number) => {
                        format!("refs/changes/{:02}/{change}/{patchset}", number % 100)
                    }
                    Err(_) => reference.to_string(),
                }
            }
            GitRepoType::GithubPr => {
                if !reference.is_empty() && reference.bytes().all(|b| b.is_ascii_digit()) {
                    format!("refs/pull/{reference}/head")
                } else {
                    reference.to_string()
                }
            }
        }
    }
}

/// Origin over a remote git repository, cached as a bare repo under the
/// storage root.
#[derive(Debug)]
pub struct GitOrigin {
    url: String,
    default_ref: Option<String>,
    repo_type: GitRepoType,
    storage_root: PathBuf,
}

impl GitOrigin {
    pub fn new(
        url: impl Into<String>,
        default_ref: Option<String>,
        repo_type: GitRepoType,
        storage_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            default_ref,
            repo_type,
            storage_root: storage_root.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn repo(&self) -> Result<GitRepo> {
        GitRepo::bare_cache(&self.storage_root, &self.url)
    }

    pub fn resolve(&self, reference: Option<&str>) -> Result<Revision> {
        let reference = match reference.filter(|r| !r.is_empty()) {
            Some(reference) => reference,
            None => self.default_ref.as_deref().ok_or_else(|| {
                MigrateError::config(format!(
                    "no reference given and origin '{}' has no default ref",
                    self.url
                ))
            })?,
        };

        let repo = self.repo()?;
        if SHA1_RE.is_match(reference) {
            repo.fetch(&self.url, &[DEFAULT_REFSPEC])?;
            repo.rev_parse(reference).map_err(|_| {
                MigrateError::vcs(format!(
                    "commit {reference} is not reachable from any head of {}",
                    self.url
                ))
            })
        } else {
            let fetch_ref = self.repo_type.translate(reference);
            repo.fetch(&self.url, &[&fetch_ref])?;
            repo.rev_parse("FETCH_HEAD")
        }
    }

    pub fn checkout(&self, rev: &Revision, workdir: &Path) -> Result<()> {
        self.repo()?.checkout(rev, workdir)
    }

    pub fn changes(&self, from: Option<&Revision>, to: &Revision) -> Result<Vec<Change>> {
        let range = match from {
            Some(from) => format!("{from}..{to}"),
            None => to.to_string(),
        };
        let mut changes = self.repo()?.log(&range, None)?;
        changes.reverse();
        Ok(changes)
    }

    pub fn change(&self, rev: &Revision) -> Result<Change> {
        let changes = self.repo()?.log(rev.as_str(), Some(1))?;
        changes
            .into_iter()
            .next()
            .ok_or_else(|| MigrateError::vcs(format!("no change found at {rev}")))
    }

    pub fn visit_changes(
        &self,
        start: &Revision,
        mut visitor: impl FnMut(&Change) -> ControlFlow<()>,
    ) -> Result<()> {
        let repo = self.repo()?;
        let mut cursor = start.clone();
        loop {
            let batch = repo.log(cursor.as_str(), Some(VISIT_BATCH))?;
            let Some(last) = batch.last() else {
                return Ok(());
            };
            let next = last.first_parent().cloned();
            for change in &batch {
                if let ControlFlow::Break(()) = visitor(change) {
                    return Ok(());
                }
            }
            match next {
                Some(parent) => cursor = parent,
                None => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(GitRepoType::Plain, "main", "main")]
    #[case(GitRepoType::Plain, "refs/heads/main", "refs/heads/main")]
    #[case(GitRepoType::Gerrit, "1234", "refs/changes/34/1234/1")]
    #[case(GitRepoType::Gerrit, "1234/5", "refs/changes/34/1234/5")]
    #[case(GitRepoType::Gerrit, "7", "refs/changes/07/7/1")]
    #[case(GitRepoType::Gerrit, "refs/changes/34/1234/2", "refs/changes/34/1234/2")]
    #[case(GitRepoType::GithubPr, "123", "refs/pull/123/head")]
    #[case(GitRepoType::GithubPr, "refs/pull/123/head", "refs/pull/123/head")]
    #[case(GitRepoType::GithubPr, "main", "main")]
    fn test_ref_translation(
        #[case] repo_type: GitRepoType,
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(repo_type.translate(input), expected);
    }

    #[test]
    fn test_sha1_detection() {
        assert!(SHA1_RE.is_match(&"a".repeat(40)));
        assert!(!SHA1_RE.is_match(&"a".repeat(39)));
        assert!(!SHA1_RE.is_match(&"A".repeat(40))); // uppercase is not a sha
        assert!(!SHA1_RE.is_match("main"));
    }

    #[test]
    fn test_resolve_without_reference_or_default_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let origin = GitOrigin::new("file:///nowhere", None, GitRepoType::Plain, tmp.path());
        let err = origin.resolve(None).unwrap_err();
        assert!(matches!(err, MigrateError::Config(_)));
    }
}
