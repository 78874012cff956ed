//! Include/exclude glob matching over relative paths.
//!
//! Patterns use `/`-separated relative paths on every host. `*` matches any
//! run of characters within one path segment, `**` matches across segments
//! (zero or more), and `\` escapes the next character literally. A path
//! matches when it matches at least one include pattern and no exclude
//! pattern.
//!
//! The suffix form `**.java` is part of the pattern language (any path
//! ending in `.java` at any depth), which rules out globset's
//! component-only `**`; patterns compile to anchored regexes instead.

use regex::Regex;

use crate::error::{MigrateError, Result};

/// Compiled include/exclude pattern sets.
///
/// Matching is case-sensitive, deterministic and side-effect free. Equality
/// and rendering are defined over the original `(include, exclude)` pattern
/// lists so two matchers built from the same patterns compare equal.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    includes: Vec<String>,
    excludes: Vec<String>,
    include_res: Vec<Regex>,
    exclude_res: Vec<Regex>,
}

impl PathMatcher {
    /// Compile a matcher from include and exclude pattern lists.
    ///
    /// An empty include list matches nothing; an empty exclude list excludes
    /// nothing. Invalid patterns (empty, absolute, or containing a `..`
    /// segment) are configuration errors.
    pub fn new(
        includes: impl IntoIterator<Item = String>,
        excludes: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let includes: Vec<String> = includes.into_iter().collect();
        let excludes: Vec<String> = excludes.into_iter().collect();

        let include_res = includes.iter().map(|p| compile(p)).collect::<Result<_>>()?;
        let exclude_res = excludes.iter().map(|p| compile(p)).collect::<Result<_>>()?;

        Ok(Self {
            includes,
            excludes,
            include_res,
            exclude_res,
        })
    }

    /// A matcher that matches nothing.
    pub fn empty() -> Self {
        Self {
            includes: Vec::new(),
            excludes: Vec::new(),
            include_res: Vec::new(),
            exclude_res: Vec::new(),
        }
    }

    /// Matcher over a bare include list. The engine's exclusion sets are
    /// built this way: the patterns select the files being excluded.
    pub fn of(patterns: impl IntoIterator<Item = String>) -> Result<Self> {
        Self::new(patterns, Vec::new())
    }

    /// Whether `path` (relative, `/`-separated) matches any include and no
    /// exclude.
    pub fn matches(&self, path: &str) -> bool {
        self.include_res.iter().any(|re| re.is_match(path))
            && !self.exclude_res.iter().any(|re| re.is_match(path))
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty()
    }
}

impl PartialEq for PathMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.includes == other.includes && self.excludes == other.excludes
    }
}

impl Eq for PathMatcher {}

impl std::fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "glob(include = {:?}, exclude = {:?})",
            self.includes, self.excludes
        )
    }
}

/// Validate one pattern and compile it to an anchored regex.
fn compile(pattern: &str) -> Result<Regex> {
    if pattern.trim().is_empty() {
        return Err(MigrateError::config("glob pattern cannot be empty"));
    }
    if pattern.starts_with('/') {
        return Err(MigrateError::config(format!(
            "glob pattern '{pattern}' must be relative (no leading '/')"
        )));
    }
    if pattern.split('/').any(|seg| seg == "..") {
        return Err(MigrateError::config(format!(
            "glob pattern '{pattern}' cannot contain '..' segments"
        )));
    }

    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    re.push_str(".*");
                } else {
                    re.push_str("[^/]*");
                }
            }
            '\\' => match chars.next() {
                Some(escaped) => re.push_str(&regex::escape(&escaped.to_string())),
                None => {
                    return Err(MigrateError::config(format!(
                        "glob pattern '{pattern}' ends with a dangling escape"
                    )));
                }
            },
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');

    Regex::new(&re)
        .map_err(|e| MigrateError::config(format!("glob pattern '{pattern}' is invalid: {e}")))
}
