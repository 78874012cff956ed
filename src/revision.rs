//! Revision identifiers and commit records.

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;

use crate::authoring::Author;

/// An opaque, origin-specific revision identifier.
///
/// For git origins this wraps a complete 40-hex commit id; for folder
/// origins it renders the imported path. Only two operations are
/// observable: the stable string form and equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for one-line digests. Git revisions abbreviate to 12
    /// hex chars; anything shorter renders whole.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Revision {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One commit as seen by an origin: identity, authorship, message and the
/// labels extracted from the message. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub revision: Revision,
    pub author: Author,
    pub message: String,
    pub date: DateTime<FixedOffset>,
    /// Label name → value, insertion-ordered. Duplicate names within one
    /// message resolve last-wins.
    pub labels: IndexMap<String, String>,
    /// Parent revisions, first parent first. Empty for root commits.
    pub parents: Vec<Revision>,
}

impl Change {
    /// First line of the commit message, for one-line digests.
    pub fn first_line(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// First parent, if any. The engine follows first-parent chains only.
    pub fn first_parent(&self) -> Option<&Revision> {
        self.parents.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(message: &str) -> Change {
        Change {
            revision: Revision::new("a".repeat(40)),
            author: Author::new("Alice", "alice@example.com").unwrap(),
            message: message.to_string(),
            date: DateTime::parse_from_rfc3339("2024-03-01T12:00:00+01:00").unwrap(),
            labels: IndexMap::new(),
            parents: vec![],
        }
    }

    #[test]
    fn test_short_revision() {
        let rev = Revision::new("0123456789abcdef0123456789abcdef01234567");
        assert_eq!(rev.short(), "0123456789ab");
        assert_eq!(Revision::new("tiny").short(), "tiny");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(change("summary\n\nbody").first_line(), "summary");
        assert_eq!(change("").first_line(), "");
    }

    #[test]
    fn test_revision_equality_by_string() {
        assert_eq!(Revision::new("abc"), Revision::from("abc"));
        assert_ne!(Revision::new("abc"), Revision::new("abd"));
    }
}
