//! Parsing of `git log` output.
//!
//! The engine invokes `git log --no-color --date=iso-strict --parents
//! --first-parent` and parses the canonical human format: a `commit` line
//! carrying the commit id and its parents, header lines up to a blank line,
//! then the message indented by four spaces.

use chrono::DateTime;
use indexmap::IndexMap;

use crate::authoring::Author;
use crate::error::{MigrateError, Result};
use crate::labels::parse_label;
use crate::revision::{Change, Revision};

/// Parse log output into changes, in git's order (newest first).
pub fn parse_log(output: &str) -> Result<Vec<Change>> {
    let mut changes = Vec::new();
    let mut lines = output.lines().peekable();

    while let Some(line) = lines.next() {
        if line.is_empty() {
            continue;
        }
        let rest = line.strip_prefix("commit ").ok_or_else(|| {
            MigrateError::vcs(format!("unexpected git log line: '{line}'"))
        })?;

        // Tokens after `commit` are the id and its parents; stop at the
        // first non-hex token so ref decorations don't trip the parser.
        let mut ids = rest.split_whitespace().take_while(|t| is_commit_id(t));
        let sha = ids
            .next()
            .ok_or_else(|| MigrateError::vcs(format!("malformed commit line: '{line}'")))?;
        let parents: Vec<Revision> = ids.map(Revision::new).collect();

        let mut author: Option<Author> = None;
        let mut date = None;

        // Header lines until the blank separator. Headers we don't need
        // (e.g. `Merge:`) are skipped.
        while let Some(&header) = lines.peek() {
            if header.is_empty() {
                lines.next();
                break;
            }
            if header.starts_with("commit ") {
                break;
            }
            let header = lines.next().expect("peeked line is present");
            if let Some(value) = header.strip_prefix("Author:") {
                author = Some(parse_author_line(value.trim(), sha)?);
            } else if let Some(value) = header.strip_prefix("Date:") {
                let value = value.trim();
                date = Some(DateTime::parse_from_rfc3339(value).map_err(|e| {
                    MigrateError::vcs(format!("commit {sha}: bad date '{value}': {e}"))
                })?);
            }
        }

        let mut message_lines: Vec<&str> = Vec::new();
        while let Some(&line) = lines.peek() {
            if let Some(stripped) = line.strip_prefix("    ") {
                message_lines.push(stripped);
                lines.next();
            } else if line.is_empty() {
                message_lines.push("");
                lines.next();
            } else {
                break;
            }
        }
        // The blank separator between commits parses as trailing empty
        // message lines; drop them.
        while message_lines.last() == Some(&"") {
            message_lines.pop();
        }

        let author = author
            .ok_or_else(|| MigrateError::vcs(format!("commit {sha} has no Author header")))?;
        let date =
            date.ok_or_else(|| MigrateError::vcs(format!("commit {sha} has no Date header")))?;

        let mut labels = IndexMap::new();
        for line in &message_lines {
            if let Some((name, value)) = parse_label(line) {
                labels.insert(name.to_string(), value.to_string());
            }
        }

        changes.push(Change {
            revision: Revision::new(sha),
            author,
            message: message_lines.join("\n"),
            date,
            labels,
            parents,
        });
    }

    Ok(changes)
}

fn is_commit_id(token: &str) -> bool {
    token.len() == 40 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Git emits `Name <email>` but places no constraints on the email, so this
/// parse is lenient where config-side [`Author::parse`] validates.
fn parse_author_line(value: &str, sha: &str) -> Result<Author> {
    let open = value.rfind('<');
    match (open, value.ends_with('>')) {
        (Some(open), true) => Ok(Author {
            name: value[..open].trim().to_string(),
            email: value[open + 1..value.len() - 1].to_string(),
        }),
        _ => Err(MigrateError::vcs(format!(
            "commit {sha}: cannot parse author '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
commit 7d97c5b2d2ef8c0ab84ac67a63bb84a26c61987a 3368a2b8c3b1f3e1b0ef7ae6e7ae8074ad3b0591 9f1fa1e7a43d745e156900e7a340b1cbc93a0dc5
Merge: 3368a2b 9f1fa1e
Author: Alice Example <alice@example.com>
Date:   2024-05-02T10:30:00+02:00

    Merge the feature branch

    BUG=1234
    REVIEWED-BY: bob

commit 3368a2b8c3b1f3e1b0ef7ae6e7ae8074ad3b0591 55dd552ad51a5f1e2b03be2f17bb46a2bbf3a8fa
Author: Bob <bob@example.com>
Date:   2024-05-01T09:00:00+02:00

    Earlier change
";

    #[test]
    fn test_parse_two_commits_with_parents() {
        let changes = parse_log(SAMPLE).unwrap();
        assert_eq!(changes.len(), 2);

        let newer = &changes[0];
        assert_eq!(
            newer.revision.as_str(),
            "7d97c5b2d2ef8c0ab84ac67a63bb84a26c61987a"
        );
        assert_eq!(newer.parents.len(), 2);
        assert_eq!(
            newer.first_parent().unwrap().as_str(),
            "3368a2b8c3b1f3e1b0ef7ae6e7ae8074ad3b0591"
        );
        assert_eq!(newer.author.name, "Alice Example");
        assert_eq!(newer.author.email, "alice@example.com");
        assert_eq!(newer.first_line(), "Merge the feature branch");

        let older = &changes[1];
        assert_eq!(older.parents.len(), 1);
        assert_eq!(older.message, "Earlier change");
    }

    #[test]
    fn test_labels_extracted_with_prefix_stripped() {
        let changes = parse_log(SAMPLE).unwrap();
        let labels = &changes[0].labels;
        assert_eq!(labels.get("BUG").map(String::as_str), Some("1234"));
        assert_eq!(labels.get("REVIEWED-BY").map(String::as_str), Some("bob"));
    }

    #[test]
    fn test_duplicate_label_last_wins() {
        let log = "\
commit 55dd552ad51a5f1e2b03be2f17bb46a2bbf3a8fa
Author: A <a@b.c>
Date:   2024-01-01T00:00:00+00:00

    change

    BUG=1
    BUG=2
";
        let changes = parse_log(log).unwrap();
        assert_eq!(changes[0].labels.get("BUG").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_missing_author_is_error() {
        let log = "\
commit 55dd552ad51a5f1e2b03be2f17bb46a2bbf3a8fa
Date:   2024-01-01T00:00:00+00:00

    orphan
";
        assert!(parse_log(log).is_err());
    }

    #[test]
    fn test_missing_date_is_error() {
        let log = "\
commit 55dd552ad51a5f1e2b03be2f17bb46a2bbf3a8fa
Author: A <a@b.c>

    undated
";
        assert!(parse_log(log).is_err());
    }

    #[test]
    fn test_multiline_message_with_blank_lines() {
        let log = "\
commit 55dd552ad51a5f1e2b03be2f17bb46a2bbf3a8fa
Author: A <a@b.c>
Date:   2024-01-01T00:00:00+00:00

    summary

    body after a blank line
";
        let changes = parse_log(log).unwrap();
        assert_eq!(changes[0].message, "summary\n\nbody after a blank line");
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_log("").unwrap().is_empty());
    }

    #[test]
    fn test_date_offset_preserved() {
        let changes = parse_log(SAMPLE).unwrap();
        assert_eq!(changes[0].date.offset().local_minus_utc(), 2 * 3600);
    }
}
