//! Commit-message label extraction.
//!
//! A label is a line of the form `NAME=VALUE` or `NAME: VALUE` where `NAME`
//! matches `[A-Z][A-Z0-9_-]*`. Labels carry structured metadata through
//! commit messages, most importantly the stamped last-migrated revision
//! (e.g. `GitOrigin-RevId=<sha>`), which is how a destination remembers
//! where the previous run stopped.

use std::sync::LazyLock;

use regex::Regex;

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Names start with an uppercase letter; `GitOrigin-RevId` must qualify,
    // so the tail is case-insensitive. Separator is `=` or `:`; the value
    // needs at least one non-whitespace character. Surrounding whitespace
    // is trimmed, internal preserved.
    Regex::new(r"^([A-Z][A-Za-z0-9_-]*)[=:]\s*(\S(?:.*\S)?)\s*$").expect("label regex is valid")
});

/// Parse one message line as a label. Returns `None` for prose lines.
pub fn parse_label(line: &str) -> Option<(&str, &str)> {
    let caps = LABEL_RE.captures(line)?;
    Some((
        caps.get(1).expect("group 1 always present").as_str(),
        caps.get(2).expect("group 2 always present").as_str(),
    ))
}

/// Render a label the canonical way it is stamped into messages.
pub fn format_label(name: &str, value: &str) -> String {
    format!("{name}={value}")
}
