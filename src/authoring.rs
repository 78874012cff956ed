//! Authorship mapping between origin and destination.
//!
//! Origin commits carry their own authors; the destination applies one of
//! three policies: pass them through, replace them all with a default, or
//! keep only whitelisted authors and replace the rest.

use std::collections::BTreeSet;

use crate::error::{MigrateError, Result};

/// A commit author or committer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    /// Build an author, validating that the name is non-empty and the email
    /// is empty or `local@domain` shaped.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let email = email.into();

        if name.trim().is_empty() {
            return Err(MigrateError::config("author name cannot be empty"));
        }
        if !email.is_empty() && !is_valid_email(&email) {
            return Err(MigrateError::config(format!(
                "invalid author email '{email}'"
            )));
        }

        Ok(Self { name, email })
    }

    /// Parse the `Name <email>` form used in config files and git output.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let open = s
            .rfind('<')
            .ok_or_else(|| MigrateError::config(format!("author '{s}' must be 'Name <email>'")))?;
        if !s.ends_with('>') {
            return Err(MigrateError::config(format!(
                "author '{s}' must be 'Name <email>'"
            )));
        }
        let name = s[..open].trim();
        let email = &s[open + 1..s.len() - 1];
        Self::new(name, email)
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}

/// How origin authors map to destination authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AuthoringMode {
    /// Origin authors are kept as-is.
    PassThrough,
    /// Every change is attributed to the default author.
    UseDefault,
    /// Whitelisted origin authors are kept; everyone else becomes the
    /// default author.
    Whitelist,
}

/// Resolved authoring policy for a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authoring {
    mode: AuthoringMode,
    default: Option<Author>,
    /// Lowercased emails; membership is case-insensitive.
    whitelist: BTreeSet<String>,
}

impl Authoring {
    pub fn pass_through() -> Self {
        Self {
            mode: AuthoringMode::PassThrough,
            default: None,
            whitelist: BTreeSet::new(),
        }
    }

    /// Build a policy, enforcing that a default author is present whenever
    /// the mode can substitute one, and that a whitelist mode actually has
    /// entries.
    pub fn new(
        mode: AuthoringMode,
        default: Option<Author>,
        whitelist: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        if mode != AuthoringMode::PassThrough && default.is_none() {
            return Err(MigrateError::config(format!(
                "authoring mode '{mode}' requires a default author"
            )));
        }

        let whitelist: BTreeSet<String> = whitelist
            .into_iter()
            .map(|e| e.to_ascii_lowercase())
            .collect();
        if mode == AuthoringMode::Whitelist && whitelist.is_empty() {
            return Err(MigrateError::config(
                "authoring mode 'whitelist' requires at least one whitelisted email",
            ));
        }

        Ok(Self {
            mode,
            default,
            whitelist,
        })
    }

    /// Map an origin author to the destination author.
    pub fn resolve<'a>(&'a self, origin: &'a Author) -> &'a Author {
        match self.mode {
            AuthoringMode::PassThrough => origin,
            AuthoringMode::UseDefault => self.default_author(),
            AuthoringMode::Whitelist => {
                if self.whitelist.contains(&origin.email.to_ascii_lowercase()) {
                    origin
                } else {
                    self.default_author()
                }
            }
        }
    }

    fn default_author(&self) -> &Author {
        self.default
            .as_ref()
            .expect("construction enforces a default author for substituting modes")
    }
}
