//! Error taxonomy and formatting.
//!
//! Every failure the engine can surface belongs to one of a small set of
//! kinds, each with its own exit code. Origins and destinations raise these
//! directly; the CLI prints the `Display` form and exits with `exit_code()`.

use crate::styling::{ERROR_EMOJI, HINT_EMOJI};
use color_print::cformat;

/// Exit code for a successful run.
pub const EXIT_SUCCESS: i32 = 0;

#[derive(Debug)]
pub enum MigrateError {
    /// Invalid or missing configuration (bad pattern, absent workflow,
    /// unreversible transform in a reversibility check).
    Config(String),
    /// Subprocess failure, unreachable reference, or unparseable git output.
    /// Carries stderr verbatim.
    Vcs(String),
    /// A transformation's precondition failed (e.g. Move target occupied).
    Transform(String),
    /// Applying the reversed transformation did not reproduce the original
    /// tree. The destination is not written.
    Reversibility(String),
    /// Interactive confirmation declined.
    Canceled,
    /// Squash mode found no changes between the last migrated revision and
    /// the requested one.
    NoWork { last: String },
}

impl MigrateError {
    pub fn config(msg: impl Into<String>) -> Self {
        MigrateError::Config(msg.into())
    }

    pub fn vcs(msg: impl Into<String>) -> Self {
        MigrateError::Vcs(msg.into())
    }

    pub fn transform(msg: impl Into<String>) -> Self {
        MigrateError::Transform(msg.into())
    }

    /// Process exit code for this error kind.
    ///
    /// Transform and reversibility failures originate in user-authored
    /// configuration, so they share the configuration exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            MigrateError::Config(_)
            | MigrateError::Transform(_)
            | MigrateError::Reversibility(_) => 1,
            MigrateError::Vcs(_) => 2,
            MigrateError::Canceled => 3,
            MigrateError::NoWork { .. } => 4,
        }
    }
}

impl std::fmt::Display for MigrateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrateError::Config(msg) => {
                write!(f, "{}", cformat!("{ERROR_EMOJI} <red>{msg}</>"))
            }

            MigrateError::Vcs(msg) => {
                write!(f, "{}", cformat!("{ERROR_EMOJI} <red>{msg}</>"))
            }

            MigrateError::Transform(msg) => {
                write!(
                    f,
                    "{}",
                    cformat!("{ERROR_EMOJI} <red>Transformation failed: {msg}</>")
                )
            }

            MigrateError::Reversibility(msg) => {
                write!(
                    f,
                    "{}",
                    cformat!(
                        "{ERROR_EMOJI} <red>Reversibility check failed: {msg}</>\n\n{HINT_EMOJI} <dim>Disable reversible-check or fix the transformation sequence</>"
                    )
                )
            }

            MigrateError::Canceled => {
                write!(f, "{}", cformat!("{ERROR_EMOJI} <red>Canceled by user</>"))
            }

            MigrateError::NoWork { last } => {
                write!(
                    f,
                    "{}",
                    cformat!(
                        "{ERROR_EMOJI} <red>No new changes to migrate since <bold>{last}</></>"
                    )
                )
            }
        }
    }
}

impl std::error::Error for MigrateError {}

// Filesystem failures while shuffling workdirs are run-fatal external
// errors, same bucket as subprocess failures.
impl From<std::io::Error> for MigrateError {
    fn from(e: std::io::Error) -> Self {
        MigrateError::Vcs(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::config("x").exit_code(), 1);
        assert_eq!(MigrateError::transform("x").exit_code(), 1);
        assert_eq!(MigrateError::Reversibility("x".into()).exit_code(), 1);
        assert_eq!(MigrateError::vcs("x").exit_code(), 2);
        assert_eq!(MigrateError::Canceled.exit_code(), 3);
        assert_eq!(MigrateError::NoWork { last: "abc".into() }.exit_code(), 4);
    }

    #[test]
    fn test_display_includes_message() {
        let err = MigrateError::vcs("fatal: not a git repository");
        assert!(err.to_string().contains("fatal: not a git repository"));
    }

    #[test]
    fn test_io_error_maps_to_vcs() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = MigrateError::from(io);
        assert_eq!(err.exit_code(), 2);
    }
}
