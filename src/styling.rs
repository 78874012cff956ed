//! Terminal output and console interaction.
//!
//! Messages are styled with color-print's `cformat!` tags and written
//! through anstream, which drops the ANSI codes when output is piped. All
//! status text (progress, warnings, errors, the confirmation prompt) goes
//! to stderr; stdout is reserved for data, so a run can be piped without
//! noise.

use std::io::{BufRead, Write};

use color_print::cformat;

// Re-exports from anstream (auto-detecting output)
pub use anstream::{eprint, eprintln, print, println};

// One emoji per message kind, shared between the formatting helpers below
// and the error Display impls so a run's output stays visually consistent.

pub const PROGRESS_EMOJI: &str = "🔄";
pub const SUCCESS_EMOJI: &str = "✅";
pub const ERROR_EMOJI: &str = "❌";
pub const WARNING_EMOJI: &str = "🟡";
pub const HINT_EMOJI: &str = "💡";

/// Marks the `[y/N]` confirmation prompt.
pub const PROMPT_EMOJI: &str = "❓";

/// Red error line. The content may carry its own inner tags, so the
/// interesting part can be bolded inside the red span:
///
/// ```
/// use color_print::cformat;
/// use caravan::styling::error_message;
///
/// let name = "default";
/// let msg = error_message(cformat!("Workflow <bold>{name}</> not found"));
/// ```
pub fn error_message(content: impl AsRef<str>) -> String {
    cformat!("{ERROR_EMOJI} <red>{}</>", content.as_ref())
}

/// Yellow line for conditions that don't stop the run, like an origin URL
/// overridden from the command line.
pub fn warning_message(content: impl AsRef<str>) -> String {
    cformat!("{WARNING_EMOJI} <yellow>{}</>", content.as_ref())
}

/// Dimmed suggestion, printed after an error to point at a way out.
pub fn hint_message(content: impl AsRef<str>) -> String {
    cformat!("{HINT_EMOJI} <dim>{}</>", content.as_ref())
}

/// Green line for a completed migration step.
pub fn success_message(content: impl AsRef<str>) -> String {
    cformat!("{SUCCESS_EMOJI} <green>{}</>", content.as_ref())
}

/// Cyan line for the slow parts of a run (fetching, checking out).
pub fn progress_message(content: impl AsRef<str>) -> String {
    cformat!("{PROGRESS_EMOJI} <cyan>{}</>", content.as_ref())
}

/// Console handle for the engine: status messages plus interactive prompts.
///
/// Status output goes to stderr so primary output stays pipeable. The prompt
/// reads one line from stdin; a non-interactive caller that never answers is
/// out of scope (callers enforce wall-clock bounds externally).
#[derive(Debug, Clone, Default)]
pub struct Console {
    pub verbose: bool,
}

impl Console {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Progress message, only shown with `--verbose`.
    pub fn progress(&self, msg: impl AsRef<str>) {
        if self.verbose {
            eprintln!("{}", progress_message(msg));
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        eprintln!("{}", warning_message(msg));
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        eprintln!("{}", msg.as_ref());
    }

    /// Ask a yes/no question on stderr and read the answer from stdin.
    ///
    /// Only `y`/`yes` (case-insensitive) count as confirmation; EOF and
    /// everything else decline, matching the `[y/N]` default.
    pub fn confirm(&self, question: &str) -> bool {
        eprint!("{PROMPT_EMOJI} {question} [y/N] ");
        let _ = std::io::stderr().flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}
