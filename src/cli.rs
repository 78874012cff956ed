use std::path::PathBuf;

use clap::Parser;
use clap::builder::styling::{AnsiColor, Color, Styles};

/// Custom styles for help output - matches caravan's color scheme
fn help_styles() -> Styles {
    Styles::styled()
        .header(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .usage(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .literal(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .placeholder(anstyle::Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
}

/// Run one-way source-code migrations between repositories.
#[derive(Debug, Parser)]
#[command(name = "caravan", version, styles = help_styles())]
pub struct Cli {
    /// Path to the migration config file
    pub config: PathBuf,

    /// Name of the workflow to run
    pub workflow: String,

    /// Origin reference to migrate (defaults to the origin's configured ref)
    pub source_ref: Option<String>,

    /// Root directory for bare repository caches
    /// (default: ~/.caravan/repos)
    #[arg(long, value_name = "DIR")]
    pub git_repo_storage: Option<String>,

    /// Override the origin repository URL from the config (a warning is
    /// printed; the run continues)
    #[arg(long, value_name = "URL")]
    pub git_origin_url: Option<String>,

    /// Migrate starting after this origin revision instead of the last
    /// one recorded in the destination
    #[arg(long, value_name = "REF")]
    pub last_rev: Option<String>,

    /// Parent directory for working directories (defaults to the system
    /// temp dir)
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Verbose output (also raises log filtering to debug)
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_parses_positionals_and_flags() {
        let cli = Cli::parse_from([
            "caravan",
            "migrate.toml",
            "default",
            "main",
            "--git-repo-storage",
            "/tmp/repos",
            "--last-rev",
            "abc",
            "--verbose",
        ]);
        assert_eq!(cli.config, PathBuf::from("migrate.toml"));
        assert_eq!(cli.workflow, "default");
        assert_eq!(cli.source_ref.as_deref(), Some("main"));
        assert_eq!(cli.git_repo_storage.as_deref(), Some("/tmp/repos"));
        assert_eq!(cli.last_rev.as_deref(), Some("abc"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_source_ref_is_optional() {
        let cli = Cli::parse_from(["caravan", "migrate.toml", "default"]);
        assert!(cli.source_ref.is_none());
        assert!(cli.git_repo_storage.is_none());
    }

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }
}
