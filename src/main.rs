use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use caravan::config::{LoadOptions, MigrationConfig};
use caravan::styling::{Console, eprintln, success_message, warning_message};
use caravan::workflow::WorkflowEngine;

mod cli;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli) -> caravan::Result<()> {
    let console = Console::new(cli.verbose);

    let storage_root = match &cli.git_repo_storage {
        Some(dir) => PathBuf::from(shellexpand::tilde(dir).into_owned()),
        None => dirs::home_dir()
            .ok_or_else(|| caravan::MigrateError::config("cannot locate a home directory"))?
            .join(".caravan")
            .join("repos"),
    };
    let options = LoadOptions {
        storage_root,
        origin_url_override: cli.git_origin_url.clone(),
        last_rev_override: cli.last_rev.clone(),
    };

    let config = MigrationConfig::load(&cli.config, &options)?;
    for warning in &config.warnings {
        eprintln!("{}", warning_message(warning));
    }

    let engine =
        WorkflowEngine::new(&config, console).with_workdir_parent(cli.work_dir.clone());
    let results = engine.run(&cli.workflow, cli.source_ref.as_deref())?;

    for result in &results {
        eprintln!("{}", success_message(format!("Migrated to {result}")));
    }
    Ok(())
}
