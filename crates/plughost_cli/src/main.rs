//! `plughost` command-line host.
//!
//! # Responsibility
//! - Validate, normalize, and run plugin manifests against the built-in catalog.
//! - Own process-level setup: logging and exit codes.

mod commands;
mod probe;

use clap::{Parser, Subcommand};
use log::error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "plughost", version, about = "Load and inspect plugin manifests")]
struct Cli {
    /// Log level (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rotating log files. Logs go to stderr when omitted.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a manifest and report whether every implementation is known.
    Check { manifest: PathBuf },
    /// Parse a manifest and print it in normalized form.
    Export { manifest: PathBuf },
    /// Load a manifest, run one support pass, then destroy every plugin.
    Run {
        /// Directory that relative resource names resolve against.
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
        /// Manifest resource name, resolved through the base directory.
        manifest: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or_else(|| plughost_core::default_log_level());
    if let Err(err) = plughost_core::init_logging(level, cli.log_dir.as_deref()) {
        eprintln!("plughost: {err}");
        return ExitCode::from(2);
    }

    let mut stdout = io::stdout().lock();
    let result = match &cli.command {
        Command::Check { manifest } => commands::check(manifest, &mut stdout),
        Command::Export { manifest } => commands::export(manifest, &mut stdout),
        Command::Run { base_dir, manifest } => commands::run(base_dir, manifest, &mut stdout),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("plughost: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_base_dir_to_current_directory() {
        let cli = Cli::parse_from(["plughost", "run", "conf/plugins.json"]);
        match cli.command {
            Command::Run { base_dir, manifest } => {
                assert_eq!(base_dir, PathBuf::from("."));
                assert_eq!(manifest, "conf/plugins.json");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn global_logging_flags_follow_subcommand() {
        let cli = Cli::parse_from(["plughost", "check", "plugins.json", "--log-level", "warn"]);
        assert_eq!(cli.log_level.as_deref(), Some("warn"));
        assert!(matches!(cli.command, Command::Check { .. }));
    }
}
