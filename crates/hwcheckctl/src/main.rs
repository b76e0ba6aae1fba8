//! hwcheckctl - Hardware compatibility checker for Debian-family installs
//!
//! CLI front end for the assessment engine: captures a fact snapshot,
//! evaluates the rule set, and renders the report. Exit codes mirror the
//! verdict (0 clean, 1 caveats, 2 likely to fail, 3 the tool itself failed)
//! so installer scripts can branch without parsing output.

mod commands;
mod config;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "hwcheckctl")]
#[command(about = "Hardware compatibility assessment for Debian-family installs", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file (default: /etc/hwcheck/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    // Defaults to `check` when omitted, so a bare `hwcheckctl` runs the
    // assessment.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the hardware compatibility check
    Check {
        /// Use a custom rule file instead of the built-in set
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Capture and print the raw fact snapshot as JSON (debug info)
    Snapshot,

    /// Inspect and validate rule sets
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Load a rule file and report whether it is well-formed
    Validate { file: PathBuf },

    /// Print the effective rule set as TOML
    Show {
        /// Custom rule file instead of the built-in set
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            render::display_error(&err);
            ExitCode::from(3)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = config::CtlConfig::load(cli.config.as_deref())?;

    let command = cli.command.unwrap_or(Commands::Check {
        rules: None,
        json: false,
        no_color: false,
    });
    match command {
        Commands::Check {
            rules,
            json,
            no_color,
        } => commands::check(&config, rules.as_deref(), json, !no_color && config.color),
        Commands::Snapshot => commands::snapshot(),
        Commands::Rules { command } => match command {
            RulesCommand::Validate { file } => commands::rules_validate(&file),
            RulesCommand::Show { rules } => {
                commands::rules_show(&config, rules.as_deref())
            }
        },
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_invocation_parses_and_runs_check() {
        let cli = Cli::try_parse_from(["hwcheckctl"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_check_flags_parse() {
        let cli = Cli::try_parse_from(["hwcheckctl", "check", "--json", "--no-color"]).unwrap();
        match cli.command {
            Some(Commands::Check {
                rules,
                json,
                no_color,
            }) => {
                assert!(rules.is_none());
                assert!(json);
                assert!(no_color);
            }
            other => panic!("expected check subcommand, got {:?}", other.is_some()),
        }
    }
}
