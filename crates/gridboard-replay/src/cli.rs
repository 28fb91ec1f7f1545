use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::replay::{RunArgs, print_defaults, run_replay};

#[derive(Debug, Parser)]
#[command(
    name = "gridboard-replay",
    about = "Replay gridboard event traces through the layout engine",
    version
)]
pub struct Cli {
    /// Raise log verbosity (`-v` debug, `-vv` trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a JSONL event trace and print the outcome of every event.
    Run(RunArgs),

    /// Print the default engine configuration as TOML.
    Defaults,
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run_replay(args),
        Commands::Defaults => print_defaults(&mut std::io::stdout().lock()),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use tempfile::tempdir;

    use crate::error::ReplayError;
    use crate::replay::RunArgs;

    use super::{Cli, Commands, run};

    #[test]
    fn defaults_command_dispatches_successfully() {
        let result = run(Cli {
            verbose: 0,
            command: Commands::Defaults,
        });
        assert!(result.is_ok());
    }

    #[test]
    fn run_command_reports_missing_trace() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("missing.jsonl");
        let result = run(Cli {
            verbose: 0,
            command: Commands::Run(RunArgs {
                events: missing.clone(),
                config: None,
                catalog: None,
                json: false,
                strict: false,
            }),
        });
        match result {
            Err(ReplayError::MissingPath { path }) => assert_eq!(path, missing),
            other => panic!("expected MissingPath, got {other:?}"),
        }
    }

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "gridboard-replay",
            "-v",
            "run",
            "--events",
            "trace.jsonl",
            "--config",
            "engine.toml",
            "--json",
        ])
        .expect("valid arguments");
        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.events, PathBuf::from("trace.jsonl"));
        assert_eq!(args.config, Some(PathBuf::from("engine.toml")));
        assert!(args.json);
        assert!(!args.strict);
    }
}
