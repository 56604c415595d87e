use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use montanha::{
    commands::{CollectCommand, CommandTable, ConsolidateCommand},
    config::{resolve_config, Config, DEFAULT_CONFIG_PATH},
    error::exit_status,
    institutions::collector::CollectorContext,
    source::HttpSource,
    store::JsonStore,
};

#[derive(Parser)]
#[command(name = "montanha", version, about = "Collects and consolidates legislative transparency data")]
struct Cli {
    /// Configuration file [default: config.json, if present]
    #[arg(long, env = "MONTANHA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enables debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Collects the given institutions, then consolidates each one
    Collect {
        /// Institution codes: almg, algo, senado, cmbh, cmsp, cdep
        institutions: Vec<String>,
    },

    /// Consolidates the latest committed collection of an institution
    Consolidate { institution: String },
}

impl CliCommand {
    fn into_call(self) -> (&'static str, Vec<String>) {
        match self {
            CliCommand::Collect { institutions } => (CollectCommand::NAME, institutions),
            CliCommand::Consolidate { institution } => (ConsolidateCommand::NAME, vec![institution]),
        }
    }
}

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// - Load configuration
// - Initialize logging
// - Build the store, the data source and the command table
// - Run the requested command
//
// Exit codes: 0 success, 2 usage error, 1 anything else.
//
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli.config.as_deref(), Path::new(DEFAULT_CONFIG_PATH))?;

    let level = if cli.debug || config.debug_log() {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let table = build_command_table(&config)?;
    let (name, args) = cli.command.into_call();
    table.call(name, &args).await?;
    Ok(())
}

fn build_command_table(config: &Config) -> anyhow::Result<CommandTable> {
    let store = Arc::new(JsonStore::open(&config.store.path)?);
    let source = Arc::new(HttpSource::new(&config.source)?);

    let ctx = CollectorContext {
        store: store.clone(),
        source,
    };

    let mut table = CommandTable::new();
    table
        .register(Arc::new(CollectCommand::new(ctx)))
        .register(Arc::new(ConsolidateCommand::new(store)));
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_without_codes_reaches_the_command() {
        // The usage error (exit 2) comes from `collect` itself, not clap.
        let cli = Cli::try_parse_from(["montanha", "collect"]).unwrap();
        assert_eq!(cli.command.into_call(), (CollectCommand::NAME, vec![]));
    }

    #[test]
    fn consolidate_takes_one_code() {
        let cli = Cli::try_parse_from(["montanha", "--debug", "consolidate", "almg"]).unwrap();
        assert!(cli.debug);
        assert_eq!(
            cli.command.into_call(),
            (ConsolidateCommand::NAME, vec!["almg".to_string()])
        );
        assert!(Cli::try_parse_from(["montanha", "consolidate"]).is_err());
    }
}
