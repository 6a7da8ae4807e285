use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use findash::core::log::init_logging;
use std::time::Duration;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch once and display the dashboard
    Show,
    /// Refresh the dashboard periodically until interrupted
    Watch {
        /// Seconds between refreshes
        #[arg(short, long, default_value_t = 60)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => findash::cli::setup::setup(),
        Some(Commands::Show) => {
            findash::run_command(findash::AppCommand::Show, cli.config_path.as_deref()).await
        }
        Some(Commands::Watch { interval }) => {
            let command = findash::AppCommand::Watch {
                interval: Duration::from_secs(interval.max(1)),
            };
            findash::run_command(command, cli.config_path.as_deref()).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
