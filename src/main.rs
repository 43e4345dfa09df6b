use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxdash::core::currency::Currency;
use fxdash::core::log::init_logging;

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

impl From<Commands> for fxdash::AppCommand {
    fn from(cmd: Commands) -> fxdash::AppCommand {
        match cmd {
            Commands::Convert { from, to, amount } => {
                fxdash::AppCommand::Convert { from, to, amount }
            }
            Commands::Ticker => fxdash::AppCommand::Ticker,
            Commands::Dashboard => fxdash::AppCommand::Dashboard,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount once at the latest rate
    Convert {
        /// Currency to convert from
        #[arg(short, long)]
        from: Option<Currency>,
        /// Currency to convert to
        #[arg(short, long)]
        to: Option<Currency>,
        /// Amount to convert
        amount: Option<String>,
    },
    /// Display the tracked rates once
    Ticker,
    /// Run the live converter and ticker until quit
    Dashboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fxdash::cli::setup::setup_at_path(path),
            None => fxdash::cli::setup::setup(),
        },
        Some(cmd) => fxdash::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
