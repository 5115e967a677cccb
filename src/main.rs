use anyhow::Result;
use balam::core::log::init_logging;
use balam::core::{Amount, Currency};
use clap::{CommandFactory, Parser, Subcommand};

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

impl From<Commands> for balam::AppCommand {
    fn from(cmd: Commands) -> balam::AppCommand {
        match cmd {
            Commands::Quote { amount, currency } => balam::AppCommand::Quote { amount, currency },
            Commands::Form => balam::AppCommand::Form,
            Commands::LastQuoteId => balam::AppCommand::LastQuoteId,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch a single quote and display it
    Quote {
        /// Amount to send in USD (3 to 999)
        #[arg(short, long)]
        amount: Option<Amount>,
        /// Currency to receive (MXN or COP)
        #[arg(short = 'q', long)]
        currency: Option<Currency>,
    },
    /// Open the interactive quote form
    Form,
    /// Print the id of the last quote fetched
    LastQuoteId,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => balam::cli::setup::setup(),
        Some(cmd) => balam::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
