use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxconv::core::log::init_logging;

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

impl From<Commands> for fxconv::AppCommand {
    fn from(cmd: Commands) -> fxconv::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => {
                fxconv::AppCommand::Convert { amount, from, to }
            }
            Commands::Rates { base } => fxconv::AppCommand::Rates { base },
            Commands::Form => fxconv::AppCommand::Form,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Amount in the source currency
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Source currency (PLN, EUR, USD, CHF, GBP)
        #[arg(short, long)]
        from: Option<String>,
        /// Target currency (PLN, EUR, USD, CHF, GBP)
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Show current exchange rates for a base currency
    Rates {
        /// Base currency (PLN, EUR, USD, CHF, GBP)
        #[arg(short, long)]
        base: Option<String>,
    },
    /// Interactive conversion form
    Form,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxconv::cli::setup::setup(),
        Some(cmd) => fxconv::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
