use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use vantafx::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Use built-in rates instead of calling providers
    #[arg(long, global = true, env = "VANTAFX_OFFLINE")]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Source currency code, e.g. USD
        #[arg(long = "from")]
        from: String,
        /// Target currency code, e.g. UZS
        #[arg(long = "to")]
        to: String,
        /// Amount to convert
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,
        /// Ignore cached rates
        #[arg(long)]
        refresh: bool,
    },
    /// Show exchange rates relative to a base currency
    Rates {
        /// Base currency, defaults to the display currency
        #[arg(long)]
        base: Option<String>,
        /// Ignore cached rates
        #[arg(long)]
        refresh: bool,
    },
    /// List supported currency codes
    List,
    /// Format an amount for display
    Format {
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        /// Currency code, defaults to the display currency
        #[arg(long)]
        currency: Option<String>,
        /// Language tag, e.g. en or uz
        #[arg(long)]
        lang: Option<String>,
    },
}

impl Commands {
    fn into_app_command(self) -> Option<vantafx::AppCommand> {
        Some(match self {
            Commands::Setup => return None,
            Commands::Convert {
                from,
                to,
                amount,
                refresh,
            } => vantafx::AppCommand::Convert {
                from,
                to,
                amount,
                refresh,
            },
            Commands::Rates { base, refresh } => vantafx::AppCommand::Rates { base, refresh },
            Commands::List => vantafx::AppCommand::List,
            Commands::Format {
                amount,
                currency,
                lang,
            } => vantafx::AppCommand::Format {
                amount,
                currency,
                language: lang,
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let overrides = vantafx::Overrides {
        offline: cli.offline,
    };
    let result = match cli.command.map(Commands::into_app_command) {
        Some(None) => vantafx::cli::setup::setup(),
        Some(Some(cmd)) => vantafx::run_command(cmd, cli.config_path.as_deref(), overrides).await,
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
