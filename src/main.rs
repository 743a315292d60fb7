use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxq::log::init_logging;
use rust_decimal::Decimal;

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

impl From<Commands> for fxq::AppCommand {
    fn from(cmd: Commands) -> fxq::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => fxq::AppCommand::Convert { amount, from, to },
            Commands::Rates => fxq::AppCommand::Rates,
            Commands::Refresh => fxq::AppCommand::Refresh,
            Commands::Preload { currencies } => fxq::AppCommand::Preload { currencies },
            Commands::Clear => fxq::AppCommand::Clear,
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
        amount: Decimal,
        from: String,
        to: String,
    },
    /// Display cached exchange rates
    Rates,
    /// Fetch fresh rate tables for the configured major currencies
    Refresh,
    /// Best-effort cache warm for specific base currencies
    Preload { currencies: Vec<String> },
    /// Delete all cached rates
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => fxq::run_command(cmd.into(), cli.config_path.as_deref()).await,
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

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = fxq::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
provider:
  base_url: "https://open.er-api.com"
  # api_key: "your-key"
  max_requests_per_hour: 60

major_currencies: ["USD", "EUR", "GBP", "JPY", "INR", "AUD", "CAD"]

# Cached rates are served without a refetch for this long
freshness_minutes: 60
# Persisted rates older than this are purged on startup
staleness_hours: 24
# Background refresh interval for long-running consumers
refresh_minutes: 30
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
