pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod manager;
pub mod providers;
pub mod rate_provider;
pub mod store;
pub mod ui;

use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::manager::{CurrencyManager, ManagerOptions};
use crate::providers::OpenExchangeProvider;
use crate::store::{Prefs, RateStore};

pub enum AppCommand {
    Convert {
        amount: Decimal,
        from: String,
        to: String,
    },
    Rates,
    Refresh,
    Preload {
        currencies: Vec<String>,
    },
    Clear,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let manager = build_manager(&config)?;
    let loaded = manager.load()?;
    debug!(loaded, "Manager ready");

    match command {
        AppCommand::Convert { amount, from, to } => convert(&manager, amount, &from, &to).await,
        AppCommand::Rates => display_rates(&manager),
        AppCommand::Refresh => refresh(&manager).await,
        AppCommand::Preload { currencies } => {
            manager.preload(&currencies).await;
            println!("Warmed cache for {} currencies.", currencies.len());
            Ok(())
        }
        AppCommand::Clear => {
            manager.clear_cache()?;
            println!("Cleared cached exchange rates.");
            Ok(())
        }
    }
}

fn build_manager(config: &AppConfig) -> Result<CurrencyManager> {
    let provider = Arc::new(OpenExchangeProvider::new(
        &config.provider.base_url,
        config.provider.api_key.as_deref(),
        config.provider.max_requests_per_hour,
    ));

    let cache_dir = config.cache_dir()?;
    let store = RateStore::open(&cache_dir.join("rates"), config.staleness())
        .context("Failed to open rate cache")?;
    let prefs = Prefs::new(&cache_dir.join("prefs.json"));

    let options = ManagerOptions {
        freshness: config.freshness(),
        major_currencies: config.major_currencies.clone(),
        refresh_interval: config.refresh_interval(),
    };

    Ok(CurrencyManager::new(provider, store, prefs, options))
}

async fn convert(manager: &CurrencyManager, amount: Decimal, from: &str, to: &str) -> Result<()> {
    let rate = manager
        .get_rate(from, to)
        .await
        .with_context(|| format!("Failed to convert {from} to {to}"))?;
    let converted = (amount * rate).round_dp(4);

    println!(
        "{} {} = {} {}",
        amount,
        from.to_uppercase(),
        ui::style_text(&converted.to_string(), ui::StyleType::Value),
        to.to_uppercase()
    );

    if let Some(cached) = manager.get_cached_rate(from, to) {
        let detail = format!(
            "rate {} via {}, fetched {}",
            cached.rate.round_dp(6),
            cached.source,
            cached.timestamp.format("%Y-%m-%d %H:%M UTC")
        );
        println!("{}", ui::style_text(&detail, ui::StyleType::Subtle));
    }

    Ok(())
}

fn display_rates(manager: &CurrencyManager) -> Result<()> {
    let rates = manager.cached_rates();
    if rates.is_empty() {
        println!("No cached rates. Run `fxq refresh` to fetch them.");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("Age"),
        ui::header_cell("Source"),
    ]);

    for rate in &rates {
        let age = rate.age();
        let age_text = if age.num_hours() > 0 {
            format!("{}h {}m", age.num_hours(), age.num_minutes() % 60)
        } else {
            format!("{}m", age.num_minutes())
        };
        table.add_row(vec![
            comfy_table::Cell::new(rate.pair().to_string()),
            ui::value_cell(&rate.rate.round_dp(6).to_string()),
            ui::value_cell(&age_text),
            comfy_table::Cell::new(&rate.source),
        ]);
    }

    println!("{}", ui::style_text("Cached exchange rates", ui::StyleType::Title));
    println!("{table}");

    if let Some(at) = manager.current_status().last_updated {
        let footer = format!("Last full refresh: {}", at.format("%Y-%m-%d %H:%M UTC"));
        println!("{}", ui::style_text(&footer, ui::StyleType::Subtle));
    }

    Ok(())
}

async fn refresh(manager: &CurrencyManager) -> Result<()> {
    let spinner = ui::new_spinner("Refreshing exchange rates...");
    manager.refresh_all().await;
    spinner.finish_and_clear();

    let status = manager.current_status();
    if let Some(message) = status.error_message {
        bail!("Refresh failed: {message}");
    }

    let count = manager.cached_rates().len();
    println!(
        "Refreshed {} rates.",
        ui::style_text(&count.to_string(), ui::StyleType::Value)
    );
    Ok(())
}
