pub mod cli;
pub mod core;
pub mod dashboard;
pub mod providers;
pub mod widgets;

use crate::core::config::AppConfig;
use crate::core::currency::Currency;
use crate::core::rates::RateProvider;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Convert {
        from: Option<Currency>,
        to: Option<Currency>,
        amount: Option<String>,
    },
    Ticker,
    Dashboard,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxdash starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider: Arc<dyn RateProvider> = Arc::new(
        providers::ExchangeRateApiProvider::new(
            &config.provider.base_url,
            config.provider.timeout(),
        )?,
    );

    match command {
        AppCommand::Convert { from, to, amount } => {
            cli::convert::run(
                &config.converter,
                from,
                to,
                amount.as_deref(),
                provider.as_ref(),
            )
            .await
        }
        AppCommand::Ticker => cli::ticker::run(&config.ticker, provider.as_ref()).await,
        AppCommand::Dashboard => cli::dashboard::run(provider, &config).await,
    }
}
