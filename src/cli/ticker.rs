use super::ui;
use crate::core::config::TickerConfig;
use crate::core::rates::RateProvider;
use crate::widgets::ticker::Ticker;
use anyhow::{Result, anyhow};

/// Fetches every tracked rate once and prints the ticker table.
pub async fn run(config: &TickerConfig, provider: &dyn RateProvider) -> Result<()> {
    let mut ticker = Ticker::from_config(config);

    let pb = ui::new_spinner("Loading prices...");
    ticker.refresh(provider).await;
    pb.finish_and_clear();

    let state = ticker.state();
    if let Some(error) = &state.error {
        return Err(anyhow!(error.clone()));
    }
    println!("{}", ui::ticker_panel(state, ticker.target(), ticker.bases()));
    Ok(())
}
