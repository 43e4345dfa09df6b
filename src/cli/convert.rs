use super::ui;
use crate::core::config::ConverterConfig;
use crate::core::currency::Currency;
use crate::core::rates::RateProvider;
use crate::widgets::converter::Converter;
use anyhow::{Result, anyhow};

/// Fetches the current rate once and prints the converter panel.
pub async fn run(
    config: &ConverterConfig,
    from: Option<Currency>,
    to: Option<Currency>,
    amount: Option<&str>,
    provider: &dyn RateProvider,
) -> Result<()> {
    let mut converter = Converter::new(
        from.unwrap_or(config.from),
        to.unwrap_or(config.to),
        amount.unwrap_or(config.amount.as_str()),
    )?;
    converter.commit_amount();

    let pb = ui::new_spinner("Loading exchange rate...");
    converter.refresh(provider).await;
    pb.finish_and_clear();

    let state = converter.state();
    if let Some(error) = &state.error {
        return Err(anyhow!(error.clone()));
    }
    println!("{}", ui::converter_panel(state));
    Ok(())
}
