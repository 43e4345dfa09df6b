//! Errors surfaced to the user by the dashboard widgets.
//!
//! The display strings are what the widgets show. The underlying causes are
//! only ever logged.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    /// The rate table was fetched but has no entry for the requested code.
    #[error("Currency not found")]
    CurrencyNotFound(String),

    /// The converter's request failed in transport or its body could not be parsed.
    #[error("Failed to fetch exchange rates. Please try again.")]
    FetchFailed,

    /// At least one of the ticker's concurrent requests failed.
    #[error("Failed to load {0} rates")]
    TickerFailed(String),

    /// The amount entered is not a usable number.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            WidgetError::CurrencyNotFound("ZZZ".into()).to_string(),
            "Currency not found"
        );
        assert_eq!(
            WidgetError::FetchFailed.to_string(),
            "Failed to fetch exchange rates. Please try again."
        );
        assert_eq!(
            WidgetError::TickerFailed("HUF".into()).to_string(),
            "Failed to load HUF rates"
        );
    }
}
