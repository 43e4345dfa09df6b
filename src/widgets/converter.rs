//! Currency conversion widget state and refresh logic.
use crate::core::config::ConverterConfig;
use crate::core::currency::Currency;
use crate::core::error::WidgetError;
use crate::core::rates::{RateProvider, RateTable};
use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionState {
    pub source: Currency,
    pub target: Currency,
    pub amount: String,
    /// Always set together with `converted`.
    pub rate: Option<f64>,
    pub converted: Option<f64>,
    pub last_update: Option<DateTime<Local>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ConversionState {
    /// True when a converted amount should be shown to the user.
    pub fn has_result(&self) -> bool {
        !self.loading && self.error.is_none() && self.rate.is_some() && self.converted.is_some()
    }
}

/// Captures the inputs of one refresh at the moment it was started.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshTicket {
    seq: u64,
    source: Currency,
    target: Currency,
    amount: f64,
}

impl RefreshTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The currency whose rate table has to be fetched.
    pub fn base(&self) -> Currency {
        self.source
    }
}

pub struct Converter {
    state: ConversionState,
    issued: u64,
    settled: u64,
    closed: bool,
}

/// Parses user input the way a numeric form field would accept it.
pub fn parse_amount(raw: &str) -> Result<f64, WidgetError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(WidgetError::InvalidAmount(trimmed.to_string())),
    }
}

impl Converter {
    pub fn new(source: Currency, target: Currency, amount: &str) -> Result<Self, WidgetError> {
        parse_amount(amount)?;
        Ok(Self {
            state: ConversionState {
                source,
                target,
                amount: amount.trim().to_string(),
                rate: None,
                converted: None,
                last_update: None,
                loading: false,
                error: None,
            },
            issued: 0,
            settled: 0,
            closed: false,
        })
    }

    pub fn from_config(config: &ConverterConfig) -> Result<Self, WidgetError> {
        Self::new(config.from, config.to, &config.amount)
    }

    pub fn state(&self) -> &ConversionState {
        &self.state
    }

    /// Returns true when the source actually changed.
    pub fn set_source(&mut self, currency: Currency) -> bool {
        if self.state.source == currency {
            return false;
        }
        self.state.source = currency;
        true
    }

    /// Returns true when the target actually changed.
    pub fn set_target(&mut self, currency: Currency) -> bool {
        if self.state.target == currency {
            return false;
        }
        self.state.target = currency;
        true
    }

    /// Exchanges source and target. Swapping a pair of identical currencies
    /// changes nothing and reports false.
    pub fn swap(&mut self) -> bool {
        if self.state.source == self.state.target {
            return false;
        }
        std::mem::swap(&mut self.state.source, &mut self.state.target);
        true
    }

    /// Replaces the raw amount text. Invalid input leaves the state untouched.
    pub fn set_amount(&mut self, raw: &str) -> Result<bool, WidgetError> {
        parse_amount(raw)?;
        let raw = raw.trim();
        if self.state.amount == raw {
            return Ok(false);
        }
        self.state.amount = raw.to_string();
        Ok(true)
    }

    /// Normalizes the amount to two decimal places, as happens when the
    /// amount field loses focus.
    pub fn commit_amount(&mut self) -> bool {
        let Ok(value) = parse_amount(&self.state.amount) else {
            return false;
        };
        let normalized = format!("{value:.2}");
        if normalized == self.state.amount {
            return false;
        }
        self.state.amount = normalized;
        true
    }

    /// True while the latest issued refresh has not completed yet.
    pub fn is_refreshing(&self) -> bool {
        self.settled < self.issued
    }

    /// Manual refresh is only offered while a result is on screen.
    pub fn can_refresh_manually(&self) -> bool {
        !self.closed && self.state.has_result()
    }

    /// Puts the widget into the loading state and issues a ticket for the
    /// request that is about to be made.
    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        if self.closed {
            return None;
        }
        let amount = match parse_amount(&self.state.amount) {
            Ok(amount) => amount,
            Err(e) => {
                warn!(error = %e, "Skipping refresh");
                return None;
            }
        };

        self.issued += 1;
        self.state.loading = true;
        self.state.error = None;
        debug!(
            seq = self.issued,
            source = %self.state.source,
            target = %self.state.target,
            "Refreshing exchange rate"
        );

        Some(RefreshTicket {
            seq: self.issued,
            source: self.state.source,
            target: self.state.target,
            amount,
        })
    }

    /// Applies the outcome of a fetch. Returns false if the result was
    /// discarded because a newer refresh was started or the widget was torn
    /// down.
    pub fn complete_refresh(&mut self, ticket: RefreshTicket, result: Result<RateTable>) -> bool {
        if self.closed {
            debug!(seq = ticket.seq, "Discarding rate table after teardown");
            return false;
        }
        if ticket.seq != self.issued {
            debug!(
                seq = ticket.seq,
                latest = self.issued,
                "Discarding stale rate table"
            );
            return false;
        }

        match result {
            Ok(table) => match table.rate(ticket.target.code()) {
                Some(rate) => {
                    self.state.rate = Some(rate);
                    self.state.converted = Some(ticket.amount * rate);
                    self.state.last_update = Some(Local::now());
                }
                None => {
                    warn!(base = %table.base, target = %ticket.target, "Target missing from rate table");
                    self.state.error =
                        Some(WidgetError::CurrencyNotFound(ticket.target.to_string()).to_string());
                }
            },
            Err(e) => {
                error!(error = %e, "Exchange rate fetch error");
                self.state.error = Some(WidgetError::FetchFailed.to_string());
            }
        }

        self.settled = ticket.seq;
        self.state.loading = false;
        true
    }

    /// Runs one complete refresh cycle against `provider`.
    pub async fn refresh(&mut self, provider: &dyn RateProvider) {
        let Some(ticket) = self.begin_refresh() else {
            return;
        };
        let result = provider.fetch_rates(ticket.base().code()).await;
        self.complete_refresh(ticket, result);
    }

    /// Stops the widget from accepting any further fetch results.
    pub fn teardown(&mut self) {
        self.closed = true;
    }
}
