//! Live rate ticker: a fixed set of base currencies quoted against one target.
use crate::core::config::TickerConfig;
use crate::core::currency::Currency;
use crate::core::error::WidgetError;
use crate::core::rates::{RateProvider, RateTable};
use anyhow::Result;
use chrono::{DateTime, Local};
use futures::future::join_all;
use rand::Rng;
use tracing::{debug, error};

/// Source of the cosmetic "change" figure shown next to each rate.
///
/// The value is not derived from market data.
pub trait ChangeSimulator: Send {
    /// A percentage in `[-0.25, 0.25)`.
    fn next_change(&mut self) -> f64;
}

/// Uniformly random placeholder change.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomChange;

impl ChangeSimulator for RandomChange {
    fn next_change(&mut self) -> f64 {
        rand::rng().random_range(-0.25..0.25)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPrice {
    pub base: Currency,
    pub rate: f64,
    pub change_percent: f64,
    pub timestamp: DateTime<Local>,
}

impl TrackedPrice {
    pub fn is_up(&self) -> bool {
        self.change_percent >= 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerState {
    pub prices: Vec<TrackedPrice>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerTicket {
    seq: u64,
    bases: Vec<Currency>,
}

impl TickerTicket {
    pub fn bases(&self) -> &[Currency] {
        &self.bases
    }
}

pub struct Ticker {
    target: Currency,
    bases: Vec<Currency>,
    state: TickerState,
    simulator: Box<dyn ChangeSimulator>,
    issued: u64,
    settled: u64,
    closed: bool,
}

/// Fetches the rate table of every base concurrently. Any single failure
/// fails the whole batch.
pub async fn fetch_all(provider: &dyn RateProvider, bases: &[Currency]) -> Result<Vec<RateTable>> {
    let futures = bases.iter().map(|base| provider.fetch_rates(base.code()));
    join_all(futures).await.into_iter().collect()
}

impl Ticker {
    pub fn new(target: Currency, bases: Vec<Currency>) -> Self {
        Self::with_simulator(target, bases, Box::new(RandomChange))
    }

    pub fn from_config(config: &TickerConfig) -> Self {
        Self::new(config.target, config.bases.clone())
    }

    pub fn with_simulator(
        target: Currency,
        bases: Vec<Currency>,
        simulator: Box<dyn ChangeSimulator>,
    ) -> Self {
        Self {
            target,
            bases,
            state: TickerState {
                prices: Vec::new(),
                loading: true,
                error: None,
            },
            simulator,
            issued: 0,
            settled: 0,
            closed: false,
        }
    }

    pub fn target(&self) -> Currency {
        self.target
    }

    pub fn bases(&self) -> &[Currency] {
        &self.bases
    }

    pub fn state(&self) -> &TickerState {
        &self.state
    }

    /// True while the latest issued refresh has not completed yet.
    pub fn is_refreshing(&self) -> bool {
        self.settled < self.issued
    }

    pub fn begin_refresh(&mut self) -> Option<TickerTicket> {
        if self.closed {
            return None;
        }
        self.issued += 1;
        self.state.loading = true;
        debug!(seq = self.issued, target = %self.target, "Refreshing ticker prices");
        Some(TickerTicket {
            seq: self.issued,
            bases: self.bases.clone(),
        })
    }

    /// Replaces the whole price list on success. On failure the previous
    /// list is kept as is. Returns false if the result was discarded.
    pub fn complete_refresh(
        &mut self,
        ticket: TickerTicket,
        result: Result<Vec<RateTable>>,
    ) -> bool {
        if self.closed || ticket.seq != self.issued {
            debug!(seq = ticket.seq, latest = self.issued, "Discarding ticker result");
            return false;
        }

        match result {
            Ok(tables) => {
                let now = Local::now();
                let target = self.target.code();
                let prices: Vec<TrackedPrice> = ticket
                    .bases
                    .iter()
                    .zip(tables.iter())
                    .map(|(base, table)| TrackedPrice {
                        base: *base,
                        rate: table.rate(target).unwrap_or(0.0),
                        change_percent: self.simulator.next_change(),
                        timestamp: now,
                    })
                    .collect();
                self.state.prices = prices;
                self.state.error = None;
            }
            Err(e) => {
                error!(error = %e, target = %self.target, "Ticker price fetch error");
                self.state.error = Some(WidgetError::TickerFailed(self.target.to_string()).to_string());
            }
        }

        self.settled = ticket.seq;
        self.state.loading = false;
        true
    }

    pub async fn refresh(&mut self, provider: &dyn RateProvider) {
        let Some(ticket) = self.begin_refresh() else {
            return;
        };
        let result = fetch_all(provider, ticket.bases()).await;
        self.complete_refresh(ticket, result);
    }

    pub fn teardown(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::testing::StaticRateProvider;

    struct FixedChange(f64);

    impl ChangeSimulator for FixedChange {
        fn next_change(&mut self) -> f64 {
            self.0
        }
    }

    fn huf_ticker(change: f64) -> Ticker {
        Ticker::with_simulator(
            Currency::Huf,
            vec![Currency::Eur, Currency::Usd, Currency::Ron],
            Box::new(FixedChange(change)),
        )
    }

    fn healthy_provider() -> StaticRateProvider {
        StaticRateProvider::new()
            .with_rates("EUR", &[("HUF", 395.12), ("USD", 1.08)])
            .with_rates("USD", &[("HUF", 361.4), ("EUR", 0.92)])
            .with_rates("RON", &[("HUF", 79.3)])
    }

    #[test]
    fn test_starts_loading() {
        let ticker = huf_ticker(0.1);
        assert!(ticker.state().loading);
        assert!(ticker.state().prices.is_empty());
    }

    #[tokio::test]
    async fn test_prices_follow_configured_order() {
        let provider = healthy_provider();
        let mut ticker = huf_ticker(0.1);

        ticker.refresh(&provider).await;

        let state = ticker.state();
        assert!(!state.loading);
        assert!(state.error.is_none());
        let bases: Vec<_> = state.prices.iter().map(|p| p.base).collect();
        assert_eq!(bases, vec![Currency::Eur, Currency::Usd, Currency::Ron]);
        let rates: Vec<_> = state.prices.iter().map(|p| p.rate).collect();
        // Not sorted by rate.
        assert_eq!(rates, vec![395.12, 361.4, 79.3]);
        assert!(state.prices.iter().all(|p| p.change_percent == 0.1));
    }

    #[tokio::test]
    async fn test_missing_target_defaults_to_zero() {
        let provider = healthy_provider().with_rates("RON", &[("EUR", 0.2)]);
        let mut ticker = huf_ticker(0.0);

        ticker.refresh(&provider).await;

        assert!(ticker.state().error.is_none());
        assert_eq!(ticker.state().prices[2].rate, 0.0);
    }

    #[tokio::test]
    async fn test_single_failure_fails_the_whole_cycle() {
        let mut ticker = huf_ticker(-0.1);
        ticker.refresh(&healthy_provider()).await;
        let before = ticker.state().prices.clone();
        assert_eq!(before.len(), 3);

        let failing = healthy_provider().with_failure("USD", "HTTP error: 503");
        ticker.refresh(&failing).await;

        let state = ticker.state();
        assert_eq!(state.error.as_deref(), Some("Failed to load HUF rates"));
        assert!(!state.loading);
        assert_eq!(state.prices, before);
        // Every base was still requested.
        assert_eq!(failing.calls_for("EUR"), 1);
        assert_eq!(failing.calls_for("RON"), 1);
    }

    #[tokio::test]
    async fn test_success_after_failure_clears_error() {
        let mut ticker = huf_ticker(0.2);
        ticker
            .refresh(&healthy_provider().with_failure("EUR", "timeout"))
            .await;
        assert!(ticker.state().error.is_some());
        assert!(ticker.state().prices.is_empty());

        ticker.refresh(&healthy_provider()).await;
        assert!(ticker.state().error.is_none());
        assert_eq!(ticker.state().prices.len(), 3);
    }

    #[tokio::test]
    async fn test_stale_and_torn_down_results_are_discarded() {
        let provider = healthy_provider();
        let mut ticker = huf_ticker(0.0);
        let first = ticker.begin_refresh().unwrap();
        let second = ticker.begin_refresh().unwrap();

        let tables = fetch_all(&provider, first.bases()).await;
        assert!(!ticker.complete_refresh(first, tables));
        assert!(ticker.state().loading);
        assert!(ticker.is_refreshing());

        ticker.teardown();
        let tables = fetch_all(&provider, second.bases()).await;
        assert!(!ticker.complete_refresh(second, tables));
        assert!(ticker.state().prices.is_empty());
        assert!(ticker.begin_refresh().is_none());
    }

    #[test]
    fn test_random_change_stays_in_range() {
        let mut simulator = RandomChange;
        for _ in 0..1000 {
            let change = simulator.next_change();
            assert!((-0.25..0.25).contains(&change));
        }
    }

    #[test]
    fn test_direction_follows_sign() {
        let price = |change_percent| TrackedPrice {
            base: Currency::Eur,
            rate: 1.0,
            change_percent,
            timestamp: Local::now(),
        };
        assert!(price(0.0).is_up());
        assert!(price(0.12).is_up());
        assert!(!price(-0.01).is_up());
    }
}
