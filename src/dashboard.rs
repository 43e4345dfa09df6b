//! The dashboard page: one converter and one ticker driven side by side.
//!
//! Both widgets are owned by the task running [`Dashboard::run`]. Fetches are
//! kept in a `FuturesUnordered` polled by that same task, so widget state is
//! only ever touched between await points and never shared.
use crate::core::config::AppConfig;
use crate::core::currency::Currency;
use crate::core::rates::{RateProvider, RateTable};
use crate::widgets::converter::{ConversionState, Converter, RefreshTicket};
use crate::widgets::ticker::{self, Ticker, TickerState, TickerTicket};
use anyhow::{Result, anyhow};
use futures::StreamExt;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::FuturesUnordered;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

/// A line typed by the user while the dashboard is running.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    From(Currency),
    To(Currency),
    Amount(String),
    Swap,
    Refresh,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts
            .next()
            .ok_or_else(|| anyhow!("Empty command"))?
            .to_lowercase();
        let arg = parts.next();

        let command = match (verb.as_str(), arg) {
            ("from", Some(code)) => Command::From(code.parse()?),
            ("to", Some(code)) => Command::To(code.parse()?),
            ("amount", Some(value)) => Command::Amount(value.to_string()),
            ("swap", None) => Command::Swap,
            ("refresh" | "r", None) => Command::Refresh,
            ("quit" | "q" | "exit", None) => Command::Quit,
            _ => return Err(anyhow!("Unknown command: {}", s.trim())),
        };
        if parts.next().is_some() {
            return Err(anyhow!("Unknown command: {}", s.trim()));
        }
        Ok(command)
    }
}

/// Everything a renderer needs to draw one frame.
pub struct DashboardView<'a> {
    pub converter: &'a ConversionState,
    pub ticker: &'a TickerState,
    pub ticker_target: Currency,
    pub ticker_bases: &'a [Currency],
    pub notice: Option<&'a str>,
}

pub trait Renderer {
    fn render(&mut self, view: &DashboardView<'_>) -> Result<()>;
}

enum Completion {
    Conversion(RefreshTicket, Result<RateTable>),
    Prices(TickerTicket, Result<Vec<RateTable>>),
}

type InFlight = FuturesUnordered<BoxFuture<'static, Completion>>;

#[derive(Debug, PartialEq)]
enum Outcome {
    InputChanged,
    Refresh,
    Ignored,
    Quit,
}

pub struct Dashboard {
    provider: Arc<dyn RateProvider>,
    converter: Converter,
    ticker: Ticker,
    converter_period: Duration,
    ticker_period: Duration,
    notice: Option<String>,
}

impl Dashboard {
    pub fn new(
        provider: Arc<dyn RateProvider>,
        converter: Converter,
        ticker: Ticker,
        converter_period: Duration,
        ticker_period: Duration,
    ) -> Self {
        Self {
            provider,
            converter,
            ticker,
            converter_period,
            ticker_period,
            notice: None,
        }
    }

    pub fn from_config(provider: Arc<dyn RateProvider>, config: &AppConfig) -> Result<Self> {
        let converter = Converter::from_config(&config.converter)?;
        let ticker = Ticker::from_config(&config.ticker);
        Ok(Self::new(
            provider,
            converter,
            ticker,
            config.converter.refresh_interval(),
            config.ticker.refresh_interval(),
        ))
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    fn view(&self) -> DashboardView<'_> {
        DashboardView {
            converter: self.converter.state(),
            ticker: self.ticker.state(),
            ticker_target: self.ticker.target(),
            ticker_bases: self.ticker.bases(),
            notice: self.notice.as_deref(),
        }
    }

    fn spawn_conversion(&mut self, in_flight: &mut InFlight) {
        let Some(ticket) = self.converter.begin_refresh() else {
            return;
        };
        let provider = Arc::clone(&self.provider);
        in_flight.push(
            async move {
                let result = provider.fetch_rates(ticket.base().code()).await;
                Completion::Conversion(ticket, result)
            }
            .boxed(),
        );
    }

    fn spawn_prices(&mut self, in_flight: &mut InFlight) {
        let Some(ticket) = self.ticker.begin_refresh() else {
            return;
        };
        let provider = Arc::clone(&self.provider);
        in_flight.push(
            async move {
                let result = ticker::fetch_all(provider.as_ref(), ticket.bases()).await;
                Completion::Prices(ticket, result)
            }
            .boxed(),
        );
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Conversion(ticket, result) => {
                self.converter.complete_refresh(ticket, result);
            }
            Completion::Prices(ticket, result) => {
                self.ticker.complete_refresh(ticket, result);
            }
        }
    }

    fn handle_line(&mut self, line: &str) -> Outcome {
        self.notice = None;
        if line.trim().is_empty() {
            return Outcome::Ignored;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                self.notice = Some(e.to_string());
                return Outcome::Ignored;
            }
        };
        debug!(?command, "Handling command");

        let changed = match command {
            Command::From(currency) => self.converter.set_source(currency),
            Command::To(currency) => self.converter.set_target(currency),
            Command::Swap => self.converter.swap(),
            Command::Amount(raw) => match self.converter.set_amount(&raw) {
                Ok(changed) => {
                    let normalized = self.converter.commit_amount();
                    changed || normalized
                }
                Err(e) => {
                    self.notice = Some(e.to_string());
                    false
                }
            },
            Command::Refresh => {
                if self.converter.can_refresh_manually() {
                    return Outcome::Refresh;
                }
                self.notice = Some("Nothing to refresh yet".to_string());
                return Outcome::Ignored;
            }
            Command::Quit => return Outcome::Quit,
        };

        if changed {
            Outcome::InputChanged
        } else {
            Outcome::Ignored
        }
    }

    /// Runs until `quit` is entered, the command channel closes or `shutdown`
    /// resolves. Both widgets are torn down on return.
    pub async fn run<R, S>(
        &mut self,
        mut commands: mpsc::Receiver<String>,
        renderer: &mut R,
        shutdown: S,
    ) -> Result<()>
    where
        R: Renderer,
        S: Future<Output = ()>,
    {
        info!("Dashboard starting");
        tokio::pin!(shutdown);

        let mut converter_timer = time::interval(self.converter_period);
        converter_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticker_timer = time::interval(self.ticker_period);
        ticker_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight = InFlight::new();

        renderer.render(&self.view())?;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = converter_timer.tick() => {
                    if self.converter.is_refreshing() {
                        debug!("Conversion still in flight, skipping tick");
                    } else {
                        self.spawn_conversion(&mut in_flight);
                    }
                }
                _ = ticker_timer.tick() => {
                    if self.ticker.is_refreshing() {
                        debug!("Ticker prices still in flight, skipping tick");
                    } else {
                        self.spawn_prices(&mut in_flight);
                    }
                }
                Some(completion) = in_flight.next() => self.apply(completion),
                line = commands.recv() => {
                    let Some(line) = line else {
                        debug!("Command channel closed");
                        break;
                    };
                    match self.handle_line(&line) {
                        Outcome::InputChanged => {
                            self.spawn_conversion(&mut in_flight);
                            converter_timer.reset();
                        }
                        Outcome::Refresh => self.spawn_conversion(&mut in_flight),
                        Outcome::Ignored => {}
                        Outcome::Quit => break,
                    }
                }
            }
            renderer.render(&self.view())?;
        }

        self.converter.teardown();
        self.ticker.teardown();
        debug!(dropped = in_flight.len(), "Dashboard stopped");
        Ok(())
    }
}
