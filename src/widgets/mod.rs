//! The two dashboard widgets.
//!
//! Each widget owns its state outright. A refresh is split into
//! `begin_refresh`, which marks the state as loading and hands out a ticket,
//! and `complete_refresh`, which applies a fetch result only if its ticket is
//! still the latest one issued and the widget has not been torn down.

pub mod converter;
pub mod ticker;

pub use converter::{ConversionState, Converter, RefreshTicket};
pub use ticker::{ChangeSimulator, RandomChange, Ticker, TickerState, TickerTicket, TrackedPrice};
