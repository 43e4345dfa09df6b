use crate::core::currency::Currency;
use crate::widgets::converter::ConversionState;
use crate::widgets::ticker::{TickerState, TrackedPrice};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Result,
    Error,
    Subtle,
    Loading,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Result => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
        StyleType::Loading => style(text).blue(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn change_text(price: &TrackedPrice) -> String {
    let arrow = if price.is_up() { '↑' } else { '↓' };
    format!("{arrow} {:.2}%", price.change_percent.abs())
}

/// Creates a cell for the simulated change, green when up and red when down.
pub fn change_cell(price: &TrackedPrice) -> Cell {
    let color = if price.is_up() { Color::Green } else { Color::Red };
    Cell::new(change_text(price))
        .fg(color)
        .add_attribute(Attribute::Bold)
        .set_alignment(CellAlignment::Right)
}

/// Plain-text lines of the converter panel, without styling.
pub fn converter_lines(state: &ConversionState) -> Vec<String> {
    if state.loading {
        return vec!["Loading exchange rate...".to_string()];
    }
    if let Some(error) = &state.error {
        return vec![error.clone()];
    }
    let (Some(rate), Some(converted)) = (state.rate, state.converted) else {
        return Vec::new();
    };

    let mut lines = vec![
        format!("{} {} =", state.amount, state.source),
        format!("{converted:.2} {}", state.target),
        format!("1 {} = {rate:.4} {}", state.source, state.target),
    ];
    if let Some(updated) = state.last_update {
        lines.push(format!("Last updated: {}", updated.format("%H:%M:%S")));
    }
    lines
}

/// Renders the converter panel with terminal styling.
pub fn converter_panel(state: &ConversionState) -> String {
    let mut out = vec![
        style_text("Currency Converter", StyleType::Title),
        style_text(
            &format!("{} → {}", state.source, state.target),
            StyleType::Subtle,
        ),
        String::new(),
    ];

    let lines = converter_lines(state);
    if state.loading {
        out.extend(lines.iter().map(|l| style_text(l, StyleType::Loading)));
    } else if state.error.is_some() {
        out.extend(lines.iter().map(|l| style_text(l, StyleType::Error)));
    } else {
        for (i, line) in lines.iter().enumerate() {
            let styled = match i {
                1 => style_text(line, StyleType::Result),
                _ => style_text(line, StyleType::Subtle),
            };
            out.push(styled);
        }
    }
    out.join("\n")
}

fn price_row(price: &TrackedPrice, target: Currency) -> Vec<Cell> {
    vec![
        Cell::new(format!("{} → {}", price.base, target)).add_attribute(Attribute::Bold),
        Cell::new(format!("1 {} = {:.4} {}", price.base, price.rate, target)),
        Cell::new(format!("{:.2}", price.rate))
            .fg(Color::Magenta)
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
        change_cell(price),
    ]
}

/// Renders the ticker as a table, or the loading/error line in its place.
pub fn ticker_panel(state: &TickerState, target: Currency, bases: &[Currency]) -> String {
    let pairs = bases
        .iter()
        .map(|b| format!("{b}→{target}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut out = vec![
        style_text(&format!("Live {target} Exchange Rates"), StyleType::Title),
        style_text(&format!("Tracking: {pairs}"), StyleType::Subtle),
        String::new(),
    ];

    if state.loading {
        out.push(style_text("Loading prices...", StyleType::Loading));
    } else if let Some(error) = &state.error {
        out.push(style_text(error, StyleType::Error));
    } else {
        let mut table = new_styled_table();
        table.set_header(vec![
            header_cell("Pair"),
            header_cell("Rate"),
            header_cell(target.code()),
            header_cell("Change"),
        ]);
        for price in &state.prices {
            table.add_row(price_row(price, target));
        }
        out.push(table.to_string());
    }
    out.join("\n")
}

/// Creates a spinner shown while a one-shot fetch is in flight.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn converted_state() -> ConversionState {
        ConversionState {
            source: Currency::Usd,
            target: Currency::Eur,
            amount: "100".to_string(),
            rate: Some(0.92),
            converted: Some(92.0),
            last_update: Some(Local::now()),
            loading: false,
            error: None,
        }
    }

    #[test]
    fn test_converter_lines_round_amount_and_rate() {
        let lines = converter_lines(&converted_state());
        assert_eq!(lines[0], "100 USD =");
        assert_eq!(lines[1], "92.00 EUR");
        assert_eq!(lines[2], "1 USD = 0.9200 EUR");
        assert!(lines[3].starts_with("Last updated: "));
    }

    #[test]
    fn test_converter_lines_gate_on_loading_and_error() {
        let mut state = converted_state();
        state.loading = true;
        assert_eq!(converter_lines(&state), vec!["Loading exchange rate..."]);

        state.loading = false;
        state.error = Some("Currency not found".to_string());
        assert_eq!(converter_lines(&state), vec!["Currency not found"]);

        state.error = None;
        state.rate = None;
        state.converted = None;
        assert!(converter_lines(&state).is_empty());
    }

    fn eur_price(change_percent: f64) -> TrackedPrice {
        TrackedPrice {
            base: Currency::Eur,
            rate: 395.0,
            change_percent,
            timestamp: Local::now(),
        }
    }

    #[test]
    fn test_change_text() {
        assert_eq!(change_text(&eur_price(0.1234)), "↑ 0.12%");
        assert_eq!(change_text(&eur_price(0.0)), "↑ 0.00%");
        assert_eq!(change_text(&eur_price(-0.2)), "↓ 0.20%");
    }

    #[test]
    fn test_change_cell_agrees_with_direction() {
        for change in [0.0, 0.2, -0.0, -0.2] {
            let price = eur_price(change);
            let cell = change_cell(&price);
            let arrow = if price.is_up() { '↑' } else { '↓' };
            assert!(cell.content().starts_with(arrow), "{change}");
        }
    }

    #[test]
    fn test_ticker_panel_shows_only_error() {
        let state = TickerState {
            prices: vec![eur_price(0.1)],
            loading: false,
            error: Some("Failed to load HUF rates".to_string()),
        };
        let panel = ticker_panel(&state, Currency::Huf, &[Currency::Eur]);
        assert!(panel.contains("Failed to load HUF rates"));
        assert!(!panel.contains("395.00"));
    }

    #[test]
    fn test_ticker_panel_lists_prices() {
        let state = TickerState {
            prices: vec![TrackedPrice {
                base: Currency::Ron,
                rate: 79.1234,
                change_percent: -0.05,
                timestamp: Local::now(),
            }],
            loading: false,
            error: None,
        };
        let panel = ticker_panel(&state, Currency::Huf, &[Currency::Ron]);
        assert!(panel.contains("Tracking: RON→HUF"));
        assert!(panel.contains("1 RON = 79.1234 HUF"));
        assert!(panel.contains("79.12"));
        assert!(panel.contains("↓ 0.05%"));
    }
}
