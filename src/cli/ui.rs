use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::time::Duration;

use crate::core::currency::CurrencyCode;
use crate::core::error::{ConversionError, InputError};

/// Decimal places used when showing a unit rate.
pub const RATE_SCALE: u32 = 4;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Result,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Result => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
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

pub fn rate_cell(rate: Decimal) -> Cell {
    Cell::new(format_rate(rate)).set_alignment(CellAlignment::Right)
}

pub fn format_rate(rate: Decimal) -> String {
    let mut rounded = rate.round_dp(RATE_SCALE);
    rounded.rescale(RATE_SCALE);
    rounded.to_string()
}

/// Spinner shown while a request to the rate service is in flight.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Human readable text for a failed conversion.
pub fn user_message(err: &ConversionError) -> String {
    match err {
        ConversionError::InvalidInput(InputError::Amount(_)) => {
            "Please enter a valid amount.".to_string()
        }
        ConversionError::InvalidInput(InputError::Currency(code)) => {
            let supported: Vec<&str> = CurrencyCode::ALL.iter().map(|c| c.as_str()).collect();
            format!(
                "Unsupported currency: {code}. Choose one of {}.",
                supported.join(", ")
            )
        }
        ConversionError::InvalidInput(InputError::Overflow) => {
            "The amount is too large to convert.".to_string()
        }
        ConversionError::NetworkFailure(detail) => {
            format!("Could not reach the exchange rate service: {detail}")
        }
        ConversionError::ProviderError(detail) => {
            format!("The exchange rate service returned an invalid response: {detail}")
        }
        ConversionError::MissingRate { base, target } => {
            format!("The exchange rate service has no {base} → {target} rate.")
        }
    }
}
