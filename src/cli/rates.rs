use anyhow::{Result, anyhow};
use comfy_table::{Cell, Table};

use crate::cli::ui::{
    StyleType, header_cell, new_spinner, new_styled_table, rate_cell, style_text, user_message,
};
use crate::core::conversion::Converter;
use crate::core::currency::{CurrencyCode, RateProvider, RateTable};

/// Builds a table of rates for every supported currency other than the base.
pub fn build_rates_table(rates: &RateTable) -> Table {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Currency"),
        header_cell(&format!("1 {} buys", rates.base)),
        header_cell(&format!("In {}", rates.base)),
    ]);

    for code in CurrencyCode::ALL {
        if code == rates.base {
            continue;
        }
        match rates.rate(code) {
            Some(rate) => {
                let inverse = rate_cell(rust_decimal::Decimal::ONE / rate);
                table.add_row(vec![Cell::new(code), rate_cell(rate), inverse]);
            }
            None => {
                table.add_row(vec![Cell::new(code), Cell::new("N/A"), Cell::new("N/A")]);
            }
        }
    }
    table
}

pub async fn run<P: RateProvider>(converter: &Converter<P>, base: &str) -> Result<RateTable> {
    let base = base
        .parse::<CurrencyCode>()
        .map_err(|e| anyhow!(user_message(&e)))?;

    let spinner = new_spinner("Fetching exchange rates...");
    let result = converter.rates(base).await;
    spinner.finish_and_clear();

    let rates = result.map_err(|e| anyhow!(user_message(&e)))?;

    println!(
        "\n{}",
        style_text(&format!("Exchange rates for {base}"), StyleType::Title)
    );
    println!("{}", build_rates_table(&rates));
    if let Some(as_of) = &rates.as_of {
        println!("{}", style_text(&format!("As of {as_of}"), StyleType::Subtle));
    }
    Ok(rates)
}
