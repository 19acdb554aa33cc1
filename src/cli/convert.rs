use anyhow::{Result, anyhow};

use crate::cli::ui::{StyleType, format_rate, new_spinner, style_text, user_message};
use crate::core::conversion::{Conversion, Converter, format_amount};
use crate::core::currency::RateProvider;

/// Renders a successful conversion as the lines shown to the user.
pub fn render_conversion(conversion: &Conversion) -> Vec<String> {
    let request = &conversion.request;
    let mut lines = vec![
        style_text(
            &format!(
                "{} {} = {} {}",
                format_amount(request.amount),
                request.source,
                conversion.display_value(),
                request.target
            ),
            StyleType::Result,
        ),
        format!(
            "1 {} = {} {}",
            request.source,
            format_rate(conversion.rate),
            request.target
        ),
    ];
    if let Some(as_of) = &conversion.as_of {
        lines.push(style_text(
            &format!("Exchange rates as of {as_of}"),
            StyleType::Subtle,
        ));
    }
    lines
}

/// Converts once and prints the outcome. Failures become a readable error.
pub async fn run<P: RateProvider>(
    converter: &Converter<P>,
    amount: &str,
    source: &str,
    target: &str,
) -> Result<Conversion> {
    let spinner = new_spinner("Fetching exchange rates...");
    let result = converter.convert_input(source, target, amount).await;
    spinner.finish_and_clear();

    match result {
        Ok(conversion) => {
            for line in render_conversion(&conversion) {
                println!("{line}");
            }
            Ok(conversion)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Conversion failed");
            Err(anyhow!(user_message(&e)))
        }
    }
}
