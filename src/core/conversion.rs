//! Conversion of an amount from one currency into another

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::core::currency::{CurrencyCode, RateProvider, RateTable};
use crate::core::error::{ConversionError, InputError};

/// Decimal places shown to the user.
pub const DISPLAY_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub source: CurrencyCode,
    pub target: CurrencyCode,
    pub amount: Decimal,
}

impl ConversionRequest {
    pub fn new(source: CurrencyCode, target: CurrencyCode, amount: Decimal) -> Self {
        ConversionRequest {
            source,
            target,
            amount,
        }
    }

    /// Builds a request from raw form input.
    pub fn parse(source: &str, target: &str, amount: &str) -> Result<Self, ConversionError> {
        let source = source.parse::<CurrencyCode>()?;
        let target = target.parse::<CurrencyCode>()?;
        let amount = parse_amount(amount)?;
        Ok(ConversionRequest::new(source, target, amount))
    }
}

/// Parses a non-negative decimal amount, accepting plain or scientific notation.
pub fn parse_amount(raw: &str) -> Result<Decimal, ConversionError> {
    let trimmed = raw.trim();
    let invalid = || ConversionError::InvalidInput(InputError::Amount(trimmed.to_string()));

    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| invalid())?;
    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }
    if amount.is_sign_negative() {
        return Err(invalid());
    }
    Ok(amount)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub request: ConversionRequest,
    pub rate: Decimal,
    /// Unrounded `amount * rate`.
    pub value: Decimal,
    pub as_of: Option<String>,
}

impl Conversion {
    pub fn rounded(&self) -> Decimal {
        round_for_display(self.value)
    }

    pub fn display_value(&self) -> String {
        format_amount(self.rounded())
    }
}

pub type ConversionResult = Result<Conversion, ConversionError>;

pub fn round_for_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats a monetary amount with exactly two fraction digits.
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = round_for_display(value);
    rounded.rescale(DISPLAY_SCALE);
    rounded.to_string()
}

pub struct Converter<P: RateProvider> {
    provider: P,
}

impl<P: RateProvider> Converter<P> {
    pub fn new(provider: P) -> Self {
        Converter { provider }
    }

    #[cfg(test)]
    pub(crate) fn provider(&self) -> &P {
        &self.provider
    }

    #[instrument(
        name = "Convert",
        skip(self, request),
        fields(source = %request.source, target = %request.target)
    )]
    pub async fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        if request.amount.is_sign_negative() && !request.amount.is_zero() {
            return Err(ConversionError::InvalidInput(InputError::Amount(
                request.amount.to_string(),
            )));
        }

        if request.source == request.target {
            debug!("Same currency on both sides, skipping rate lookup");
            return Ok(Conversion {
                request: request.clone(),
                rate: Decimal::ONE,
                value: request.amount,
                as_of: None,
            });
        }

        let table = self.provider.fetch_rates(request.source).await?;
        let rate = table
            .rate(request.target)
            .ok_or(ConversionError::MissingRate {
                base: request.source,
                target: request.target,
            })?;

        let value = request
            .amount
            .checked_mul(rate)
            .ok_or(ConversionError::InvalidInput(InputError::Overflow))?;
        debug!(%rate, %value, "Converted amount");

        Ok(Conversion {
            request: request.clone(),
            rate,
            value,
            as_of: table.as_of,
        })
    }

    /// Parses raw input and converts it. Invalid input never reaches the provider.
    pub async fn convert_input(&self, source: &str, target: &str, amount: &str) -> ConversionResult {
        let request = ConversionRequest::parse(source, target, amount)?;
        self.convert(&request).await
    }

    pub async fn rates(&self, base: CurrencyCode) -> Result<RateTable, ConversionError> {
        self.provider.fetch_rates(base).await
    }
}
