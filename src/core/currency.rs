//! Currency codes, rate tables and the rate provider abstraction

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::core::error::{ConversionError, InputError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CurrencyCode {
    Pln,
    Eur,
    Usd,
    Chf,
    Gbp,
}

impl CurrencyCode {
    /// Supported currencies, in the order they are offered to the user.
    pub const ALL: [CurrencyCode; 5] = [
        CurrencyCode::Pln,
        CurrencyCode::Eur,
        CurrencyCode::Usd,
        CurrencyCode::Chf,
        CurrencyCode::Gbp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyCode::Pln => "PLN",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Usd => "USD",
            CurrencyCode::Chf => "CHF",
            CurrencyCode::Gbp => "GBP",
        }
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PLN" => Ok(CurrencyCode::Pln),
            "EUR" => Ok(CurrencyCode::Eur),
            "USD" => Ok(CurrencyCode::Usd),
            "CHF" => Ok(CurrencyCode::Chf),
            "GBP" => Ok(CurrencyCode::Gbp),
            _ => Err(ConversionError::InvalidInput(InputError::Currency(
                s.trim().to_string(),
            ))),
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> String {
        code.as_str().to_string()
    }
}

/// Rates for the supported currencies relative to one base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub base: CurrencyCode,
    /// Date the provider published these rates, if it said so.
    pub as_of: Option<String>,
    rates: BTreeMap<CurrencyCode, Decimal>,
}

impl RateTable {
    pub fn new(base: CurrencyCode) -> Self {
        RateTable {
            base,
            as_of: None,
            rates: BTreeMap::new(),
        }
    }

    pub fn with_as_of(mut self, as_of: Option<String>) -> Self {
        self.as_of = as_of;
        self
    }

    /// Records a rate. Rates must be positive; anything else is rejected.
    pub fn insert(&mut self, code: CurrencyCode, rate: Decimal) -> Result<(), ConversionError> {
        if rate <= Decimal::ZERO {
            return Err(ConversionError::ProviderError(format!(
                "non-positive rate {rate} for {code}"
            )));
        }
        self.rates.insert(code, rate);
        Ok(())
    }

    pub fn rate(&self, code: CurrencyCode) -> Option<Decimal> {
        self.rates.get(&code).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches the current rates relative to `base`. One remote call per invocation.
    async fn fetch_rates(&self, base: CurrencyCode) -> Result<RateTable, ConversionError>;
}
