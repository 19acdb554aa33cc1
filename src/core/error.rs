//! Failure kinds surfaced by the conversion core

use crate::core::currency::CurrencyCode;

/// What exactly was wrong with user supplied input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Amount text is not a number, or the number is negative.
    Amount(String),
    /// Currency code outside the supported set.
    Currency(String),
    /// `amount * rate` does not fit in a decimal.
    Overflow,
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::Amount(raw) => write!(f, "invalid amount '{raw}'"),
            InputError::Currency(raw) => write!(f, "unsupported currency '{raw}'"),
            InputError::Overflow => write!(f, "amount is too large"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Invalid input: {0}")]
    InvalidInput(InputError),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Rate for {target} missing from {base} rate table")]
    MissingRate {
        base: CurrencyCode,
        target: CurrencyCode,
    },
}

/// Field-less mirror of [`ConversionError`] for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NetworkFailure,
    ProviderError,
    MissingRate,
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::InvalidInput(_) => ErrorKind::InvalidInput,
            ConversionError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            ConversionError::ProviderError(_) => ErrorKind::ProviderError,
            ConversionError::MissingRate { .. } => ErrorKind::MissingRate,
        }
    }
}
