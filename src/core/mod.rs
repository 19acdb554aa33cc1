//! Core business logic abstractions

pub mod config;
pub mod conversion;
pub mod currency;
pub mod error;
pub mod log;

// Re-export main types for cleaner imports
pub use conversion::{Conversion, ConversionRequest, ConversionResult, Converter};
pub use currency::{CurrencyCode, RateProvider, RateTable};
pub use error::{ConversionError, ErrorKind, InputError};
