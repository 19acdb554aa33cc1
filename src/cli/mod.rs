//! Terminal front end: thin handlers over [`crate::core::Converter`]

pub mod convert;
pub mod form;
pub mod rates;
pub mod setup;
pub mod ui;
