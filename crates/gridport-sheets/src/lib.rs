//! Google Sheets values-API backend for the GridPort engine.
//!
//! [`SheetsClient`] implements `ValuesBackend` over the spreadsheet values
//! REST surface with a blocking HTTP client; no async runtime is required.

mod client;
mod wire;

pub use client::{DEFAULT_BASE_URL, SheetsClient, SheetsConfig};
