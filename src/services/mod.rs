//! Business logic shared by the HTTP handlers

pub mod contracts;
pub mod public_id;
pub mod quotes;
pub mod reports;
pub mod totals;

pub use quotes::{QuoteService, QuoteSettings, RenderedQuote};
