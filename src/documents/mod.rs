//! Quote proposal documents
//!
//! A [`DocumentRenderer`] turns a quote and its items into PDF bytes. The
//! production renderer prints the HTML proposal from [`template`] through a
//! headless Chromium process.

pub mod chromium;
pub mod currency;
pub mod template;

pub use chromium::ChromiumRenderer;
pub use currency::format_currency;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

use crate::models::{Quote, QuoteItem};

/// Everything the renderer needs to lay out one proposal
#[derive(Debug, Clone, Copy)]
pub struct QuoteDocument<'a> {
    pub quote: &'a Quote,
    pub items: &'a [QuoteItem],
    pub brand_name: &'a str,
    pub base_url: &'a str,
    pub issued_on: NaiveDate,
}

impl QuoteDocument<'_> {
    /// Hosted quote view
    pub fn review_url(&self) -> String {
        quote_url(self.base_url, &self.quote.public_id)
    }

    pub fn accept_url(&self) -> String {
        format!("{}/accept", self.review_url())
    }

    /// Attachment and download filename
    pub fn filename(&self) -> String {
        pdf_filename(self.brand_name, &self.quote.public_id)
    }
}

pub fn quote_url(base_url: &str, public_id: &str) -> String {
    format!("{}/quote/{}", base_url.trim_end_matches('/'), public_id)
}

pub fn pdf_filename(brand_name: &str, public_id: &str) -> String {
    let brand: String = brand_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    format!("{}-Quote-{}.pdf", brand, public_id)
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to stage document files: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start renderer: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("renderer timed out after {0:?}")]
    Timeout(Duration),

    #[error("renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("renderer produced no output")]
    EmptyOutput,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render_quote(&self, document: &QuoteDocument<'_>) -> Result<Vec<u8>, RenderError>;
}
