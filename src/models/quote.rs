use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::lenient;

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "quote_status")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Viewed,
    Accepted,
}

impl QuoteStatus {
    fn rank(self) -> u8 {
        match self {
            QuoteStatus::Draft => 0,
            QuoteStatus::Sent => 1,
            QuoteStatus::Viewed => 2,
            QuoteStatus::Accepted => 3,
        }
    }

    /// Whether moving to `next` goes backwards in the lifecycle.
    /// Re-sending a viewed quote counts as a regression too.
    pub fn is_regression_to(self, next: QuoteStatus) -> bool {
        next.rank() < self.rank()
    }
}

// =============================================================================
// Stored rows
// =============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct Quote {
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub customer: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub region: Option<String>,
    pub owner: Option<String>,
    pub status: QuoteStatus,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<NaiveDate>,
    pub sent_at: Option<DateTime<Utc>>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub assumptions: Json<Vec<String>>,
    pub terms: Json<Vec<String>>,
    pub subtotal: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct QuoteItem {
    pub id: i64,
    pub quote_id: i64,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub sla_tier: Option<String>,
    pub kpi_tags: Json<Vec<String>>,
}

/// A quote together with its line items, as loaded from the store
#[derive(Debug, Clone)]
pub struct QuoteWithItems {
    pub quote: Quote,
    pub items: Vec<QuoteItem>,
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuote {
    pub public_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub customer: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub region: Option<String>,
    pub owner: Option<String>,
    pub status: Option<QuoteStatus>,
    pub currency: Option<String>,
    pub expires_at: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub assumptions: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub terms: Vec<String>,
    #[serde(default)]
    pub items: Vec<NewQuoteItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuoteItem {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub unit_price: Decimal,
    pub sla_tier: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub kpi_tags: Vec<String>,
}

/// Fully resolved quote ready to be written, totals included
#[derive(Debug, Clone)]
pub struct NewQuote {
    pub public_id: String,
    pub name: String,
    pub customer: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub region: Option<String>,
    pub owner: Option<String>,
    pub status: QuoteStatus,
    pub currency: String,
    pub expires_at: Option<NaiveDate>,
    pub assumptions: Vec<String>,
    pub terms: Vec<String>,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub items: Vec<NewQuoteItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendQuoteRequest {
    pub to_email: Option<String>,
    pub to_name: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePdfRequest {
    pub quote_id: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub id: String,
    pub db_id: i64,
    pub name: String,
    pub customer: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub region: Option<String>,
    pub owner: Option<String>,
    pub status: QuoteStatus,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<NaiveDate>,
    pub sent_at: Option<DateTime<Utc>>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub assumptions: Vec<String>,
    pub terms: Vec<String>,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub items: Vec<QuoteItemResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItemResponse {
    pub id: i64,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub sla_tier: Option<String>,
    pub kpi_tags: Vec<String>,
}

impl From<QuoteItem> for QuoteItemResponse {
    fn from(item: QuoteItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            category: item.category,
            description: item.description,
            unit: item.unit,
            quantity: item.quantity,
            unit_price: item.unit_price,
            sla_tier: item.sla_tier,
            kpi_tags: item.kpi_tags.0,
        }
    }
}

impl From<QuoteWithItems> for QuoteResponse {
    fn from(QuoteWithItems { quote, items }: QuoteWithItems) -> Self {
        Self {
            id: quote.public_id,
            db_id: quote.id,
            name: quote.name,
            customer: quote.customer,
            contact_name: quote.contact_name,
            contact_email: quote.contact_email,
            region: quote.region,
            owner: quote.owner,
            status: quote.status,
            currency: quote.currency,
            created_at: quote.created_at,
            expires_at: quote.expires_at,
            sent_at: quote.sent_at,
            viewed_at: quote.viewed_at,
            accepted_at: quote.accepted_at,
            assumptions: quote.assumptions.0,
            terms: quote.terms.0,
            subtotal: quote.subtotal,
            total: quote.total,
            items: items.into_iter().map(QuoteItemResponse::from).collect(),
        }
    }
}
