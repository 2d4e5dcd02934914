//! Helpdesk, billing and account records consumed by the portal dashboards

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// =============================================================================
// Profile
// =============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub auth_user_id: Option<Uuid>,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Customer key used to match subscriptions to this profile
    pub fn customer_key(&self) -> &str {
        self.company
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub auth_user_id: Option<Uuid>,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            auth_user_id: profile.auth_user_id,
            email: profile.email,
            name: profile.name,
            role: profile.role,
            company: profile.company,
            phone: profile.phone,
            status: profile.status,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
}

impl UpdateProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.company.is_none() && self.phone.is_none() && self.status.is_none()
    }
}

// =============================================================================
// Ticket
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketNote {
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub public_id: String,
    pub customer: String,
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
    pub subject: String,
    pub category: Option<String>,
    pub priority: String,
    pub status: String,
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sla_due_at: Option<DateTime<Utc>>,
    pub notes: Json<Vec<TicketNote>>,
    pub tags: Json<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: String,
    pub db_id: i64,
    pub customer: String,
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
    pub subject: String,
    pub category: Option<String>,
    pub priority: String,
    pub status: String,
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sla_due_at: Option<DateTime<Utc>>,
    pub notes: Vec<TicketNote>,
    pub tags: Vec<String>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.public_id,
            db_id: ticket.id,
            customer: ticket.customer,
            requester_name: ticket.requester_name,
            requester_email: ticket.requester_email,
            subject: ticket.subject,
            category: ticket.category,
            priority: ticket.priority,
            status: ticket.status,
            assigned_to: ticket.assigned_to,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            sla_due_at: ticket.sla_due_at,
            notes: ticket.notes.0,
            tags: ticket.tags.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicket {
    #[serde(default)]
    pub customer: String,
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
    #[serde(default)]
    pub subject: String,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub description: Option<String>,
}

impl CreateTicket {
    /// The optional description becomes the ticket's first note
    pub fn initial_notes(&self, now: DateTime<Utc>) -> Vec<TicketNote> {
        match self.description.as_deref().map(str::trim) {
            Some(body) if !body.is_empty() => vec![TicketNote {
                body: body.to_string(),
                created_at: now,
                author: self
                    .requester_name
                    .clone()
                    .or_else(|| self.requester_email.clone())
                    .unwrap_or_else(|| "Customer".to_string()),
            }],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketFilter {
    pub status: Option<String>,
    pub requester_email: Option<String>,
    pub customer: Option<String>,
}

// =============================================================================
// Subscription & Invoice
// =============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct Subscription {
    pub id: i64,
    pub public_id: String,
    pub customer: String,
    pub plan: String,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub billing_cycle: Option<String>,
    pub billing_currency: Option<String>,
    pub mrr: Decimal,
    pub seats: Option<i32>,
    pub add_ons: Json<Vec<String>>,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: String,
    pub db_id: i64,
    pub customer: String,
    pub plan: String,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub billing_cycle: Option<String>,
    pub billing_currency: Option<String>,
    pub mrr: Decimal,
    pub seats: Option<i32>,
    pub add_ons: Vec<String>,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.public_id,
            db_id: sub.id,
            customer: sub.customer,
            plan: sub.plan,
            status: sub.status,
            start_date: sub.start_date,
            renewal_date: sub.renewal_date,
            billing_cycle: sub.billing_cycle,
            billing_currency: sub.billing_currency,
            mrr: sub.mrr,
            seats: sub.seats,
            add_ons: sub.add_ons.0,
            owner: sub.owner,
            created_at: sub.created_at,
            updated_at: sub.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFilter {
    pub customer: Option<String>,
}

/// Invoice row joined with its subscription's public id
#[derive(Debug, Clone, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub subscription_id: i64,
    pub subscription_public_id: String,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: String,
    pub db_id: i64,
    pub subscription_id: String,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.invoice_number,
            db_id: invoice.id,
            subscription_id: invoice.subscription_public_id,
            status: invoice.status,
            amount: invoice.amount,
            currency: invoice.currency,
            due_date: invoice.due_date,
            paid_at: invoice.paid_at,
            created_at: invoice.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFilter {
    pub subscription_id: Option<String>,
    pub customer: Option<String>,
}

// =============================================================================
// Report & Activity
// =============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct Report {
    pub id: i64,
    pub title: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub summary: Option<String>,
    pub kpis: Json<Vec<serde_json::Value>>,
    pub issues: Json<Vec<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: i64,
    pub title: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub summary: Option<String>,
    pub kpis: Vec<serde_json::Value>,
    pub issues: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<Report> for ReportResponse {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            title: report.title,
            period_start: report.period_start,
            period_end: report.period_end,
            summary: report.summary,
            kpis: report.kpis.0,
            issues: report.issues.0,
            created_at: report.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ActivityEntry {
    pub id: i64,
    pub action: String,
    pub detail: Option<String>,
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: i64,
    pub action: String,
    pub detail: Option<String>,
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityEntry> for ActivityResponse {
    fn from(entry: ActivityEntry) -> Self {
        Self {
            id: entry.id,
            action: entry.action,
            detail: entry.detail,
            actor: entry.actor,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(company: Option<&str>, name: Option<&str>) -> Profile {
        let now = Utc::now();
        Profile {
            id: Uuid::new_v4(),
            auth_user_id: None,
            email: "ops@acme.example".to_string(),
            name: name.map(String::from),
            role: "client".to_string(),
            company: company.map(String::from),
            phone: None,
            status: "Active".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_customer_key_fallbacks() {
        assert_eq!(profile(Some("Acme"), Some("Lerato")).customer_key(), "Acme");
        assert_eq!(profile(None, Some("Lerato")).customer_key(), "Lerato");
        assert_eq!(profile(None, None).customer_key(), "ops@acme.example");
    }

    #[test]
    fn test_ticket_initial_note_author() {
        let now = Utc::now();
        let input = CreateTicket {
            customer: "Acme".to_string(),
            requester_email: Some("ops@acme.example".to_string()),
            subject: "VPN down".to_string(),
            description: Some("  Cannot connect since 9am ".to_string()),
            ..Default::default()
        };
        let notes = input.initial_notes(now);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].author, "ops@acme.example");
        assert_eq!(notes[0].body, "Cannot connect since 9am");

        let blank = CreateTicket {
            description: Some("   ".to_string()),
            ..input
        };
        assert!(blank.initial_notes(now).is_empty());
    }

    #[test]
    fn test_invoice_response_uses_invoice_number() {
        let invoice = Invoice {
            id: 9,
            invoice_number: "INV-2026-0042".to_string(),
            subscription_id: 2,
            subscription_public_id: "SUB-2026-1111".to_string(),
            status: "Paid".to_string(),
            amount: Decimal::from(1200),
            currency: "ZAR".to_string(),
            due_date: None,
            paid_at: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(InvoiceResponse::from(invoice)).unwrap();
        assert_eq!(value["id"], "INV-2026-0042");
        assert_eq!(value["dbId"], 9);
        assert_eq!(value["subscriptionId"], "SUB-2026-1111");
    }

    #[test]
    fn test_ticket_response_mapping() {
        let now = Utc::now();
        let ticket = Ticket {
            id: 4,
            public_id: "TKT-2026-5555".to_string(),
            customer: "Acme".to_string(),
            requester_name: Some("Lerato".to_string()),
            requester_email: None,
            subject: "Printer".to_string(),
            category: None,
            priority: "Medium".to_string(),
            status: "Open".to_string(),
            assigned_to: None,
            created_at: now,
            updated_at: now,
            sla_due_at: None,
            notes: Json(vec![]),
            tags: Json(vec!["onsite".to_string()]),
        };
        let value = serde_json::to_value(TicketResponse::from(ticket)).unwrap();
        assert_eq!(value["id"], "TKT-2026-5555");
        assert_eq!(value["requesterName"], "Lerato");
        assert_eq!(value["tags"][0], "onsite");
        assert!(value.get("requester_name").is_none());
    }
}
