use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::lenient;

pub const DEFAULT_CONTRACT_STATUS: &str = "Pending";

// =============================================================================
// List element schemas (stored as JSONB)
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Kpi {
    pub label: String,
    pub target: String,
    pub measurement: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EscalationStep {
    pub level: String,
    pub response: String,
    pub owner: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractContact {
    pub name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub primary: bool,
}

// =============================================================================
// Stored row
// =============================================================================

/// Contract row joined with its source quote's public id
#[derive(Debug, Clone, FromRow)]
pub struct Contract {
    pub id: i64,
    pub public_id: String,
    pub quote_id: i64,
    pub quote_public_id: String,
    pub customer: String,
    pub status: String,
    pub owner: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub notice_date: Option<NaiveDate>,
    pub sla_tier: Option<String>,
    pub service_levels: Json<Vec<String>>,
    pub kpis: Json<Vec<Kpi>>,
    pub support_model: Option<String>,
    pub escalation: Json<Vec<EscalationStep>>,
    pub billing_cycle: Option<String>,
    pub billing_currency: Option<String>,
    pub mrr: Decimal,
    pub arr: Decimal,
    pub payment_terms: Option<String>,
    pub invoicing_day: Option<i32>,
    pub health_score: Option<i32>,
    pub risk_level: Option<String>,
    pub last_qbr: Option<NaiveDate>,
    pub next_qbr: Option<NaiveDate>,
    pub auto_renew: bool,
    pub contacts: Json<Vec<ContractContact>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Requests
// =============================================================================

/// Contract fields supplied when a quote is accepted; all optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptQuote {
    pub status: Option<String>,
    pub owner: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub notice_date: Option<NaiveDate>,
    pub sla_tier: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub service_levels: Vec<String>,
    #[serde(default)]
    pub kpis: Vec<Kpi>,
    pub support_model: Option<String>,
    #[serde(default)]
    pub escalation: Vec<EscalationStep>,
    pub billing_cycle: Option<String>,
    pub billing_currency: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub mrr: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub arr: Decimal,
    pub payment_terms: Option<String>,
    pub invoicing_day: Option<i32>,
    pub health_score: Option<i32>,
    pub risk_level: Option<String>,
    pub last_qbr: Option<NaiveDate>,
    pub next_qbr: Option<NaiveDate>,
    pub auto_renew: Option<bool>,
    #[serde(default)]
    pub contacts: Vec<ContractContact>,
}

/// Contract values to upsert for a quote, defaults already applied
#[derive(Debug, Clone, PartialEq)]
pub struct NewContract {
    pub public_id: String,
    pub customer: String,
    pub status: String,
    pub owner: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub notice_date: Option<NaiveDate>,
    pub sla_tier: Option<String>,
    pub service_levels: Vec<String>,
    pub kpis: Vec<Kpi>,
    pub support_model: Option<String>,
    pub escalation: Vec<EscalationStep>,
    pub billing_cycle: Option<String>,
    pub billing_currency: Option<String>,
    pub mrr: Decimal,
    pub arr: Decimal,
    pub payment_terms: Option<String>,
    pub invoicing_day: Option<i32>,
    pub health_score: Option<i32>,
    pub risk_level: Option<String>,
    pub last_qbr: Option<NaiveDate>,
    pub next_qbr: Option<NaiveDate>,
    pub auto_renew: bool,
    pub contacts: Vec<ContractContact>,
}

/// Sparse contract update. `None` leaves a column untouched; for nullable
/// columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPatch {
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub owner: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub renewal_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub notice_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub sla_tier: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::optional_string_list")]
    pub service_levels: Option<Vec<String>>,
    pub kpis: Option<Vec<Kpi>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub support_model: Option<Option<String>>,
    pub escalation: Option<Vec<EscalationStep>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub billing_cycle: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub billing_currency: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub mrr: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub arr: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub payment_terms: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub invoicing_day: Option<Option<i32>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub health_score: Option<Option<i32>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub risk_level: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub last_qbr: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "lenient::nullable")]
    pub next_qbr: Option<Option<NaiveDate>>,
    pub auto_renew: Option<bool>,
    pub contacts: Option<Vec<ContractContact>>,
}

impl ContractPatch {
    /// True when no recognized field was supplied
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.owner.is_none()
            && self.start_date.is_none()
            && self.renewal_date.is_none()
            && self.notice_date.is_none()
            && self.sla_tier.is_none()
            && self.service_levels.is_none()
            && self.kpis.is_none()
            && self.support_model.is_none()
            && self.escalation.is_none()
            && self.billing_cycle.is_none()
            && self.billing_currency.is_none()
            && self.mrr.is_none()
            && self.arr.is_none()
            && self.payment_terms.is_none()
            && self.invoicing_day.is_none()
            && self.health_score.is_none()
            && self.risk_level.is_none()
            && self.last_qbr.is_none()
            && self.next_qbr.is_none()
            && self.auto_renew.is_none()
            && self.contacts.is_none()
    }
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractResponse {
    pub id: String,
    pub db_id: i64,
    pub quote_id: String,
    pub customer: String,
    pub status: String,
    pub owner: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub notice_date: Option<NaiveDate>,
    pub sla_tier: Option<String>,
    pub service_levels: Vec<String>,
    pub kpis: Vec<Kpi>,
    pub support_model: Option<String>,
    pub escalation: Vec<EscalationStep>,
    pub billing_cycle: Option<String>,
    pub billing_currency: Option<String>,
    pub mrr: Decimal,
    pub arr: Decimal,
    pub payment_terms: Option<String>,
    pub invoicing_day: Option<i32>,
    pub health_score: Option<i32>,
    pub risk_level: Option<String>,
    pub last_qbr: Option<NaiveDate>,
    pub next_qbr: Option<NaiveDate>,
    pub auto_renew: bool,
    pub contacts: Vec<ContractContact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Contract> for ContractResponse {
    fn from(contract: Contract) -> Self {
        Self {
            id: contract.public_id,
            db_id: contract.id,
            quote_id: contract.quote_public_id,
            customer: contract.customer,
            status: contract.status,
            owner: contract.owner,
            start_date: contract.start_date,
            renewal_date: contract.renewal_date,
            notice_date: contract.notice_date,
            sla_tier: contract.sla_tier,
            service_levels: contract.service_levels.0,
            kpis: contract.kpis.0,
            support_model: contract.support_model,
            escalation: contract.escalation.0,
            billing_cycle: contract.billing_cycle,
            billing_currency: contract.billing_currency,
            mrr: contract.mrr,
            arr: contract.arr,
            payment_terms: contract.payment_terms,
            invoicing_day: contract.invoicing_day,
            health_score: contract.health_score,
            risk_level: contract.risk_level,
            last_qbr: contract.last_qbr,
            next_qbr: contract.next_qbr,
            auto_renew: contract.auto_renew,
            contacts: contract.contacts.0,
            created_at: contract.created_at,
            updated_at: contract.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contract_response_mapping() {
        let now = Utc::now();
        let contract = Contract {
            id: 3,
            public_id: "CTR-2026-1001".to_string(),
            quote_id: 7,
            quote_public_id: "Q-2026-4821".to_string(),
            customer: "Acme Bank".to_string(),
            status: "Active".to_string(),
            owner: None,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            renewal_date: None,
            notice_date: None,
            sla_tier: Some("Gold".to_string()),
            service_levels: Json(vec!["24/7 SOC".to_string()]),
            kpis: Json(vec![Kpi {
                label: "MTTR".to_string(),
                target: "< 4h".to_string(),
                measurement: None,
            }]),
            support_model: None,
            escalation: Json(vec![]),
            billing_cycle: Some("Monthly".to_string()),
            billing_currency: Some("ZAR".to_string()),
            mrr: Decimal::from(6500),
            arr: Decimal::from(78000),
            payment_terms: None,
            invoicing_day: Some(25),
            health_score: Some(80),
            risk_level: None,
            last_qbr: None,
            next_qbr: None,
            auto_renew: true,
            contacts: Json(vec![ContractContact {
                name: "Lerato".to_string(),
                primary: true,
                ..Default::default()
            }]),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(ContractResponse::from(contract)).unwrap();
        assert_eq!(value["id"], "CTR-2026-1001");
        assert_eq!(value["quoteId"], "Q-2026-4821");
        assert_eq!(value["startDate"], "2026-01-01");
        assert_eq!(value["kpis"][0], json!({"label": "MTTR", "target": "< 4h", "measurement": null}));
        assert_eq!(value["contacts"][0]["primary"], true);
        assert_eq!(value["invoicingDay"], 25);
        assert_eq!(value["autoRenew"], true);
        assert_eq!(value["mrr"], 6500.0);
    }

    #[test]
    fn test_patch_with_unknown_fields_is_empty() {
        let patch: ContractPatch = serde_json::from_value(json!({"colour": "blue"})).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_patch_null_clears_nullable_field() {
        let patch: ContractPatch =
            serde_json::from_value(json!({"startDate": null, "mrr": "1200"})).unwrap();
        assert!(!patch.is_empty());
        assert_eq!(patch.start_date, Some(None));
        assert_eq!(patch.mrr, Some(Decimal::from(1200)));
        assert_eq!(patch.owner, None);
    }

    #[test]
    fn test_accept_defaults_when_body_empty() {
        let input: AcceptQuote = serde_json::from_value(json!({})).unwrap();
        assert!(input.start_date.is_none());
        assert!(input.auto_renew.is_none());
        assert!(input.kpis.is_empty());
        assert_eq!(input.mrr, Decimal::ZERO);
    }
}
