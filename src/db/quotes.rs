//! PostgreSQL implementation of [`QuoteStore`]

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use std::collections::HashMap;

use super::{classify, QuoteStore, StoreError};
use crate::models::{
    Contract, ContractPatch, NewContract, NewQuote, Quote, QuoteItem, QuoteStatus, QuoteWithItems,
};

const CONTRACT_SELECT: &str = "SELECT contracts.*, quotes.public_id AS quote_public_id \
     FROM contracts JOIN quotes ON quotes.id = contracts.quote_id";

#[derive(Clone)]
pub struct PgQuoteStore {
    pool: PgPool,
}

impl PgQuoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Timestamp column stamped when a quote enters `status`
fn status_timestamp_column(status: QuoteStatus) -> Option<&'static str> {
    match status {
        QuoteStatus::Draft => None,
        QuoteStatus::Sent => Some("sent_at"),
        QuoteStatus::Viewed => Some("viewed_at"),
        QuoteStatus::Accepted => Some("accepted_at"),
    }
}

impl PgQuoteStore {
    async fn items_for(&self, quote_ids: &[i64]) -> Result<Vec<QuoteItem>, sqlx::Error> {
        sqlx::query_as::<_, QuoteItem>(
            "SELECT * FROM quote_items WHERE quote_id = ANY($1) ORDER BY id",
        )
        .bind(quote_ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn contract_by_id(&self, id: i64) -> Result<Option<Contract>, sqlx::Error> {
        sqlx::query_as::<_, Contract>(&format!("{} WHERE contracts.id = $1", CONTRACT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[async_trait]
impl QuoteStore for PgQuoteStore {
    async fn list_quotes(&self) -> Result<Vec<QuoteWithItems>, StoreError> {
        let quotes = sqlx::query_as::<_, Quote>("SELECT * FROM quotes ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<i64> = quotes.iter().map(|q| q.id).collect();
        let mut items_by_quote: HashMap<i64, Vec<QuoteItem>> = HashMap::new();
        for item in self.items_for(&ids).await? {
            items_by_quote.entry(item.quote_id).or_default().push(item);
        }

        Ok(quotes
            .into_iter()
            .map(|quote| {
                let items = items_by_quote.remove(&quote.id).unwrap_or_default();
                QuoteWithItems { quote, items }
            })
            .collect())
    }

    async fn find_quote(&self, public_id: &str) -> Result<Option<QuoteWithItems>, StoreError> {
        let quote = sqlx::query_as::<_, Quote>("SELECT * FROM quotes WHERE public_id = $1")
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        match quote {
            Some(quote) => {
                let items = self.items_for(&[quote.id]).await?;
                Ok(Some(QuoteWithItems { quote, items }))
            }
            None => Ok(None),
        }
    }

    async fn insert_quote(&self, new: &NewQuote) -> Result<Quote, StoreError> {
        let mut tx = self.pool.begin().await?;

        let quote = sqlx::query_as::<_, Quote>(
            r#"
            INSERT INTO quotes (public_id, name, customer, contact_name, contact_email, region, owner,
                                status, currency, expires_at, assumptions, terms, subtotal, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(&new.public_id)
        .bind(&new.name)
        .bind(&new.customer)
        .bind(&new.contact_name)
        .bind(&new.contact_email)
        .bind(&new.region)
        .bind(&new.owner)
        .bind(new.status)
        .bind(&new.currency)
        .bind(new.expires_at)
        .bind(Json(&new.assumptions))
        .bind(Json(&new.terms))
        .bind(new.subtotal)
        .bind(new.total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify(e, &new.public_id))?;

        if !new.items.is_empty() {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO quote_items (quote_id, name, category, description, unit, quantity, unit_price, sla_tier, kpi_tags) ",
            );
            builder.push_values(&new.items, |mut row, item| {
                row.push_bind(quote.id)
                    .push_bind(item.name.clone())
                    .push_bind(item.category.clone())
                    .push_bind(item.description.clone())
                    .push_bind(item.unit.clone())
                    .push_bind(item.quantity)
                    .push_bind(item.unit_price)
                    .push_bind(item.sla_tier.clone())
                    .push_bind(Json(item.kpi_tags.clone()));
            });
            // Dropping the transaction on error rolls back the quote row too
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(quote)
    }

    async fn set_status(
        &self,
        public_id: &str,
        status: QuoteStatus,
    ) -> Result<Option<QuoteStatus>, StoreError> {
        let stamp = status_timestamp_column(status)
            .map(|column| format!(", {} = NOW()", column))
            .unwrap_or_default();

        let sql = format!(
            r#"
            UPDATE quotes SET status = $2{}
            FROM (SELECT id, status AS previous FROM quotes WHERE public_id = $1 FOR UPDATE) old
            WHERE quotes.id = old.id
            RETURNING old.previous
            "#,
            stamp
        );

        let previous = sqlx::query_scalar::<_, QuoteStatus>(&sql)
            .bind(public_id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?;

        Ok(previous)
    }

    async fn accept_quote(
        &self,
        quote_id: i64,
        contract: &NewContract,
    ) -> Result<Contract, StoreError> {
        let mut tx = self.pool.begin().await?;

        let contract_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO contracts (public_id, quote_id, customer, status, owner, start_date, renewal_date,
                                   notice_date, sla_tier, service_levels, kpis, support_model, escalation,
                                   billing_cycle, billing_currency, mrr, arr, payment_terms, invoicing_day,
                                   health_score, risk_level, last_qbr, next_qbr, auto_renew, contacts)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19,
                    $20, $21, $22, $23, $24, $25)
            ON CONFLICT (quote_id) DO UPDATE SET
                customer = excluded.customer,
                status = excluded.status,
                owner = excluded.owner,
                start_date = excluded.start_date,
                renewal_date = excluded.renewal_date,
                notice_date = excluded.notice_date,
                sla_tier = excluded.sla_tier,
                service_levels = excluded.service_levels,
                kpis = excluded.kpis,
                support_model = excluded.support_model,
                escalation = excluded.escalation,
                billing_cycle = excluded.billing_cycle,
                billing_currency = excluded.billing_currency,
                mrr = excluded.mrr,
                arr = excluded.arr,
                payment_terms = excluded.payment_terms,
                invoicing_day = excluded.invoicing_day,
                health_score = excluded.health_score,
                risk_level = excluded.risk_level,
                last_qbr = excluded.last_qbr,
                next_qbr = excluded.next_qbr,
                auto_renew = excluded.auto_renew,
                contacts = excluded.contacts,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(&contract.public_id)
        .bind(quote_id)
        .bind(&contract.customer)
        .bind(&contract.status)
        .bind(&contract.owner)
        .bind(contract.start_date)
        .bind(contract.renewal_date)
        .bind(contract.notice_date)
        .bind(&contract.sla_tier)
        .bind(Json(&contract.service_levels))
        .bind(Json(&contract.kpis))
        .bind(&contract.support_model)
        .bind(Json(&contract.escalation))
        .bind(&contract.billing_cycle)
        .bind(&contract.billing_currency)
        .bind(contract.mrr)
        .bind(contract.arr)
        .bind(&contract.payment_terms)
        .bind(contract.invoicing_day)
        .bind(contract.health_score)
        .bind(&contract.risk_level)
        .bind(contract.last_qbr)
        .bind(contract.next_qbr)
        .bind(contract.auto_renew)
        .bind(Json(&contract.contacts))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify(e, &contract.public_id))?;

        sqlx::query("UPDATE quotes SET status = 'Accepted', accepted_at = NOW() WHERE id = $1")
            .bind(quote_id)
            .execute(&mut *tx)
            .await?;

        let accepted =
            sqlx::query_as::<_, Contract>(&format!("{} WHERE contracts.id = $1", CONTRACT_SELECT))
                .bind(contract_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(accepted)
    }

    async fn list_contracts(&self) -> Result<Vec<Contract>, StoreError> {
        let contracts = sqlx::query_as::<_, Contract>(&format!(
            "{} ORDER BY contracts.created_at DESC, contracts.id DESC",
            CONTRACT_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(contracts)
    }

    async fn find_contract(&self, public_id: &str) -> Result<Option<Contract>, StoreError> {
        let contract = sqlx::query_as::<_, Contract>(&format!(
            "{} WHERE contracts.public_id = $1",
            CONTRACT_SELECT
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contract)
    }

    async fn update_contract(
        &self,
        public_id: &str,
        patch: &ContractPatch,
    ) -> Result<Option<Contract>, StoreError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE contracts SET ");
        let mut set = builder.separated(", ");

        if let Some(v) = &patch.status {
            set.push("status = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.owner {
            set.push("owner = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.start_date {
            set.push("start_date = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.renewal_date {
            set.push("renewal_date = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.notice_date {
            set.push("notice_date = ").push_bind_unseparated(v);
        }
        if let Some(v) = &patch.sla_tier {
            set.push("sla_tier = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.service_levels {
            set.push("service_levels = ").push_bind_unseparated(Json(v.clone()));
        }
        if let Some(v) = &patch.kpis {
            set.push("kpis = ").push_bind_unseparated(Json(v.clone()));
        }
        if let Some(v) = &patch.support_model {
            set.push("support_model = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.escalation {
            set.push("escalation = ").push_bind_unseparated(Json(v.clone()));
        }
        if let Some(v) = &patch.billing_cycle {
            set.push("billing_cycle = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.billing_currency {
            set.push("billing_currency = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.mrr {
            set.push("mrr = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.arr {
            set.push("arr = ").push_bind_unseparated(v);
        }
        if let Some(v) = &patch.payment_terms {
            set.push("payment_terms = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.invoicing_day {
            set.push("invoicing_day = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.health_score {
            set.push("health_score = ").push_bind_unseparated(v);
        }
        if let Some(v) = &patch.risk_level {
            set.push("risk_level = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.last_qbr {
            set.push("last_qbr = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.next_qbr {
            set.push("next_qbr = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.auto_renew {
            set.push("auto_renew = ").push_bind_unseparated(v);
        }
        if let Some(v) = &patch.contacts {
            set.push("contacts = ").push_bind_unseparated(Json(v.clone()));
        }
        set.push("updated_at = NOW()");

        builder
            .push(" WHERE public_id = ")
            .push_bind(public_id.to_string())
            .push(" RETURNING id");

        let updated: Option<i64> = builder
            .build_query_scalar::<i64>()
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(id) => Ok(self.contract_by_id(id).await?),
            None => Ok(None),
        }
    }

    async fn record_activity(
        &self,
        action: &str,
        detail: &str,
        actor: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO activity_log (action, detail, actor) VALUES ($1, $2, $3)")
            .bind(action)
            .bind(detail)
            .bind(actor)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
