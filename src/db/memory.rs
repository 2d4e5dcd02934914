//! In-memory [`QuoteStore`] for service and router tests

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use std::sync::Mutex;

use super::{QuoteStore, StoreError};
use crate::models::{
    Contract, ContractPatch, NewContract, NewQuote, Quote, QuoteItem, QuoteStatus, QuoteWithItems,
};

#[derive(Default)]
struct State {
    next_id: i64,
    quotes: Vec<Quote>,
    items: Vec<QuoteItem>,
    contracts: Vec<Contract>,
    activity: Vec<(String, String)>,
    forced_collisions: usize,
    fail_item_at: Option<usize>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn with_items(&self, quote: &Quote) -> QuoteWithItems {
        QuoteWithItems {
            quote: quote.clone(),
            items: self
                .items
                .iter()
                .filter(|i| i.quote_id == quote.id)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Default)]
pub struct MemoryQuoteStore {
    state: Mutex<State>,
}

impl MemoryQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the next `n` inserts as public id collisions
    pub fn with_collisions(n: usize) -> Self {
        let store = Self::default();
        store.lock().forced_collisions = n;
        store
    }

    /// Fail quote inserts when writing the item at `index`
    pub fn failing_item_at(index: usize) -> Self {
        let store = Self::default();
        store.lock().fail_item_at = Some(index);
        store
    }

    pub fn quote_count(&self) -> usize {
        self.lock().quotes.len()
    }

    pub fn item_count(&self) -> usize {
        self.lock().items.len()
    }

    pub fn contract_count(&self) -> usize {
        self.lock().contracts.len()
    }

    pub fn activity(&self) -> Vec<(String, String)> {
        self.lock().activity.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn apply_patch(contract: &mut Contract, patch: &ContractPatch) {
    if let Some(v) = &patch.status {
        contract.status = v.clone();
    }
    if let Some(v) = &patch.owner {
        contract.owner = v.clone();
    }
    if let Some(v) = patch.start_date {
        contract.start_date = v;
    }
    if let Some(v) = patch.renewal_date {
        contract.renewal_date = v;
    }
    if let Some(v) = patch.notice_date {
        contract.notice_date = v;
    }
    if let Some(v) = &patch.sla_tier {
        contract.sla_tier = v.clone();
    }
    if let Some(v) = &patch.service_levels {
        contract.service_levels = Json(v.clone());
    }
    if let Some(v) = &patch.kpis {
        contract.kpis = Json(v.clone());
    }
    if let Some(v) = &patch.support_model {
        contract.support_model = v.clone();
    }
    if let Some(v) = &patch.escalation {
        contract.escalation = Json(v.clone());
    }
    if let Some(v) = &patch.billing_cycle {
        contract.billing_cycle = v.clone();
    }
    if let Some(v) = &patch.billing_currency {
        contract.billing_currency = v.clone();
    }
    if let Some(v) = patch.mrr {
        contract.mrr = v;
    }
    if let Some(v) = patch.arr {
        contract.arr = v;
    }
    if let Some(v) = &patch.payment_terms {
        contract.payment_terms = v.clone();
    }
    if let Some(v) = patch.invoicing_day {
        contract.invoicing_day = v;
    }
    if let Some(v) = patch.health_score {
        contract.health_score = v;
    }
    if let Some(v) = &patch.risk_level {
        contract.risk_level = v.clone();
    }
    if let Some(v) = patch.last_qbr {
        contract.last_qbr = v;
    }
    if let Some(v) = patch.next_qbr {
        contract.next_qbr = v;
    }
    if let Some(v) = patch.auto_renew {
        contract.auto_renew = v;
    }
    if let Some(v) = &patch.contacts {
        contract.contacts = Json(v.clone());
    }
    contract.updated_at = Utc::now();
}

#[async_trait]
impl QuoteStore for MemoryQuoteStore {
    async fn list_quotes(&self) -> Result<Vec<QuoteWithItems>, StoreError> {
        let state = self.lock();
        Ok(state.quotes.iter().rev().map(|q| state.with_items(q)).collect())
    }

    async fn find_quote(&self, public_id: &str) -> Result<Option<QuoteWithItems>, StoreError> {
        let state = self.lock();
        Ok(state
            .quotes
            .iter()
            .find(|q| q.public_id == public_id)
            .map(|q| state.with_items(q)))
    }

    async fn insert_quote(&self, new: &NewQuote) -> Result<Quote, StoreError> {
        let mut state = self.lock();

        if state.forced_collisions > 0 {
            state.forced_collisions -= 1;
            return Err(StoreError::DuplicatePublicId(new.public_id.clone()));
        }
        if state.quotes.iter().any(|q| q.public_id == new.public_id) {
            return Err(StoreError::DuplicatePublicId(new.public_id.clone()));
        }
        if let Some(index) = state.fail_item_at {
            if index < new.items.len() {
                return Err(StoreError::Rejected(format!("item {} refused", index)));
            }
        }

        let quote = Quote {
            id: state.next_id(),
            public_id: new.public_id.clone(),
            name: new.name.clone(),
            customer: new.customer.clone(),
            contact_name: new.contact_name.clone(),
            contact_email: new.contact_email.clone(),
            region: new.region.clone(),
            owner: new.owner.clone(),
            status: new.status,
            currency: new.currency.clone(),
            created_at: Utc::now(),
            expires_at: new.expires_at,
            sent_at: None,
            viewed_at: None,
            accepted_at: None,
            assumptions: Json(new.assumptions.clone()),
            terms: Json(new.terms.clone()),
            subtotal: new.subtotal,
            total: new.total,
        };

        for item in &new.items {
            let id = state.next_id();
            state.items.push(QuoteItem {
                id,
                quote_id: quote.id,
                name: item.name.clone(),
                category: item.category.clone(),
                description: item.description.clone(),
                unit: item.unit.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                sla_tier: item.sla_tier.clone(),
                kpi_tags: Json(item.kpi_tags.clone()),
            });
        }
        state.quotes.push(quote.clone());
        Ok(quote)
    }

    async fn set_status(
        &self,
        public_id: &str,
        status: QuoteStatus,
    ) -> Result<Option<QuoteStatus>, StoreError> {
        let mut state = self.lock();
        let Some(quote) = state.quotes.iter_mut().find(|q| q.public_id == public_id) else {
            return Ok(None);
        };

        let previous = quote.status;
        let now = Utc::now();
        quote.status = status;
        match status {
            QuoteStatus::Draft => {}
            QuoteStatus::Sent => quote.sent_at = Some(now),
            QuoteStatus::Viewed => quote.viewed_at = Some(now),
            QuoteStatus::Accepted => quote.accepted_at = Some(now),
        }
        Ok(Some(previous))
    }

    async fn accept_quote(
        &self,
        quote_id: i64,
        new: &NewContract,
    ) -> Result<Contract, StoreError> {
        let mut state = self.lock();

        let quote_public_id = state
            .quotes
            .iter()
            .find(|q| q.id == quote_id)
            .map(|q| q.public_id.clone())
            .ok_or_else(|| StoreError::Rejected(format!("quote {} missing", quote_id)))?;

        let existing = state.contracts.iter().position(|c| c.quote_id == quote_id);
        if existing.is_none() && state.contracts.iter().any(|c| c.public_id == new.public_id) {
            return Err(StoreError::DuplicatePublicId(new.public_id.clone()));
        }

        let now = Utc::now();
        let (id, public_id, created_at) = match existing {
            Some(index) => {
                let current = &state.contracts[index];
                (current.id, current.public_id.clone(), current.created_at)
            }
            None => (state.next_id(), new.public_id.clone(), now),
        };

        let contract = Contract {
            id,
            public_id,
            quote_id,
            quote_public_id,
            customer: new.customer.clone(),
            status: new.status.clone(),
            owner: new.owner.clone(),
            start_date: new.start_date,
            renewal_date: new.renewal_date,
            notice_date: new.notice_date,
            sla_tier: new.sla_tier.clone(),
            service_levels: Json(new.service_levels.clone()),
            kpis: Json(new.kpis.clone()),
            support_model: new.support_model.clone(),
            escalation: Json(new.escalation.clone()),
            billing_cycle: new.billing_cycle.clone(),
            billing_currency: new.billing_currency.clone(),
            mrr: new.mrr,
            arr: new.arr,
            payment_terms: new.payment_terms.clone(),
            invoicing_day: new.invoicing_day,
            health_score: new.health_score,
            risk_level: new.risk_level.clone(),
            last_qbr: new.last_qbr,
            next_qbr: new.next_qbr,
            auto_renew: new.auto_renew,
            contacts: Json(new.contacts.clone()),
            created_at,
            updated_at: now,
        };

        match existing {
            Some(index) => state.contracts[index] = contract.clone(),
            None => state.contracts.push(contract.clone()),
        }
        if let Some(quote) = state.quotes.iter_mut().find(|q| q.id == quote_id) {
            quote.status = QuoteStatus::Accepted;
            quote.accepted_at = Some(now);
        }
        Ok(contract)
    }

    async fn list_contracts(&self) -> Result<Vec<Contract>, StoreError> {
        Ok(self.lock().contracts.iter().rev().cloned().collect())
    }

    async fn find_contract(&self, public_id: &str) -> Result<Option<Contract>, StoreError> {
        Ok(self
            .lock()
            .contracts
            .iter()
            .find(|c| c.public_id == public_id)
            .cloned())
    }

    async fn update_contract(
        &self,
        public_id: &str,
        patch: &ContractPatch,
    ) -> Result<Option<Contract>, StoreError> {
        let mut state = self.lock();
        Ok(state
            .contracts
            .iter_mut()
            .find(|c| c.public_id == public_id)
            .map(|contract| {
                apply_patch(contract, patch);
                contract.clone()
            }))
    }

    async fn record_activity(
        &self,
        action: &str,
        detail: &str,
        _actor: Option<&str>,
    ) -> Result<(), StoreError> {
        self.lock()
            .activity
            .push((action.to_string(), detail.to_string()));
        Ok(())
    }
}
