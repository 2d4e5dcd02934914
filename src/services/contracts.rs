//! Contract derivation from an accepted quote

use crate::models::{AcceptQuote, NewContract, Quote, DEFAULT_CONTRACT_STATUS};

/// Apply acceptance defaults: status `Pending`, owner from the quote,
/// auto-renew on, customer always taken from the quote.
pub fn derive_contract(quote: &Quote, input: AcceptQuote, public_id: String) -> NewContract {
    let status = input
        .status
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONTRACT_STATUS.to_string());

    NewContract {
        public_id,
        customer: quote.customer.clone(),
        status,
        owner: input.owner.or_else(|| quote.owner.clone()),
        start_date: input.start_date,
        renewal_date: input.renewal_date,
        notice_date: input.notice_date,
        sla_tier: input.sla_tier,
        service_levels: input.service_levels,
        kpis: input.kpis,
        support_model: input.support_model,
        escalation: input.escalation,
        billing_cycle: input.billing_cycle,
        billing_currency: input.billing_currency,
        mrr: input.mrr,
        arr: input.arr,
        payment_terms: input.payment_terms,
        invoicing_day: input.invoicing_day,
        health_score: input.health_score,
        risk_level: input.risk_level,
        last_qbr: input.last_qbr,
        next_qbr: input.next_qbr,
        auto_renew: input.auto_renew.unwrap_or(true),
        contacts: input.contacts,
    }
}
