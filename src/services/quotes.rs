//! Quote lifecycle: create, fetch, send, view, accept, and contract upkeep

use chrono::Utc;
use std::sync::Arc;

use super::contracts::derive_contract;
use super::public_id::{generate_public_id, CONTRACT_PREFIX, MAX_ID_ATTEMPTS, QUOTE_PREFIX};
use super::totals::{compute_totals, normalize_item};
use crate::db::{QuoteStore, StoreError};
use crate::documents::{quote_url, DocumentRenderer, QuoteDocument};
use crate::error::AppError;
use crate::models::{
    AcceptQuote, Contract, ContractPatch, CreateQuote, NewQuote, QuoteStatus, QuoteWithItems,
    SendQuoteRequest,
};
use crate::notify::{Attachment, Notifier, OutgoingEmail};
use crate::validation::{self, ValidationError};

/// Deployment-level values the workflow stamps into documents and emails
#[derive(Debug, Clone)]
pub struct QuoteSettings {
    pub app_base_url: String,
    pub brand_name: String,
    pub default_currency: String,
}

/// A rendered proposal ready for download or attachment
#[derive(Debug, Clone)]
pub struct RenderedQuote {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct QuoteService {
    store: Arc<dyn QuoteStore>,
    renderer: Arc<dyn DocumentRenderer>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<QuoteSettings>,
}

impl QuoteService {
    pub fn new(
        store: Arc<dyn QuoteStore>,
        renderer: Arc<dyn DocumentRenderer>,
        notifier: Arc<dyn Notifier>,
        settings: QuoteSettings,
    ) -> Self {
        Self {
            store,
            renderer,
            notifier,
            settings: Arc::new(settings),
        }
    }

    // =========================================================================
    // Quotes
    // =========================================================================

    pub async fn list(&self) -> Result<Vec<QuoteWithItems>, AppError> {
        Ok(self.store.list_quotes().await?)
    }

    pub async fn fetch(&self, public_id: &str) -> Result<QuoteWithItems, AppError> {
        self.store
            .find_quote(public_id)
            .await?
            .ok_or(AppError::NotFound("Quote"))
    }

    /// Validate, total and persist a new quote with its items.
    /// Returns the quote's public id.
    pub async fn create(&self, mut input: CreateQuote) -> Result<String, AppError> {
        validation::validate_create_quote(&input)?;

        input.items.iter_mut().for_each(normalize_item);
        let totals = compute_totals(&input.items);
        validation::validate_total(totals.total)?;
        let supplied_id = input
            .public_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from);
        let currency = input
            .currency
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.settings.default_currency.clone());

        let mut new_quote = NewQuote {
            public_id: supplied_id
                .clone()
                .unwrap_or_else(|| generate_public_id(QUOTE_PREFIX)),
            name: input.name.trim().to_string(),
            customer: input.customer.trim().to_string(),
            contact_name: input.contact_name,
            contact_email: input.contact_email,
            region: input.region,
            owner: input.owner,
            status: input.status.unwrap_or(QuoteStatus::Draft),
            currency,
            expires_at: input.expires_at,
            assumptions: input.assumptions,
            terms: input.terms,
            subtotal: totals.subtotal,
            total: totals.total,
            items: input.items,
        };

        let mut attempt = 1;
        let quote = loop {
            match self.store.insert_quote(&new_quote).await {
                Ok(quote) => break quote,
                Err(StoreError::DuplicatePublicId(id)) if supplied_id.is_none() => {
                    if attempt >= MAX_ID_ATTEMPTS {
                        return Err(AppError::unexpected(
                            "Failed to allocate a quote identifier",
                            StoreError::DuplicatePublicId(id),
                        ));
                    }
                    tracing::warn!("Quote id {} already taken, retrying with a new id", id);
                    attempt += 1;
                    new_quote.public_id = generate_public_id(QUOTE_PREFIX);
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            "Created quote {} for {} ({} items, total {} {})",
            quote.public_id,
            quote.customer,
            new_quote.items.len(),
            quote.total,
            quote.currency
        );
        self.log_activity(
            "Quote created",
            format!("{} for {}", quote.public_id, quote.customer),
        )
        .await;

        Ok(quote.public_id)
    }

    pub async fn mark_viewed(&self, public_id: &str) -> Result<(), AppError> {
        self.transition(public_id, QuoteStatus::Viewed).await
    }

    pub async fn mark_sent(&self, public_id: &str) -> Result<(), AppError> {
        self.transition(public_id, QuoteStatus::Sent).await
    }

    async fn transition(&self, public_id: &str, status: QuoteStatus) -> Result<(), AppError> {
        let previous = self
            .store
            .set_status(public_id, status)
            .await?
            .ok_or(AppError::NotFound("Quote"))?;

        if previous.is_regression_to(status) {
            tracing::warn!(
                "Quote {} moved back from {:?} to {:?}",
                public_id,
                previous,
                status
            );
        }
        Ok(())
    }

    // =========================================================================
    // Documents & delivery
    // =========================================================================

    pub async fn render_pdf(&self, public_id: &str) -> Result<RenderedQuote, AppError> {
        let loaded = self.fetch(public_id).await?;
        self.render(&loaded).await
    }

    async fn render(&self, loaded: &QuoteWithItems) -> Result<RenderedQuote, AppError> {
        let document = QuoteDocument {
            quote: &loaded.quote,
            items: &loaded.items,
            brand_name: &self.settings.brand_name,
            base_url: &self.settings.app_base_url,
            issued_on: Utc::now().date_naive(),
        };

        let bytes = self.renderer.render_quote(&document).await?;
        Ok(RenderedQuote {
            filename: document.filename(),
            bytes,
        })
    }

    /// Render the proposal, email it, and only then mark the quote Sent
    pub async fn send(&self, public_id: &str, request: SendQuoteRequest) -> Result<(), AppError> {
        let loaded = self.fetch(public_id).await?;
        let quote = &loaded.quote;

        let to_email = non_blank(request.to_email)
            .or_else(|| non_blank(quote.contact_email.clone()))
            .ok_or_else(|| {
                AppError::Validation("Contact email is required to send the quote.".to_string())
            })?;
        validation::validate_recipient(&to_email)?;

        let to_name = non_blank(request.to_name)
            .or_else(|| non_blank(quote.contact_name.clone()))
            .unwrap_or_else(|| quote.customer.clone());
        let subject = non_blank(request.subject).unwrap_or_else(|| {
            format!("Your {} Proposal: {}", self.settings.brand_name, quote.name)
        });

        let rendered = self.render(&loaded).await?;
        let link = quote_url(&self.settings.app_base_url, &quote.public_id);
        let email = compose_email(&self.settings.brand_name, &link, to_email, to_name, subject, rendered);

        self.notifier.send(&email).await?;
        self.mark_sent(&quote.public_id).await?;

        tracing::info!("Sent quote {} to {}", quote.public_id, email.to_email);
        self.log_activity(
            "Quote sent",
            format!("{} to {}", quote.public_id, email.to_email),
        )
        .await;
        Ok(())
    }

    // =========================================================================
    // Acceptance & contracts
    // =========================================================================

    /// Upsert the quote's contract and mark the quote Accepted.
    /// Returns the contract's public id.
    pub async fn accept(&self, public_id: &str, input: AcceptQuote) -> Result<String, AppError> {
        let loaded = self.fetch(public_id).await?;
        let quote = &loaded.quote;

        let mut contract = derive_contract(quote, input, generate_public_id(CONTRACT_PREFIX));
        let mut attempt = 1;
        let accepted = loop {
            match self.store.accept_quote(quote.id, &contract).await {
                Ok(accepted) => break accepted,
                Err(StoreError::DuplicatePublicId(id)) => {
                    if attempt >= MAX_ID_ATTEMPTS {
                        return Err(AppError::unexpected(
                            "Failed to allocate a contract identifier",
                            StoreError::DuplicatePublicId(id),
                        ));
                    }
                    tracing::warn!("Contract id {} already taken, retrying with a new id", id);
                    attempt += 1;
                    contract.public_id = generate_public_id(CONTRACT_PREFIX);
                }
                Err(e) => return Err(e.into()),
            }
        };

        if quote.status == QuoteStatus::Accepted {
            tracing::info!("Quote {} was already accepted, contract updated", quote.public_id);
        }
        tracing::info!(
            "Quote {} accepted as contract {}",
            quote.public_id,
            accepted.public_id
        );
        self.log_activity(
            "Quote accepted",
            format!("{} became contract {}", quote.public_id, accepted.public_id),
        )
        .await;

        Ok(accepted.public_id)
    }

    pub async fn list_contracts(&self) -> Result<Vec<Contract>, AppError> {
        Ok(self.store.list_contracts().await?)
    }

    pub async fn fetch_contract(&self, public_id: &str) -> Result<Contract, AppError> {
        self.store
            .find_contract(public_id)
            .await?
            .ok_or(AppError::NotFound("Contract"))
    }

    pub async fn update_contract(
        &self,
        public_id: &str,
        patch: ContractPatch,
    ) -> Result<Contract, AppError> {
        if patch.is_empty() {
            return Err(ValidationError::NoFields("contract").into());
        }
        self.store
            .update_contract(public_id, &patch)
            .await?
            .ok_or(AppError::NotFound("Contract"))
    }

    /// Activity entries are advisory; a failed write never fails the caller
    async fn log_activity(&self, action: &str, detail: String) {
        if let Err(e) = self.store.record_activity(action, &detail, None).await {
            tracing::warn!("Failed to record activity '{}': {}", action, e);
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn compose_email(
    brand: &str,
    link: &str,
    to_email: String,
    to_name: String,
    subject: String,
    rendered: RenderedQuote,
) -> OutgoingEmail {
    use crate::documents::template::escape_html;

    let text = format!(
        "Hi {},\n\nYour {} proposal is ready: {}\n\nThe PDF is attached for your records.\n\nBest,\n{}",
        to_name, brand, link, brand
    );
    let html = format!(
        "<p>Hi {name},</p><p>Your {brand} proposal is ready.</p>\
         <p><a href=\"{link}\">Open the live proposal</a></p>\
         <p>The PDF is attached for your records.</p><p>Best,<br/>{brand}</p>",
        name = escape_html(&to_name),
        brand = escape_html(brand),
        link = escape_html(link)
    );

    OutgoingEmail {
        to_email,
        to_name,
        subject,
        text,
        html,
        attachments: vec![Attachment {
            filename: rendered.filename,
            content_type: "application/pdf",
            bytes: rendered.bytes,
        }],
    }
}
