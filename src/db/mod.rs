//! Database access layer
//!
//! The quote/contract workflow reaches the store through [`QuoteStore`];
//! [`PgQuoteStore`] is the production implementation.

#[cfg(test)]
pub mod memory;
pub mod pool;
pub mod quotes;

pub use pool::{create_pool, run_migrations};
pub use quotes::PgQuoteStore;

use crate::models::{Contract, ContractPatch, NewContract, NewQuote, Quote, QuoteStatus, QuoteWithItems};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique public identifier was already taken
    #[error("public identifier '{0}' already exists")]
    DuplicatePublicId(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Write refused by the in-memory test store
    #[cfg(test)]
    #[error("write rejected: {0}")]
    Rejected(String),
}

const UNIQUE_VIOLATION: &str = "23505";

/// Turn a unique violation on a public id constraint into `DuplicatePublicId`
pub(crate) fn classify(err: sqlx::Error, public_id: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        let is_public_id = db_err
            .constraint()
            .map(|c| c.ends_with("public_id_key"))
            .unwrap_or(false);
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) && is_public_id {
            return StoreError::DuplicatePublicId(public_id.to_string());
        }
    }
    StoreError::Database(err)
}

/// Persistence operations behind the quote lifecycle
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// All quotes with their items, newest first
    async fn list_quotes(&self) -> Result<Vec<QuoteWithItems>, StoreError>;

    async fn find_quote(&self, public_id: &str) -> Result<Option<QuoteWithItems>, StoreError>;

    /// Insert the quote and every item in one transaction
    async fn insert_quote(&self, quote: &NewQuote) -> Result<Quote, StoreError>;

    /// Set the status and stamp its timestamp. Returns the previous status,
    /// or `None` when no quote has this public id.
    async fn set_status(
        &self,
        public_id: &str,
        status: QuoteStatus,
    ) -> Result<Option<QuoteStatus>, StoreError>;

    /// Upsert the contract keyed by the quote's internal id and mark the
    /// quote accepted, in one transaction
    async fn accept_quote(
        &self,
        quote_id: i64,
        contract: &NewContract,
    ) -> Result<Contract, StoreError>;

    /// All contracts, newest first
    async fn list_contracts(&self) -> Result<Vec<Contract>, StoreError>;

    async fn find_contract(&self, public_id: &str) -> Result<Option<Contract>, StoreError>;

    /// Apply a sparse update; `None` when no contract has this public id
    async fn update_contract(
        &self,
        public_id: &str,
        patch: &ContractPatch,
    ) -> Result<Option<Contract>, StoreError>;

    async fn record_activity(
        &self,
        action: &str,
        detail: &str,
        actor: Option<&str>,
    ) -> Result<(), StoreError>;
}
