//! Data models for the application
//!
//! Stored rows mirror the snake_case columns; every entity has a matching
//! camelCase response type built through an explicit `From` mapping.

pub mod contract;
pub mod lenient;
pub mod quote;
pub mod records;

pub use contract::*;
pub use quote::*;
pub use records::*;

use serde::Serialize;

// =============================================================================
// API Responses
// =============================================================================

/// `{ "id": "<public id>" }` returned by create/accept operations
#[derive(Debug, Clone, Serialize)]
pub struct IdResponse {
    pub id: String,
}

/// `{ "ok": true }` returned by fire-and-forget operations
#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
