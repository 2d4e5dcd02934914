//! HTTP request handlers

pub mod auth;
pub mod billing;
pub mod contracts;
pub mod dashboard;
pub mod middleware;
pub mod quotes;
pub mod tickets;
pub mod users;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::AppError;
use crate::services::QuoteService;
use auth::IdentityProvider;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub quotes: QuoteService,
    pub identity: Arc<dyn IdentityProvider>,
    pub is_production: bool,
}

/// `Json` whose rejections use the `{ "error": ... }` body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejections use the `{ "error": ... }` body
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// JSON body that may be omitted entirely; an empty body yields `T::default()`
pub struct OptionalJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(OptionalJson)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))
    }
}

/// Routes mounted under `/api`
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/generate-pdf", post(quotes::generate_pdf))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_admin));

    Router::new()
        .route("/health", get(dashboard::health))
        // Quotes
        .route("/quotes", get(quotes::list_quotes).post(quotes::create_quote))
        .route("/quotes/:id", get(quotes::get_quote))
        .route("/quotes/:id/pdf", get(quotes::download_pdf))
        .route("/quotes/:id/send", post(quotes::send_quote))
        .route("/quotes/:id/viewed", post(quotes::mark_viewed))
        .route("/quotes/:id/accept", post(quotes::accept_quote))
        // Contracts
        .route("/contracts", get(contracts::list_contracts))
        .route(
            "/contracts/:id",
            get(contracts::get_contract).patch(contracts::update_contract),
        )
        // Helpdesk
        .route("/tickets", get(tickets::list_tickets).post(tickets::create_ticket))
        // Billing
        .route("/subscriptions", get(billing::list_subscriptions))
        .route("/subscriptions/:id", get(billing::get_subscription))
        .route("/invoices", get(billing::list_invoices))
        // Accounts
        .route("/users", get(users::list_users))
        .route("/users/:id", axum::routing::patch(users::update_user))
        // Dashboards
        .route("/reports", get(dashboard::list_reports))
        .route("/reports/summary", get(dashboard::report_summary))
        .route("/dashboard/admin", get(dashboard::admin_dashboard))
        .route("/portal/summary", get(dashboard::portal_summary))
        .route("/portal/subscription", get(dashboard::portal_subscription))
        .merge(admin)
}
