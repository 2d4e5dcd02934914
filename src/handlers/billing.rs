//! Subscription and invoice endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::{Postgres, QueryBuilder};

use super::{ApiQuery, AppState};
use crate::error::AppError;
use crate::models::{
    Invoice, InvoiceFilter, InvoiceResponse, Subscription, SubscriptionFilter,
    SubscriptionResponse,
};

pub(crate) const INVOICE_SELECT: &str =
    "SELECT invoices.*, subscriptions.public_id AS subscription_public_id \
     FROM invoices JOIN subscriptions ON subscriptions.id = invoices.subscription_id";

pub async fn list_subscriptions(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<SubscriptionFilter>,
) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    let subscriptions = match filter.customer.filter(|c| !c.is_empty()) {
        Some(customer) => {
            sqlx::query_as::<_, Subscription>(
                "SELECT * FROM subscriptions WHERE customer = $1 ORDER BY created_at DESC",
            )
            .bind(customer)
            .fetch_all(&state.pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions ORDER BY created_at DESC")
                .fetch_all(&state.pool)
                .await?
        }
    };

    Ok(Json(
        subscriptions
            .into_iter()
            .map(SubscriptionResponse::from)
            .collect(),
    ))
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let subscription =
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE public_id = $1")
            .bind(&id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or(AppError::NotFound("Subscription"))?;

    Ok(Json(subscription.into()))
}

/// Invoices newest first, by subscription public id or customer
pub async fn list_invoices(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<InvoiceFilter>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(INVOICE_SELECT);
    query.push(" WHERE TRUE");
    if let Some(subscription_id) = filter.subscription_id.filter(|s| !s.is_empty()) {
        query
            .push(" AND subscriptions.public_id = ")
            .push_bind(subscription_id);
    }
    if let Some(customer) = filter.customer.filter(|c| !c.is_empty()) {
        query.push(" AND subscriptions.customer = ").push_bind(customer);
    }
    query.push(" ORDER BY invoices.created_at DESC");

    let invoices = query
        .build_query_as::<Invoice>()
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(invoices.into_iter().map(InvoiceResponse::from).collect()))
}
