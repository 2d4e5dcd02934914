//! Helpdesk ticket endpoints

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use sqlx::types::Json as SqlJson;
use sqlx::{Postgres, QueryBuilder};

use super::{ApiJson, ApiQuery, AppState};
use crate::db::{classify, StoreError};
use crate::error::AppError;
use crate::models::{CreateTicket, Ticket, TicketFilter, TicketResponse};
use crate::services::public_id::{generate_public_id, MAX_ID_ATTEMPTS, TICKET_PREFIX};
use crate::validation;

const DEFAULT_PRIORITY: &str = "Medium";

/// List tickets, newest first, optionally filtered
pub async fn list_tickets(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<TicketFilter>,
) -> Result<Json<Vec<TicketResponse>>, AppError> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM tickets WHERE TRUE");
    if let Some(status) = filter.status.filter(|s| !s.is_empty()) {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(email) = filter.requester_email.filter(|s| !s.is_empty()) {
        query.push(" AND requester_email = ").push_bind(email);
    }
    if let Some(customer) = filter.customer.filter(|s| !s.is_empty()) {
        query.push(" AND customer = ").push_bind(customer);
    }
    query.push(" ORDER BY created_at DESC");

    let tickets = query
        .build_query_as::<Ticket>()
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(tickets.into_iter().map(TicketResponse::from).collect()))
}

/// Open a ticket; the description becomes its first note
pub async fn create_ticket(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateTicket>,
) -> Result<(StatusCode, Json<TicketResponse>), AppError> {
    validation::validate_create_ticket(&input)?;

    let notes = input.initial_notes(Utc::now());
    let priority = input
        .priority
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PRIORITY)
        .to_string();

    for attempt in 1..=MAX_ID_ATTEMPTS {
        let public_id = generate_public_id(TICKET_PREFIX);
        let inserted = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (public_id, customer, requester_name, requester_email, subject, category, priority, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&public_id)
        .bind(input.customer.trim())
        .bind(&input.requester_name)
        .bind(&input.requester_email)
        .bind(input.subject.trim())
        .bind(&input.category)
        .bind(&priority)
        .bind(SqlJson(&notes))
        .fetch_one(&state.pool)
        .await
        .map_err(|e| classify(e, &public_id));

        match inserted {
            Ok(ticket) => {
                tracing::info!("Ticket {} opened for {}", ticket.public_id, ticket.customer);
                return Ok((StatusCode::CREATED, Json(ticket.into())));
            }
            Err(StoreError::DuplicatePublicId(id)) => {
                tracing::warn!("Ticket id {} collided (attempt {})", id, attempt);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::unexpected(
        "Failed to allocate a ticket identifier",
        format!("{} attempts collided", MAX_ID_ATTEMPTS),
    ))
}
