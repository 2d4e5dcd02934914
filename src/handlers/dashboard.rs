//! Reports, admin dashboard and client portal endpoints

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::billing::INVOICE_SELECT;
use super::{ApiQuery, AppState};
use crate::error::AppError;
use crate::models::{
    ActivityEntry, ActivityResponse, EmailQuery, Invoice, InvoiceResponse, OkResponse, Profile,
    ProfileResponse, Report, ReportResponse, Subscription, SubscriptionResponse, Ticket,
    TicketResponse,
};
use crate::services::reports::{self, AdminStats, ReportSummary, SubscriptionStat, TicketStat};

const RECENT_ACTIVITY: i64 = 8;
const PORTAL_TICKETS: i64 = 5;
const CLIENT_ROLE: &str = "client";

pub async fn health() -> Json<OkResponse> {
    Json(OkResponse::ok())
}

pub async fn list_reports(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportResponse>>, AppError> {
    let reports = sqlx::query_as::<_, Report>("SELECT * FROM reports ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(reports.into_iter().map(ReportResponse::from).collect()))
}

async fn subscription_stats(state: &AppState) -> Result<Vec<SubscriptionStat>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionStat>("SELECT status, mrr FROM subscriptions")
        .fetch_all(&state.pool)
        .await
}

pub async fn report_summary(State(state): State<AppState>) -> Result<Json<ReportSummary>, AppError> {
    let subscriptions = subscription_stats(&state).await?;
    let tickets = sqlx::query_as::<_, TicketStat>("SELECT status, category FROM tickets")
        .fetch_all(&state.pool)
        .await?;
    let signups: Vec<DateTime<Utc>> = sqlx::query_scalar("SELECT created_at FROM profiles")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(reports::summarize(
        &subscriptions,
        &tickets,
        &signups,
        Utc::now(),
    )))
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub stats: AdminStats,
    pub activity: Vec<ActivityResponse>,
}

pub async fn admin_dashboard(
    State(state): State<AppState>,
) -> Result<Json<AdminDashboard>, AppError> {
    let total_clients: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE role = $1")
        .bind(CLIENT_ROLE)
        .fetch_one(&state.pool)
        .await?;
    let ticket_statuses: Vec<String> = sqlx::query_scalar("SELECT status FROM tickets")
        .fetch_all(&state.pool)
        .await?;
    let subscriptions = subscription_stats(&state).await?;
    let activity = sqlx::query_as::<_, ActivityEntry>(
        "SELECT * FROM activity_log ORDER BY created_at DESC LIMIT $1",
    )
    .bind(RECENT_ACTIVITY)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(AdminDashboard {
        stats: reports::admin_stats(total_clients, &ticket_statuses, &subscriptions),
        activity: activity.into_iter().map(ActivityResponse::from).collect(),
    }))
}

// =============================================================================
// Client portal
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PortalSummary {
    pub profile: Option<ProfileResponse>,
    pub subscription: Option<SubscriptionResponse>,
    pub tickets: Vec<TicketResponse>,
}

#[derive(Debug, Serialize)]
pub struct PortalSubscription {
    pub profile: Option<ProfileResponse>,
    pub subscription: Option<SubscriptionResponse>,
    pub invoices: Vec<InvoiceResponse>,
}

fn required_email(query: EmailQuery) -> Result<String, AppError> {
    query
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("email is required".to_string()))
}

async fn profile_by_email(state: &AppState, email: &str) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE email = $1")
        .bind(email)
        .fetch_optional(&state.pool)
        .await
}

/// Most recent subscription held under the profile's customer key
async fn latest_subscription(
    state: &AppState,
    profile: &Profile,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        "SELECT * FROM subscriptions WHERE customer = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(profile.customer_key())
    .fetch_optional(&state.pool)
    .await
}

pub async fn portal_summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<PortalSummary>, AppError> {
    let email = required_email(query)?;
    let Some(profile) = profile_by_email(&state, &email).await? else {
        return Ok(Json(PortalSummary {
            profile: None,
            subscription: None,
            tickets: Vec::new(),
        }));
    };

    let subscription = latest_subscription(&state, &profile).await?;
    let tickets = sqlx::query_as::<_, Ticket>(
        "SELECT * FROM tickets WHERE requester_email = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(&email)
    .bind(PORTAL_TICKETS)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(PortalSummary {
        profile: Some(profile.into()),
        subscription: subscription.map(SubscriptionResponse::from),
        tickets: tickets.into_iter().map(TicketResponse::from).collect(),
    }))
}

pub async fn portal_subscription(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<PortalSubscription>, AppError> {
    let email = required_email(query)?;
    let Some(profile) = profile_by_email(&state, &email).await? else {
        return Ok(Json(PortalSubscription {
            profile: None,
            subscription: None,
            invoices: Vec::new(),
        }));
    };

    let subscription = latest_subscription(&state, &profile).await?;
    let invoices = match &subscription {
        Some(sub) => {
            let sql = format!(
                "{} WHERE invoices.subscription_id = $1 ORDER BY invoices.created_at DESC",
                INVOICE_SELECT
            );
            sqlx::query_as::<_, Invoice>(&sql)
                .bind(sub.id)
                .fetch_all(&state.pool)
                .await?
        }
        None => Vec::new(),
    };

    Ok(Json(PortalSubscription {
        profile: Some(profile.into()),
        subscription: subscription.map(SubscriptionResponse::from),
        invoices: invoices.into_iter().map(InvoiceResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_portal_requires_email() {
        let app = app();
        for uri in [
            "/api/portal/summary",
            "/api/portal/subscription?email=",
        ] {
            let response = call(&app.router, empty_request("GET", uri)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await, json!({"error": "email is required"}));
        }
    }
}
