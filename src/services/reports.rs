//! Dashboard and report aggregation over plain rows

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

pub const RESOLVED: &str = "Resolved";
pub const ACTIVE: &str = "Active";
pub const CANCELLED: &str = "Cancelled";
pub const UNCATEGORISED: &str = "General";

const TOP_ISSUE_LIMIT: usize = 6;
const REPORTED_UPTIME: f64 = 99.97;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionStat {
    pub status: String,
    pub mrr: Decimal,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TicketStat {
    pub status: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiCard {
    pub label: &'static str,
    pub value: Decimal,
    pub change: Option<Decimal>,
    pub format: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueShare {
    pub category: String,
    pub count: usize,
    pub pct: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub kpis: Vec<KpiCard>,
    pub top_issues: Vec<IssueShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_clients: i64,
    pub open_tickets: usize,
    pub active_subs: usize,
    pub mrr: Decimal,
    pub uptime: f64,
}

/// Rounded percentage; an empty denominator counts as one
fn percent(part: usize, whole: usize) -> i64 {
    let whole = whole.max(1) as f64;
    (part as f64 / whole * 100.0).round() as i64
}

fn total_mrr(subscriptions: &[SubscriptionStat]) -> Decimal {
    subscriptions.iter().map(|s| s.mrr).sum()
}

pub fn summarize(
    subscriptions: &[SubscriptionStat],
    tickets: &[TicketStat],
    client_signups: &[DateTime<Utc>],
    now: DateTime<Utc>,
) -> ReportSummary {
    let resolved = tickets.iter().filter(|t| t.status == RESOLVED).count();
    let cancelled = subscriptions.iter().filter(|s| s.status == CANCELLED).count();
    let window_start = now - Duration::days(30);
    let new_clients = client_signups.iter().filter(|at| **at >= window_start).count();

    let kpis = vec![
        KpiCard {
            label: "Monthly Revenue",
            value: total_mrr(subscriptions),
            change: None,
            format: "currency",
        },
        KpiCard {
            label: "Resolution Rate",
            value: Decimal::from(percent(resolved, tickets.len())),
            change: None,
            format: "percent",
        },
        KpiCard {
            label: "New Clients (Month)",
            value: Decimal::from(new_clients),
            change: None,
            format: "number",
        },
        KpiCard {
            label: "Churn Rate",
            value: Decimal::from(percent(cancelled, subscriptions.len())),
            change: None,
            format: "percent",
        },
    ];

    ReportSummary {
        kpis,
        top_issues: top_issues(tickets),
    }
}

/// Most frequent ticket categories; ties keep first-seen order
pub fn top_issues(tickets: &[TicketStat]) -> Vec<IssueShare> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for ticket in tickets {
        let category = ticket
            .category
            .as_deref()
            .unwrap_or(UNCATEGORISED);
        match counts.iter_mut().find(|(c, _)| c == category) {
            Some((_, count)) => *count += 1,
            None => counts.push((category.to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(TOP_ISSUE_LIMIT)
        .map(|(category, count)| IssueShare {
            pct: format!("{}%", percent(count, tickets.len())),
            category,
            count,
        })
        .collect()
}

pub fn admin_stats(
    total_clients: i64,
    ticket_statuses: &[String],
    subscriptions: &[SubscriptionStat],
) -> AdminStats {
    AdminStats {
        total_clients,
        open_tickets: ticket_statuses.iter().filter(|s| *s != RESOLVED).count(),
        active_subs: subscriptions.iter().filter(|s| s.status == ACTIVE).count(),
        mrr: total_mrr(subscriptions),
        uptime: REPORTED_UPTIME,
    }
}
