//! Middleware for admin authorization and security headers

use crate::error::AppError;
use crate::handlers::auth::{extract_bearer_token, IdentityError};
use crate::handlers::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const ADMIN_ROLE: &str = "admin";

/// Identity of the admin making the request, available via Extension<AdminIdentity>
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity {
    pub user_id: Uuid,
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let user_id = match state.identity.resolve_user(&token).await {
        Ok(id) => id,
        Err(IdentityError::InvalidToken) => {
            return Err(AppError::Unauthorized("Invalid or expired token".to_string()));
        }
        Err(e @ IdentityError::NotConfigured) => {
            return Err(AppError::unexpected("Authentication is not configured", e));
        }
        Err(e) => return Err(AppError::upstream("Failed to verify token", e)),
    };

    let role: Option<String> =
        sqlx::query_scalar("SELECT role FROM profiles WHERE auth_user_id = $1")
            .bind(user_id)
            .fetch_optional(&state.pool)
            .await?;

    if role.as_deref() != Some(ADMIN_ROLE) {
        tracing::warn!("Non-admin user {} denied access to {}", user_id, request.uri().path());
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    request.extensions_mut().insert(AdminIdentity { user_id });
    Ok(next.run(request).await)
}

/// Security headers middleware
pub async fn security_headers(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if state.is_production {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains"),
        );
    }

    response
}
