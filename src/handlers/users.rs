//! Account profile endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ApiJson, ApiQuery, AppState};
use crate::error::AppError;
use crate::models::{EmailQuery, Profile, ProfileResponse, UpdateProfile};
use crate::validation::ValidationError;

pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<Vec<ProfileResponse>>, AppError> {
    let profiles = match query.email.filter(|e| !e.is_empty()) {
        Some(email) => {
            sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE email = $1")
                .bind(email)
                .fetch_all(&state.pool)
                .await?
        }
        None => {
            sqlx::query_as::<_, Profile>("SELECT * FROM profiles ORDER BY created_at DESC")
                .fetch_all(&state.pool)
                .await?
        }
    };

    Ok(Json(profiles.into_iter().map(ProfileResponse::from).collect()))
}

/// Update the supplied profile fields only
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<UpdateProfile>,
) -> Result<Json<ProfileResponse>, AppError> {
    if input.is_empty() {
        return Err(ValidationError::NoFields("profile").into());
    }

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE profiles SET ");
    let mut fields = query.separated(", ");
    for (column, value) in [
        ("name", input.name),
        ("company", input.company),
        ("phone", input.phone),
        ("status", input.status),
    ] {
        if let Some(value) = value {
            fields.push(column).push_unseparated(" = ").push_bind_unseparated(value);
        }
    }
    query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

    let profile = query
        .build_query_as::<Profile>()
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    tracing::info!("Profile {} updated", profile.id);
    Ok(Json(profile.into()))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_without_fields_is_400() {
        let app = app();
        let response = call(
            &app.router,
            json_request(
                "PATCH",
                "/api/users/5f0c3c8e-2d7e-4d7b-9d1e-0a4f3b2c1d00",
                json!({"role": "admin"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "No profile fields provided"}));
    }

    #[tokio::test]
    async fn test_update_rejects_malformed_id() {
        let app = app();
        let response = call(
            &app.router,
            json_request("PATCH", "/api/users/not-a-uuid", json!({"name": "Lerato"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
