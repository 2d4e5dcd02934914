//! Contract endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use super::{ApiJson, AppState};
use crate::error::AppError;
use crate::models::{ContractPatch, ContractResponse};

pub async fn list_contracts(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContractResponse>>, AppError> {
    let contracts = state.quotes.list_contracts().await?;
    Ok(Json(contracts.into_iter().map(ContractResponse::from).collect()))
}

pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContractResponse>, AppError> {
    let contract = state.quotes.fetch_contract(&id).await?;
    Ok(Json(contract.into()))
}

/// Sparse update; unknown fields are ignored and an update with no
/// recognized field is rejected
pub async fn update_contract(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ContractPatch>,
) -> Result<Json<ContractResponse>, AppError> {
    let contract = state.quotes.update_contract(&id, patch).await?;
    tracing::info!("Contract {} updated", contract.public_id);
    Ok(Json(contract.into()))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn accepted_contract(app: &TestApp) -> String {
        let created = body_json(
            call(
                &app.router,
                json_request(
                    "POST",
                    "/api/quotes",
                    json!({"name": "Helpdesk", "customer": "Acme", "owner": "Sam"}),
                ),
            )
            .await,
        )
        .await;
        let quote_id = created["id"].as_str().unwrap().to_string();

        let accepted = body_json(
            call(
                &app.router,
                json_request(
                    "POST",
                    &format!("/api/quotes/{}/accept", quote_id),
                    json!({"slaTier": "Gold", "riskLevel": "Low"}),
                ),
            )
            .await,
        )
        .await;
        accepted["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_patch_applies_and_clears_fields() {
        let app = app();
        let id = accepted_contract(&app).await;
        let uri = format!("/api/contracts/{}", id);

        let response = call(
            &app.router,
            json_request("PATCH", &uri, json!({"status": "Active", "slaTier": null, "bogus": 1})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "Active");
        assert!(body["slaTier"].is_null());
        assert_eq!(body["riskLevel"], "Low");
        assert_eq!(body["owner"], "Sam");
    }

    #[tokio::test]
    async fn test_patch_without_known_fields_is_400() {
        let app = app();
        let id = accepted_contract(&app).await;

        let response = call(
            &app.router,
            json_request("PATCH", &format!("/api/contracts/{}", id), json!({"bogus": true})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "No contract fields provided"}));
    }

    #[tokio::test]
    async fn test_unknown_contract_is_404() {
        let app = app();
        let response = call(
            &app.router,
            json_request("PATCH", "/api/contracts/CTR-2026-0000", json!({"status": "Active"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let list = body_json(call(&app.router, empty_request("GET", "/api/contracts")).await).await;
        assert!(list.as_array().unwrap().is_empty());
    }
}
