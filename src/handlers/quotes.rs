//! Quote endpoints: CRUD, PDF download, delivery and acceptance

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};

use super::middleware::AdminIdentity;
use super::{ApiJson, AppState, OptionalJson};
use crate::error::AppError;
use crate::models::{
    AcceptQuote, CreateQuote, GeneratePdfRequest, IdResponse, OkResponse, QuoteResponse,
    SendQuoteRequest,
};
use crate::services::RenderedQuote;

pub async fn list_quotes(State(state): State<AppState>) -> Result<Json<Vec<QuoteResponse>>, AppError> {
    let quotes = state.quotes.list().await?;
    Ok(Json(quotes.into_iter().map(QuoteResponse::from).collect()))
}

pub async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QuoteResponse>, AppError> {
    let quote = state.quotes.fetch(&id).await?;
    Ok(Json(quote.into()))
}

pub async fn create_quote(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateQuote>,
) -> Result<(StatusCode, Json<IdResponse>), AppError> {
    let id = state.quotes.create(input).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

pub async fn send_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OptionalJson(request): OptionalJson<SendQuoteRequest>,
) -> Result<Json<OkResponse>, AppError> {
    state.quotes.send(&id, request).await?;
    Ok(Json(OkResponse::ok()))
}

pub async fn mark_viewed(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    state.quotes.mark_viewed(&id).await?;
    Ok(Json(OkResponse::ok()))
}

/// Accept the quote, creating or refreshing its contract
pub async fn accept_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OptionalJson(input): OptionalJson<AcceptQuote>,
) -> Result<Json<IdResponse>, AppError> {
    let contract_id = state.quotes.accept(&id, input).await?;
    Ok(Json(IdResponse { id: contract_id }))
}

pub async fn download_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let rendered = state.quotes.render_pdf(&id).await?;
    Ok(pdf_response(rendered))
}

/// Admin variant of the PDF download, keyed by body instead of path
pub async fn generate_pdf(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    ApiJson(input): ApiJson<GeneratePdfRequest>,
) -> Result<Response, AppError> {
    let quote_id = input
        .quote_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("quoteId is required".to_string()))?;

    let rendered = state.quotes.render_pdf(&quote_id).await?;
    tracing::info!("Admin {} generated PDF for quote {}", admin.user_id, quote_id);
    Ok(pdf_response(rendered))
}

fn pdf_response(rendered: RenderedQuote) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", rendered.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.bytes,
    )
        .into_response()
}
