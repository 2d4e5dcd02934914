//! Continuate Portal
//!
//! Back end for the Continuate managed IT services portal.
//!
//! ## Features
//!
//! - **Quotes**: priced proposals with line items, PDF rendering and email delivery
//! - **Contracts**: derived from accepted quotes, maintained by account managers
//! - **Client Portal**: tickets, subscriptions, invoices and reporting dashboards

mod config;
mod db;
mod documents;
mod error;
mod handlers;
mod models;
mod notify;
mod services;
mod validation;

use axum::{middleware::from_fn_with_state, Router};
use documents::ChromiumRenderer;
use handlers::{auth::RemoteIdentity, AppState};
use notify::MailjetNotifier;
use services::{QuoteService, QuoteSettings};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "continuate_portal=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Starting Continuate Portal");
    tracing::info!("Environment: {:?}", config.environment);

    // Create database pool
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await?;

    if config.mailjet.is_none() {
        tracing::warn!("Mailjet credentials not set; sending quotes will fail");
    }

    // Quote workflow collaborators
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    let quotes = QuoteService::new(
        Arc::new(db::PgQuoteStore::new(pool.clone())),
        Arc::new(ChromiumRenderer::new(&config.renderer, &config.branding)),
        Arc::new(MailjetNotifier::new(http.clone(), config.mailjet.clone())),
        QuoteSettings {
            app_base_url: config.app_base_url.clone(),
            brand_name: config.branding.name.clone(),
            default_currency: config.default_currency.clone(),
        },
    );

    // Create application state
    let state = AppState {
        pool: pool.clone(),
        quotes,
        identity: Arc::new(RemoteIdentity::new(http, config.identity.clone())),
        is_production: config.is_production(),
    };

    // Build CORS layer
    let cors = if config.is_production() {
        CorsLayer::new()
            .allow_origin(
                config
                    .cors_origins
                    .iter()
                    .filter_map(|o| o.parse().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::permissive()
    };

    // Single-page app: unknown paths fall back to index.html
    let frontend = ServeDir::new(&config.frontend_dir)
        .fallback(ServeFile::new(Path::new(&config.frontend_dir).join("index.html")));

    // Build main router
    let app = Router::new()
        .nest("/api", handlers::api_routes(&state))
        .fallback_service(frontend)
        .layer(from_fn_with_state(state.clone(), handlers::middleware::security_headers))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(cors)
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Frontend served from: {}", config.frontend_dir);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, closing database pool");
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
