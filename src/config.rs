//! Application configuration
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database connection URL
    pub database_url: String,
    /// Built frontend (SPA) directory
    pub frontend_dir: String,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Environment (development/production)
    pub environment: Environment,
    /// Public base URL used for "review online" links in documents and emails
    pub app_base_url: String,
    /// Currency applied to quotes created without one
    pub default_currency: String,
    pub branding: BrandingConfig,
    pub renderer: RendererConfig,
    /// Mail provider credentials; sending fails while unset
    pub mailjet: Option<MailjetConfig>,
    /// Identity provider used for the admin-protected PDF path
    pub identity: Option<IdentityConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct BrandingConfig {
    pub name: String,
    pub logo_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Chromium (or compatible) executable
    pub binary: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MailjetConfig {
    pub api_key: String,
    pub api_secret: String,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        // DATABASE_URL, or the individual DATABASE_SERVER_* components
        let database_url = env::var("DATABASE_URL")
            .or_else(|_| {
                let host = env::var("DATABASE_SERVER_HOST")?;
                let port =
                    env::var("DATABASE_SERVER_PORT").unwrap_or_else(|_| "5432".to_string());
                let user = env::var("DATABASE_SERVER_USER")?;
                let password = env::var("DATABASE_PASSWORD")?;
                let db = env::var("DATABASE_DB")?;
                Ok(format!(
                    "postgres://{}:{}@{}:{}/{}",
                    user, password, host, port, db
                ))
            })
            .map_err(|_: env::VarError| {
                ConfigError::Missing(
                    "DATABASE_URL or DATABASE_SERVER_HOST + DATABASE_SERVER_USER + DATABASE_PASSWORD + DATABASE_DB is required".to_string(),
                )
            })?;

        let port = match env::var("PORT") {
            Ok(p) => p
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT must be a number, got '{}'", p)))?,
            Err(_) => 8081,
        };

        let mailjet = match (
            non_empty_var("MAILJET_API_KEY"),
            non_empty_var("MAILJET_API_SECRET"),
            non_empty_var("MAILJET_FROM_EMAIL"),
        ) {
            (Some(api_key), Some(api_secret), Some(from_email)) => Some(MailjetConfig {
                api_key,
                api_secret,
                from_email,
                from_name: non_empty_var("MAILJET_FROM_NAME")
                    .unwrap_or_else(|| "Continuate".to_string()),
            }),
            _ => None,
        };

        let identity = match (non_empty_var("AUTH_URL"), non_empty_var("AUTH_API_KEY")) {
            (Some(base_url), Some(api_key)) => Some(IdentityConfig { base_url, api_key }),
            _ => None,
        };

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            database_url,
            frontend_dir: env::var("FRONTEND_DIR").unwrap_or_else(|_| "./dist".to_string()),
            max_body_size: env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2 * 1024 * 1024), // 2MB default
            cors_origins: env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["http://localhost:8080".to_string()]),
            environment,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            default_currency: non_empty_var("DEFAULT_CURRENCY")
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| "ZAR".to_string()),
            branding: BrandingConfig {
                name: non_empty_var("BRAND_NAME").unwrap_or_else(|| "Continuate".to_string()),
                logo_path: non_empty_var("BRAND_LOGO_PATH").map(PathBuf::from),
            },
            renderer: RendererConfig {
                binary: non_empty_var("PDF_RENDERER_BIN")
                    .unwrap_or_else(|| "chromium".to_string()),
                timeout: Duration::from_secs(
                    env::var("PDF_RENDER_TIMEOUT_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(60),
                ),
            },
            mailjet,
            identity,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
