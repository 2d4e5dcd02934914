//! Outbound email

pub mod mailjet;

pub use mailjet::MailjetNotifier;

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("mail provider is not configured (set MAILJET_API_KEY, MAILJET_API_SECRET and MAILJET_FROM_EMAIL)")]
    NotConfigured,

    #[error("mail provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Transactional email delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Resolves only once the provider has accepted the message
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError>;
}
