//! Mailjet Send API v3.1 over plain REST

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use super::{Notifier, NotifyError, OutgoingEmail};
use crate::config::MailjetConfig;

const SEND_URL: &str = "https://api.mailjet.com/v3.1/send";

pub struct MailjetNotifier {
    client: reqwest::Client,
    config: Option<MailjetConfig>,
    endpoint: String,
}

impl MailjetNotifier {
    /// Without credentials every send fails with `NotConfigured`
    pub fn new(client: reqwest::Client, config: Option<MailjetConfig>) -> Self {
        Self {
            client,
            config,
            endpoint: SEND_URL.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendRequest<'a> {
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Message<'a> {
    from: Address<'a>,
    to: Vec<Address<'a>>,
    subject: &'a str,
    text_part: &'a str,
    #[serde(rename = "HTMLPart")]
    html_part: &'a str,
    attachments: Vec<EncodedAttachment<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Address<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct EncodedAttachment<'a> {
    content_type: &'a str,
    filename: &'a str,
    base64_content: String,
}

fn build_request<'a>(config: &'a MailjetConfig, email: &'a OutgoingEmail) -> SendRequest<'a> {
    SendRequest {
        messages: vec![Message {
            from: Address {
                email: &config.from_email,
                name: &config.from_name,
            },
            to: vec![Address {
                email: &email.to_email,
                name: &email.to_name,
            }],
            subject: &email.subject,
            text_part: &email.text,
            html_part: &email.html,
            attachments: email
                .attachments
                .iter()
                .map(|a| EncodedAttachment {
                    content_type: a.content_type,
                    filename: &a.filename,
                    base64_content: STANDARD.encode(&a.bytes),
                })
                .collect(),
        }],
    }
}

#[async_trait]
impl Notifier for MailjetNotifier {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        let config = self.config.as_ref().ok_or(NotifyError::NotConfigured)?;

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&config.api_key, Some(&config.api_secret))
            .json(&build_request(config, email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Quote email accepted by Mailjet for {}", email.to_email);
        Ok(())
    }
}
