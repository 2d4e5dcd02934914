//! Headless Chromium PDF printing

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use uuid::Uuid;

use super::{template, DocumentRenderer, QuoteDocument, RenderError};
use crate::config::{BrandingConfig, RendererConfig};

/// Prints the HTML proposal to PDF with `chromium --headless --print-to-pdf`.
///
/// Each render stages `<uuid>.html` and `<uuid>.pdf` in the work directory
/// and removes both before returning.
pub struct ChromiumRenderer {
    binary: String,
    timeout: Duration,
    work_dir: PathBuf,
    logo_path: Option<PathBuf>,
}

impl ChromiumRenderer {
    pub fn new(renderer: &RendererConfig, branding: &BrandingConfig) -> Self {
        Self {
            binary: renderer.binary.clone(),
            timeout: renderer.timeout,
            work_dir: std::env::temp_dir(),
            logo_path: branding.logo_path.clone(),
        }
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Logo as a data URI; an unreadable logo is skipped
    async fn load_logo(&self) -> Option<String> {
        let path = self.logo_path.as_ref()?;
        match tokio::fs::read(path).await {
            Ok(bytes) => Some(format!(
                "data:{};base64,{}",
                image_mime(path),
                STANDARD.encode(bytes)
            )),
            Err(e) => {
                tracing::warn!("Brand logo {} unavailable, rendering without it: {}", path.display(), e);
                None
            }
        }
    }

    async fn print(&self, html_path: &Path, pdf_path: &Path) -> Result<(), RenderError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", pdf_path.display()))
            .arg(format!("file://{}", html_path.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| RenderError::Timeout(self.timeout))?
            .map_err(RenderError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: stderr.trim().chars().take(500).collect(),
            });
        }
        Ok(())
    }
}

fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove render file {}: {}", path.display(), e);
        }
    }
}

#[async_trait]
impl DocumentRenderer for ChromiumRenderer {
    async fn render_quote(&self, document: &QuoteDocument<'_>) -> Result<Vec<u8>, RenderError> {
        let logo = self.load_logo().await;
        let html = template::proposal_html(document, logo.as_deref());

        let stem = Uuid::new_v4();
        let html_path = self.work_dir.join(format!("quote-{}.html", stem));
        let pdf_path = self.work_dir.join(format!("quote-{}.pdf", stem));

        tokio::fs::write(&html_path, html).await?;

        let printed = self.print(&html_path, &pdf_path).await;
        let result = match printed {
            Ok(()) => tokio::fs::read(&pdf_path).await.map_err(RenderError::from),
            Err(e) => Err(e),
        };

        remove_quietly(&html_path).await;
        remove_quietly(&pdf_path).await;

        let bytes = result?;
        if bytes.is_empty() {
            return Err(RenderError::EmptyOutput);
        }

        tracing::info!(
            "Rendered quote {} ({} bytes)",
            document.quote.public_id,
            bytes.len()
        );
        Ok(bytes)
    }
}
