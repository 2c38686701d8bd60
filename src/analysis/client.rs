//! HTTP client for the remote analysis service
//!
//! Each mode maps to one POST endpoint under `<baseUrl>/<apiPath>/`. The
//! capture is uploaded as a single multipart part named `file` with the
//! file name `image.jpg`; the service answers with
//! `{ success, analysis?, text?, type? }`.

use super::AnalysisError;
use crate::capture::Capture;
use crate::config::ServiceConfig;
use crate::session::Mode;
use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// File name sent with every upload
pub const UPLOAD_FILE_NAME: &str = "image.jpg";

/// Response body shared by all analysis endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub success: bool,
    /// Narrative analysis (shelf and navigation endpoints)
    #[serde(default)]
    pub analysis: Option<String>,
    /// Extracted text (text reading endpoint)
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AnalysisResponse {
    /// Resolve the result text, preferring `analysis` over `text`
    pub fn into_text(self) -> Result<String, AnalysisError> {
        if !self.success {
            let reason = self
                .error
                .unwrap_or_else(|| "service reported failure".to_string());
            return Err(AnalysisError::Semantic(reason));
        }

        self.analysis
            .filter(|s| !s.trim().is_empty())
            .or(self.text.filter(|s| !s.trim().is_empty()))
            .ok_or_else(|| AnalysisError::Semantic("response carries no result text".to_string()))
    }
}

/// Analysis service client
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    api_base: Url,
    health_url: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl AnalysisClient {
    /// Create a client from the service configuration
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let origin = with_trailing_slash(
            Url::parse(&config.base_url)
                .with_context(|| format!("Invalid service URL: {}", config.base_url))?,
        );

        let api_path = config.api_path.trim_matches('/');
        let api_base = if api_path.is_empty() {
            origin.clone()
        } else {
            origin
                .join(&format!("{}/", api_path))
                .with_context(|| format!("Invalid API path: {}", config.api_path))?
        };
        let health_url = origin.join("health").context("Invalid health URL")?;

        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_base,
            health_url,
            client,
            timeout,
        })
    }

    /// Base URL the mode endpoints are resolved against
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Full URL of the endpoint serving `mode`
    pub fn endpoint_url(&self, mode: Mode) -> Result<Url, AnalysisError> {
        self.api_base
            .join(mode.endpoint())
            .map_err(|e| AnalysisError::Transport(format!("invalid endpoint URL: {}", e)))
    }

    /// Check if the analysis service is reachable
    pub async fn is_available(&self) -> bool {
        match self.client.get(self.health_url.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Analysis service not available: {}", e);
                false
            }
        }
    }

    /// Upload `capture` to the endpoint for `mode` and return the result text
    pub async fn analyze(&self, mode: Mode, capture: &Capture) -> Result<String, AnalysisError> {
        let url = self.endpoint_url(mode)?;
        let form = Form::new().part(FILE_FIELD, upload_part(capture));

        tracing::debug!("POST {} ({} bytes)", url, capture.len());

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Transport(format!(
                        "request timed out after {} seconds",
                        self.timeout.as_secs()
                    ))
                } else {
                    AnalysisError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body: AnalysisResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Semantic(format!("malformed response: {}", e)))?;

        tracing::debug!("Analysis response type: {:?}", body.kind);
        body.into_text()
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn upload_part(capture: &Capture) -> Part {
    let part = || Part::bytes(capture.bytes().to_vec()).file_name(UPLOAD_FILE_NAME);
    match part().mime_str(capture.content_type()) {
        Ok(part) => part,
        Err(e) => {
            tracing::warn!(
                "Capture content type {:?} rejected, sending untyped part: {}",
                capture.content_type(),
                e
            );
            part()
        }
    }
}
