use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::parser::aggregate::PropertyRecord;
use crate::settings::Settings;

pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable.";

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("no API key configured for the summary endpoint")]
    MissingApiKey,
    #[error("summary request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("summary endpoint returned status {0}")]
    Status(StatusCode),
    #[error("summary request timed out after {0:?}")]
    Timeout(Duration),
    #[error("summary response has no text")]
    Malformed,
}

impl SummaryError {
    fn is_retryable(&self) -> bool {
        match self {
            SummaryError::MissingApiKey | SummaryError::Malformed => false,
            SummaryError::Status(s) => *s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error(),
            SummaryError::Http(_) | SummaryError::Timeout(_) => true,
        }
    }
}

/// Client for the hosted text-generation endpoint.
pub struct Summarizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    max_attempts: u32,
    base_backoff: Duration,
}

impl Summarizer {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Summarizer {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(1000),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Summarizer::new(&settings.summary_endpoint, settings.summary_api_key.clone())
            .with_timeout(Duration::from_secs(settings.summary_timeout_secs))
            .with_retry(
                settings.summary_max_attempts,
                Duration::from_millis(settings.summary_backoff_ms),
            )
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, base_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_backoff = base_backoff;
        self
    }

    /// Summary text, or [`SUMMARY_UNAVAILABLE`] whatever goes wrong.
    pub async fn summarize(&self, records: &[PropertyRecord]) -> String {
        match self.summarize_with_retry(records).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Summary unavailable: {}", e);
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }

    async fn summarize_with_retry(&self, records: &[PropertyRecord]) -> Result<String, SummaryError> {
        let prompt = build_prompt(records);
        let mut attempt = 0u32;

        loop {
            match self.request_once(&prompt).await {
                Ok(text) => {
                    info!("Summary received ({} chars)", text.len());
                    return Ok(text);
                }
                Err(e) if e.is_retryable() && attempt + 1 < self.max_attempts => {
                    let backoff = self.base_backoff * 2u32.pow(attempt);
                    warn!(
                        "Summary attempt {}/{} failed ({}), backing off {:.1}s",
                        attempt + 1,
                        self.max_attempts,
                        e,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request_once(&self, prompt: &str) -> Result<String, SummaryError> {
        let key = self.api_key.as_deref().ok_or(SummaryError::MissingApiKey)?;
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let request = self
            .client
            .post(&self.endpoint)
            .query(&[("key", key)])
            .json(&body)
            .send();
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| SummaryError::Timeout(self.timeout))??;

        let status = response.status();
        if !status.is_success() {
            return Err(SummaryError::Status(status));
        }

        let value: Value = tokio::time::timeout(self.timeout, response.json())
            .await
            .map_err(|_| SummaryError::Timeout(self.timeout))?
            .map_err(|_| SummaryError::Malformed)?;
        reply_text(&value).ok_or(SummaryError::Malformed)
    }
}

pub fn build_prompt(records: &[PropertyRecord]) -> String {
    let data = serde_json::to_string_pretty(records).unwrap_or_default();
    format!(
        "Voici des lots extraits de relevés de propriété cadastraux (JSON). \
         Rédige un résumé concis en français : propriétaires, adresses, \
         nombre de lots et quotes-parts par section.\n\n{}",
        data
    )
}

fn reply_text(value: &Value) -> Option<String> {
    value
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
