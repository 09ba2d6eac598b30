//! Prisma AIRS HTTPS transport

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::ACCEPT;
use reqwest::{Client as HttpClient, StatusCode};

use super::models::{Endpoint, RawResponse};
use super::retry::{RetryPolicy, retry_after};
use super::ScanTransport;
use crate::config::Credentials;
use crate::error::{ApiError, Error, Result};

/// Header carrying the AIRS API key
const API_KEY_HEADER: &str = "x-pan-token";

/// Longest upstream error body echoed back to callers
const MAX_ERROR_BODY: usize = 300;

/// AIRS API client
pub struct AirsClient {
    http: HttpClient,
    credentials: Arc<Credentials>,
    retry: RetryPolicy,
}

/// Outcome of a single failed attempt
enum AttemptFailure {
    /// Worth retrying; carries the cause for the exhaustion report
    Transient {
        cause: String,
        retry_after: Option<Duration>,
    },
    /// Surfaced immediately
    Fatal(Error),
}

impl AirsClient {
    /// Create a client over the HTTP client built during TLS negotiation
    pub fn new(credentials: Arc<Credentials>, http: HttpClient, retry: RetryPolicy) -> Self {
        Self {
            http,
            credentials,
            retry,
        }
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.credentials.base_url, endpoint.path())
    }

    async fn attempt(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<RawResponse, AttemptFailure> {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, self.credentials.api_key.expose())
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    AttemptFailure::Fatal(
                        ApiError::Transport {
                            attempts: 1,
                            cause: e.to_string(),
                        }
                        .into(),
                    )
                } else {
                    AttemptFailure::Transient {
                        cause: describe_send_error(&e),
                        retry_after: None,
                    }
                }
            })?;

        let status = response.status();
        let hint = retry_after(response.headers());

        match status {
            status if status.is_success() => {
                let text = response.text().await.map_err(|e| AttemptFailure::Transient {
                    cause: format!("Failed to read response body: {}", describe_send_error(&e)),
                    retry_after: None,
                })?;
                let body = serde_json::from_str(&text).map_err(|e| {
                    AttemptFailure::Fatal(
                        ApiError::MalformedResponse(format!("body is not valid JSON: {}", e))
                            .into(),
                    )
                })?;
                Ok(RawResponse {
                    status: status.as_u16(),
                    body,
                })
            }
            StatusCode::UNAUTHORIZED => Err(AttemptFailure::Fatal(ApiError::Unauthorized.into())),
            StatusCode::FORBIDDEN => Err(AttemptFailure::Fatal(ApiError::Forbidden.into())),
            StatusCode::TOO_MANY_REQUESTS => Err(AttemptFailure::Transient {
                cause: format!("HTTP {}", status),
                retry_after: hint,
            }),
            status if status.is_server_error() => {
                let text = response.text().await.unwrap_or_default();
                Err(AttemptFailure::Transient {
                    cause: format!("HTTP {}: {}", status, error_message(&text)),
                    retry_after: None,
                })
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(AttemptFailure::Fatal(
                    ApiError::Rejected {
                        status: status.as_u16(),
                        message: error_message(&text),
                    }
                    .into(),
                ))
            }
        }
    }
}

#[async_trait]
impl ScanTransport for AirsClient {
    async fn send(&self, endpoint: Endpoint, body: &serde_json::Value) -> Result<RawResponse> {
        let url = self.url(endpoint);
        let max_attempts = self.retry.max_attempts();
        let mut last_cause = String::new();

        for attempt in 1..=max_attempts {
            debug!(
                "POST {} (attempt {}/{})",
                endpoint.path(),
                attempt,
                max_attempts
            );

            match self.attempt(&url, body).await {
                Ok(response) => return Ok(response),
                Err(AttemptFailure::Fatal(err)) => return Err(err),
                Err(AttemptFailure::Transient { cause, retry_after }) => {
                    if attempt < max_attempts {
                        let delay = retry_after
                            .unwrap_or_else(|| self.retry.backoff_with_jitter(attempt - 1));
                        debug!(
                            "Attempt {}/{} to {} failed: {}; retrying in {:?}",
                            attempt,
                            max_attempts,
                            endpoint.path(),
                            cause,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_cause = cause;
                }
            }
        }

        warn!(
            "Giving up on {} after {} attempt(s): {}",
            endpoint.path(),
            max_attempts,
            last_cause
        );
        Err(ApiError::Transport {
            attempts: max_attempts,
            cause: last_cause,
        }
        .into())
    }
}

fn describe_send_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "Request timed out".to_string()
    } else if err.is_connect() {
        format!("Failed to connect to the scanning service: {}", err)
    } else {
        err.to_string()
    }
}

/// Pull a readable message out of an upstream error body.
fn error_message(text: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str().map(str::to_string))
        });

    let message = from_json.unwrap_or_else(|| text.trim().to_string());
    if message.is_empty() {
        return "no response body".to_string();
    }
    match message.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &message[..idx]),
        None => message,
    }
}
