//! Handing a finished bundle to the exchange.
//!
//! Submission is outside the build: a failed submission never invalidates the bundle, and the
//! caller may resubmit it. Sinks report what happened and never retry; retry and backoff
//! policy belong to the caller.

use crate::{EngineError, EngineResult};
use async_trait::async_trait;
use fhir::Bundle;
use serde::Serialize;
use std::time::Duration;

/// The payload posted to the exchange.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub bundle: Bundle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_patient_ref: Option<String>,
}

/// What became of one submission attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SubmissionOutcome {
    /// The exchange answered with a success status.
    Accepted { status: u16, body: String },
    /// The exchange answered with an error status.
    Rejected { status: u16, body: String },
    /// No answer was received (connection refused, timeout, TLS failure, ...).
    Unreachable { message: String },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted { .. })
    }
}

/// Destination for finished bundles.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, submission: &Submission) -> SubmissionOutcome;
}

/// Where and how the HTTP sink posts.
#[derive(Clone, Debug)]
pub struct SubmissionConfig {
    pub endpoint: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl SubmissionConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.trim().is_empty());
        self
    }
}

/// Posts submissions as JSON with an optional bearer token.
#[derive(Clone, Debug)]
pub struct HttpSubmissionSink {
    client: reqwest::Client,
    config: SubmissionConfig,
}

impl HttpSubmissionSink {
    /// Creates a sink for `config`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidConfig`] if the endpoint is not an `http(s)` URL
    /// - [`EngineError::HttpClient`] if the HTTP client cannot be created
    pub fn new(config: SubmissionConfig) -> EngineResult<Self> {
        let endpoint = config.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(EngineError::InvalidConfig(format!(
                "submission endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(EngineError::HttpClient)?;

        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl SubmissionSink for HttpSubmissionSink {
    async fn submit(&self, submission: &Submission) -> SubmissionOutcome {
        let mut request = self.client.post(self.config.endpoint.trim()).json(submission);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(endpoint = %self.config.endpoint, "submission failed: {err}");
                return SubmissionOutcome::Unreachable {
                    message: err.to_string(),
                };
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return SubmissionOutcome::Unreachable {
                    message: format!("failed to read response body: {err}"),
                }
            }
        };

        if status.is_success() {
            tracing::info!(
                status = status.as_u16(),
                bundle = %submission.bundle.id,
                "bundle accepted"
            );
            SubmissionOutcome::Accepted {
                status: status.as_u16(),
                body,
            }
        } else {
            tracing::warn!(
                status = status.as_u16(),
                bundle = %submission.bundle.id,
                "bundle rejected"
            );
            SubmissionOutcome::Rejected {
                status: status.as_u16(),
                body,
            }
        }
    }
}
