//! HTTP client for the training backend.
//!
//! Every endpoint lives under `{base_url}/api`. Connection failures,
//! timeouts and 5xx responses are reported as [`ApiError::Transient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dashboard::{Certificate, Profile, ScoreBreakdown};
use crate::emitter::{ResultSink, ResultSubmission};
use crate::error::ApiError;

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest response body accepted (1 MiB).
pub const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

#[derive(Debug, Serialize)]
struct NewUser<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    session_id: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

/// Client for the backend API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:8000`).
    ///
    /// Redirects are not followed.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotConfigured` for an empty URL and
    /// `ApiError::Transient` if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::NotConfigured);
        }
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL for an API path such as `/users`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    /// Registers a trainee.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network, status or decoding failure.
    pub async fn create_user(&self, name: &str, email: &str) -> Result<Profile, ApiError> {
        let request = self
            .client
            .post(self.endpoint("/users"))
            .json(&NewUser { name, email });
        self.send_json(request).await
    }

    /// Fetches a trainee's profile.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network, status or decoding failure.
    pub async fn load_user_profile(&self, user_id: &str) -> Result<Profile, ApiError> {
        let request = self.client.get(self.endpoint(&format!("/users/{user_id}")));
        self.send_json(request).await
    }

    /// Fetches a trainee's per-category scores.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network, status or decoding failure.
    pub async fn load_vulnerability_score(
        &self,
        user_id: &str,
    ) -> Result<ScoreBreakdown, ApiError> {
        let request = self
            .client
            .get(self.endpoint(&format!("/vulnerability-score/{user_id}")));
        self.send_json(request).await
    }

    /// Fetches the trainee's certificate, or `None` if none was issued yet.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network, status or decoding failure.
    pub async fn load_certificate(&self, user_id: &str) -> Result<Option<Certificate>, ApiError> {
        let request = self
            .client
            .get(self.endpoint(&format!("/certificate/{user_id}")));
        self.send_json(request).await
    }

    /// Issues the trainee's certificate. The backend returns the existing
    /// one when it was already issued and answers 400 while simulations
    /// remain.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network, status or decoding failure.
    pub async fn issue_certificate(&self, user_id: &str) -> Result<Certificate, ApiError> {
        let request = self
            .client
            .post(self.endpoint(&format!("/certificate/{user_id}")));
        self.send_json(request).await
    }

    /// Downloads the trainee's PDF report.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network or status failure.
    pub async fn download_report(&self, user_id: &str) -> Result<Vec<u8>, ApiError> {
        let request = self.client.get(self.endpoint(&format!("/report/{user_id}")));
        self.send(request).await
    }

    /// Forwards a question to the assistant and returns its answer.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network, status or decoding failure.
    pub async fn chat(&self, session_id: &str, message: &str) -> Result<String, ApiError> {
        let request = self
            .client
            .post(self.endpoint("/chat"))
            .json(&ChatRequest {
                session_id,
                message,
            });
        let reply: ChatResponse = self.send_json(request).await?;
        Ok(reply.response)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ApiError::Transient("request timed out".to_owned()))?
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "backend responded");
        if status.is_server_error() {
            return Err(ApiError::Transient(format!("server error {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status.as_u16()));
        }

        let bytes = tokio::time::timeout(self.timeout, response.bytes())
            .await
            .map_err(|_| ApiError::Transient("response timed out".to_owned()))?
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        if bytes.len() > MAX_RESPONSE_SIZE {
            return Err(ApiError::InvalidResponse(format!(
                "response body exceeds {MAX_RESPONSE_SIZE} byte limit"
            )));
        }
        Ok(bytes.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let bytes = self.send(request).await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ResultSink for ApiClient {
    async fn submit_result(&self, submission: &ResultSubmission) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.endpoint("/simulations"))
            .json(submission);
        self.send(request).await.map(|_| ())
    }
}
