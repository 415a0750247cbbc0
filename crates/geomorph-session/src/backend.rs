//! Evaluator client.
//!
//! [`TutorBackend`] is the seam between the session runtime and the remote
//! evaluator: one method per endpoint. [`HttpBackend`] is the production
//! implementation over `reqwest`; tests substitute scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{GeomorphError, Result};
use crate::model::{
    CompletionAck, EmotionPrediction, EmotionRequest, InterventionDirective, MonitorRequest,
    MonitorResponse, Question, QuestionRequest, SessionInfo, SubmissionRequest,
    SubmissionResponse,
};

/// The remote evaluator, one method per endpoint.
#[async_trait]
pub trait TutorBackend: Send + Sync + 'static {
    /// `GET session/current`.
    async fn current_session(&self) -> Result<SessionInfo>;

    /// `POST content/next`.
    async fn next_question(&self, request: &QuestionRequest) -> Result<Question>;

    /// `POST learning/monitor`.
    async fn monitor(&self, request: &MonitorRequest) -> Result<InterventionDirective>;

    /// `POST learning/submit-answer`.
    async fn submit_answer(&self, request: &SubmissionRequest) -> Result<SubmissionResponse>;

    /// `POST learning/predict-emotion`.
    async fn predict_emotion(&self, request: &EmotionRequest) -> Result<EmotionPrediction>;

    /// `POST session/{id}/complete`.
    async fn complete_session(&self, session_id: &str) -> Result<CompletionAck>;
}

/// [`TutorBackend`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpBackend {
    /// Creates a client for the evaluator described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `GeomorphError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_timeout(
            config.base_url(),
            config.auth_token.clone(),
            config.request_timeout(),
        )
    }

    /// Creates a client for an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns `GeomorphError::Transport` if the HTTP client cannot be built.
    pub fn with_timeout(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeomorphError::transport("<client>", e))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    /// The API root requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!(endpoint, "POST");
        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| GeomorphError::transport(endpoint, e))?;
        read_json(endpoint, response).await
    }
}

/// Turns a response into `T`, mapping non-success statuses to
/// `GeomorphError::HttpStatus` with the raw body.
async fn read_json<T: DeserializeOwned>(endpoint: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(GeomorphError::http_status(endpoint, status.as_u16(), body));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| GeomorphError::transport(endpoint, e))?;
    serde_json::from_slice(&bytes).map_err(|e| GeomorphError::decode(endpoint, e))
}

#[async_trait]
impl TutorBackend for HttpBackend {
    async fn current_session(&self) -> Result<SessionInfo> {
        let endpoint = "session/current";
        debug!(endpoint, "GET");
        let mut request = self.client.get(self.url(endpoint));
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| GeomorphError::transport(endpoint, e))?;
        read_json(endpoint, response).await
    }

    async fn next_question(&self, request: &QuestionRequest) -> Result<Question> {
        self.post("content/next", request).await
    }

    async fn monitor(&self, request: &MonitorRequest) -> Result<InterventionDirective> {
        let response: MonitorResponse = self.post("learning/monitor", request).await?;
        Ok(response.into())
    }

    async fn submit_answer(&self, request: &SubmissionRequest) -> Result<SubmissionResponse> {
        self.post("learning/submit-answer", request).await
    }

    async fn predict_emotion(&self, request: &EmotionRequest) -> Result<EmotionPrediction> {
        self.post("learning/predict-emotion", request).await
    }

    async fn complete_session(&self, session_id: &str) -> Result<CompletionAck> {
        let endpoint = format!("session/{session_id}/complete");
        self.post(&endpoint, &serde_json::json!({})).await
    }
}
