use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

use crate::catalog::AnalyzeResponse;
use crate::chatbot::ChatReply;
use crate::config::Config;
use crate::film::Film;
use crate::server::{FilmResponse, PopularResponse, SearchResponse};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);
const ANALYZE_TIMEOUT: Duration = Duration::from_secs(10);
const GENERIC_ERROR: &str = "Terjadi kesalahan saat memproses permintaan Anda";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Connected,
    Failed,
}

/// Linear retry for preference submissions: `max_retries` extra attempts,
/// `delay` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Silakan masukkan preferensi film Anda")]
    EmptyInput,
    #[error("Masukkan kata kunci pencarian")]
    EmptyQuery,
    #[error("Tidak ada data yang diterima dari server")]
    EmptyResponse,
    #[error("server responded with {status}")]
    Server {
        status: StatusCode,
        message: Option<String>,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Text to show the user: the server's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Server {
                message: Some(message),
                ..
            } => message.clone(),
            ClientError::Server { message: None, .. } => GENERIC_ERROR.to_string(),
            other => {
                let text = other.to_string();
                if text.is_empty() {
                    GENERIC_ERROR.to_string()
                } else {
                    text
                }
            }
        }
    }
}

/// HTTP client for the filmfinder API with a health check that swaps to a
/// fallback base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    primary: String,
    fallback: Option<String>,
    active: String,
    status: ConnectionStatus,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(api_url: impl Into<String>, fallback: Option<String>) -> Self {
        let primary = api_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            active: primary.clone(),
            primary,
            fallback: fallback.map(|url| url.trim_end_matches('/').to_string()),
            status: ConnectionStatus::Idle,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_url.clone(), config.fallback_api_url.clone())
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn active_url(&self) -> &str {
        &self.active
    }

    pub fn primary_url(&self) -> &str {
        &self.primary
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Pings `/health`. On failure the client switches to the fallback URL
    /// for all later requests.
    pub async fn check_connection(&mut self) -> ConnectionStatus {
        self.status = ConnectionStatus::Connecting;

        let healthy = match self.endpoint(&["health"]) {
            Ok(url) => match self.http.get(url).timeout(HEALTH_TIMEOUT).send().await {
                Ok(response) if response.status() == StatusCode::OK => true,
                Ok(response) => {
                    tracing::warn!(url = %self.active, status = %response.status(), "health check failed");
                    false
                }
                Err(err) => {
                    tracing::warn!(url = %self.active, error = %err, "health check failed");
                    false
                }
            },
            Err(err) => {
                tracing::warn!(url = %self.active, error = %err, "health check failed");
                false
            }
        };

        if healthy {
            self.status = ConnectionStatus::Connected;
            return self.status;
        }

        self.status = ConnectionStatus::Failed;
        if let Some(fallback) = &self.fallback
            && *fallback != self.active
        {
            tracing::info!(fallback = %fallback, "switching to fallback API");
            self.active = fallback.clone();
        }
        self.status
    }

    /// Sends a free-text preference to `/analyze`, retrying on any failure.
    pub async fn submit(&self, text: &str) -> Result<AnalyzeResponse, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyInput);
        }

        let mut attempt = 0;
        loop {
            match self.analyze_once(text).await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        error = %err,
                        "analyze request failed, retrying"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn search(&self, query: &str) -> Result<SearchResponse, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::EmptyQuery);
        }
        let response = self
            .http
            .get(self.endpoint(&["search"])?)
            .query(&[("q", query)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Server {
                status: response.status(),
                message: Some("Gagal mencari film".to_string()),
            });
        }
        read_json(response).await
    }

    pub async fn popular(&self, limit: usize) -> Result<PopularResponse, ClientError> {
        let response = self
            .http
            .get(self.endpoint(&["popular"])?)
            .query(&[("limit", limit)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Server {
                status: response.status(),
                message: Some("Gagal mengambil film populer".to_string()),
            });
        }
        read_json(response).await
    }

    pub async fn chat(&self, message: &str) -> Result<ChatReply, ClientError> {
        let response = self
            .http
            .post(self.endpoint(&["chat"])?)
            .json(&json!({ "message": message }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        read_json(response).await
    }

    pub async fn film(&self, id: &str) -> Result<Film, ClientError> {
        let response = self
            .http
            .get(self.endpoint(&["film", id])?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        let body: FilmResponse = read_json(response).await?;
        Ok(body.film)
    }

    async fn analyze_once(&self, text: &str) -> Result<AnalyzeResponse, ClientError> {
        let response = self
            .http
            .post(self.endpoint(&["analyze"])?)
            .json(&json!({ "text": text }))
            .timeout(ANALYZE_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        let body: Option<AnalyzeResponse> = read_json(response).await?;
        body.ok_or(ClientError::EmptyResponse)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.active)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ClientError::EmptyResponse);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Builds a `Server` error, picking up a `message` or `error` field from the body.
async fn server_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| {
            ["message", "error"]
                .into_iter()
                .find_map(|field| body.get(field).and_then(Value::as_str).map(str::to_string))
        });
    ClientError::Server { status, message }
}
