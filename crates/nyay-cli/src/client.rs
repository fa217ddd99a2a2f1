//! Typed HTTP client for the NyayNow case API.
//!
//! | Method  | Path                              | Operation          |
//! |---------|-----------------------------------|--------------------|
//! | `GET`   | `/api/cases`                      | [`NyayClient::list_cases`] |
//! | `GET`   | `/api/cases/{id}`                 | [`NyayClient::get_case`] |
//! | `PATCH` | `/api/cases/{id}/stage`           | [`NyayClient::set_stage`] |
//! | `GET`   | `/api/cases/{id}/progress`        | [`NyayClient::progress`] |
//! | `GET`   | `/api/board`                      | [`NyayClient::board`] |
//!
//! Non-2xx responses are decoded from the server's
//! `{"error": {"code", "message"}}` body into [`ClientError::Api`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use nyay_core::{CaseId, UserId};
use nyay_state::{CaseStage, ProgressView, StageProgress, StageTransitionRecord, TimelineEntry};

/// Error code the server uses for a version-token mismatch.
pub const STALE_VERSION: &str = "STALE_VERSION";

/// Errors from case API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure: connect, timeout, TLS.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The server answered with a non-2xx status.
    #[error("{code} ({status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    /// The response body did not match the expected shape.
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The server URL could not be parsed or joined.
    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The token cannot be sent as a header value.
    #[error("token contains characters not allowed in an HTTP header")]
    InvalidToken,
}

impl ClientError {
    /// Whether the server rejected the request because the case moved on.
    pub fn is_stale_version(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == STALE_VERSION)
    }
}

/// Connection settings.
#[derive(Clone)]
pub struct ClientConfig {
    pub server: Url,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server", &self.server.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// -- Wire types ---------------------------------------------------------------

/// A case as returned by the API.
///
/// Fields the CLI does not display are not modeled, and unknown fields are
/// ignored so that the server can grow without breaking older clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub posted_by: String,
    #[serde(default)]
    pub accepted_by: Option<String>,
    #[serde(default)]
    pub lawyer_id: Option<UserId>,
    #[serde(default)]
    pub stage: CaseStage,
    pub version: u64,
    #[serde(default)]
    pub stage_history: Vec<StageTransitionRecord>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    pub posted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a stage write.
#[derive(Debug, Clone, Deserialize)]
pub struct StageMove {
    pub case: Case,
    pub changed: bool,
}

/// Classified progress strip for one case.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressReport {
    pub case_id: CaseId,
    pub version: u64,
    pub progress: StageProgress,
}

/// One Kanban column.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardColumn {
    pub stage: CaseStage,
    pub count: usize,
    #[serde(default)]
    pub cases: Vec<Case>,
}

/// The Kanban board.
#[derive(Debug, Clone, Deserialize)]
pub struct Board {
    pub columns: Vec<BoardColumn>,
    pub active_count: usize,
    pub total: usize,
}

/// Filters for [`NyayClient::list_cases`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaseFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<CaseStage>,
}

#[derive(Serialize)]
struct SetStageBody {
    stage: CaseStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_version: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Deserialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

// -- Client -------------------------------------------------------------------

/// Client for the case API.
#[derive(Debug, Clone)]
pub struct NyayClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NyayClient {
    /// Build a client. The token, when present, is sent as a Bearer header
    /// on every request.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::InvalidToken)?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        let mut base_url = config.server;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// Calls `GET /api/cases`.
    pub async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Case>, ClientError> {
        let endpoint = "GET /api/cases";
        let request = self.http.get(self.url("api/cases")?).query(filter);
        self.send(endpoint, request).await
    }

    /// Calls `GET /api/cases/{id}`.
    pub async fn get_case(&self, id: CaseId) -> Result<Case, ClientError> {
        let endpoint = format!("GET /api/cases/{id}");
        let request = self.http.get(self.url(&format!("api/cases/{id}"))?);
        self.send(&endpoint, request).await
    }

    /// Calls `PATCH /api/cases/{id}/stage`.
    pub async fn set_stage(
        &self,
        id: CaseId,
        stage: CaseStage,
        expected_version: Option<u64>,
    ) -> Result<StageMove, ClientError> {
        let endpoint = format!("PATCH /api/cases/{id}/stage");
        let request = self
            .http
            .patch(self.url(&format!("api/cases/{id}/stage"))?)
            .json(&SetStageBody {
                stage,
                expected_version,
            });
        self.send(&endpoint, request).await
    }

    /// Calls `GET /api/cases/{id}/progress?view=`.
    pub async fn progress(
        &self,
        id: CaseId,
        view: ProgressView,
    ) -> Result<ProgressReport, ClientError> {
        let endpoint = format!("GET /api/cases/{id}/progress");
        let request = self
            .http
            .get(self.url(&format!("api/cases/{id}/progress"))?)
            .query(&[("view", view.as_str())]);
        self.send(&endpoint, request).await
    }

    /// Calls `GET /api/board`.
    pub async fn board(&self, lawyer_id: Option<UserId>) -> Result<Board, ClientError> {
        let endpoint = "GET /api/board";
        let mut request = self.http.get(self.url("api/board")?);
        if let Some(id) = lawyer_id {
            request = request.query(&[("lawyer_id", id.to_string())]);
        }
        self.send(endpoint, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        tracing::debug!(endpoint, "sending request");
        let resp = request.send().await.map_err(|e| ClientError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        resp.json().await.map_err(|e| ClientError::Decode {
            endpoint: endpoint.into(),
            source: e,
        })
    }
}

/// Decode an error body, falling back to the raw text.
fn api_error(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ClientError::Api {
            status,
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => ClientError::Api {
            status,
            code: "HTTP_ERROR".to_string(),
            message: if body.trim().is_empty() {
                format!("server returned status {status}")
            } else {
                body.trim().to_string()
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_is_decoded() {
        let err = api_error(
            409,
            r#"{"error":{"code":"STALE_VERSION","message":"stale version: expected 1, case is at version 2"}}"#,
        );
        assert!(err.is_stale_version());
        match err {
            ClientError::Api { status, code, .. } => {
                assert_eq!(status, 409);
                assert_eq!(code, "STALE_VERSION");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plain_text_error_falls_back() {
        let err = api_error(502, "bad gateway");
        assert!(!err.is_stale_version());
        assert_eq!(err.to_string(), "HTTP_ERROR (502): bad gateway");
    }

    #[test]
    fn conflict_is_not_stale() {
        let err = api_error(409, r#"{"error":{"code":"CONFLICT","message":"skips stages"}}"#);
        assert!(!err.is_stale_version());
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let client = NyayClient::new(ClientConfig {
            server: "http://example.test/nyay".parse().unwrap(),
            token: None,
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(
            client.url("api/cases").unwrap().as_str(),
            "http://example.test/nyay/api/cases"
        );
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let result = NyayClient::new(ClientConfig {
            server: "http://example.test".parse().unwrap(),
            token: Some("abc\ndef".into()),
            timeout_secs: 5,
        });
        assert!(matches!(result, Err(ClientError::InvalidToken)));
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = ClientConfig {
            server: "http://example.test".parse().unwrap(),
            token: Some("lawyer:u:secret".into()),
            timeout_secs: 5,
        };
        assert!(!format!("{config:?}").contains("secret"));
    }
}
