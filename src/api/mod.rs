use std::future::Future;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::models::*;

// ─── Error types ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Backend reported failure: {message}")]
    Unsuccessful { message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

// ─── Endpoints ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/api/assignments/week`
    Week,
    /// `/api/assignments`
    All,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Week => "/api/assignments/week",
            Self::All => "/api/assignments",
        }
    }
}

/// Anything that can produce a fresh [`Snapshot`] for an endpoint.
///
/// The returned future is spawned onto the runtime, so it must be `Send` and
/// own everything it needs.
pub trait AssignmentSource: Clone + Send + Sync + 'static {
    fn fetch(
        &self,
        endpoint: Endpoint,
    ) -> impl Future<Output = Result<Snapshot, BackendError>> + Send + 'static;
}

// ─── Client ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid backend URL: {base_url}"))?;

        // No explicit timeout: a hung backend stalls only its own fetch task.
        let client = Client::builder()
            .user_agent(concat!("uni-mirror/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Bad backend path: {path}"))
    }

    async fn check_status(resp: Response) -> Result<Response, BackendError> {
        match resp.status() {
            StatusCode::NOT_FOUND => Err(BackendError::Api {
                status: 404,
                message: format!("{} not found on backend", resp.url().path()),
            }),
            s if s.is_client_error() || s.is_server_error() => {
                let status = s.as_u16();
                let body = resp.text().await.unwrap_or_default();
                // The backend wraps its errors as {"success": false, "error": "..."}.
                let message = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("error")?.as_str().map(str::to_string))
                    .unwrap_or(body);
                Err(BackendError::Api { status, message })
            }
            _ => Ok(resp),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.url(path)?;
        let resp = self.client.get(url).send().await?;
        let resp = Self::check_status(resp).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // ── Assignments ─────────────────────────────────────────────────────

    pub async fn fetch_assignments(&self, endpoint: Endpoint) -> Result<Snapshot, BackendError> {
        let url = self.url(endpoint.path())?;
        let resp = self.client.get(url).send().await?;
        let resp = Self::check_status(resp).await?;
        decode_snapshot(&resp.bytes().await?)
    }

    // ── Health ──────────────────────────────────────────────────────────

    pub async fn health(&self) -> Result<HealthStatus, BackendError> {
        self.get_json("/health").await
    }

    // ── Sync ────────────────────────────────────────────────────────────

    /// Ask the backend to resync from its upstream task source.
    pub async fn trigger_sync(&self) -> Result<SyncSummary, BackendError> {
        let url = self.url("/api/sync")?;
        let resp = self.client.post(url).send().await?;
        let resp = Self::check_status(resp).await?;
        let body: SyncResponse = serde_json::from_slice(&resp.bytes().await?)?;
        if !body.success {
            return Err(BackendError::Unsuccessful {
                message: body.error.unwrap_or_else(|| "sync failed".into()),
            });
        }
        Ok(SyncSummary {
            assignments_count: body.assignments_count.unwrap_or(0),
            modules_count: body.modules_count.unwrap_or(0),
            last_sync: body.last_sync,
        })
    }
}

/// Decode an assignments body, failing on malformed JSON or `success: false`.
pub fn decode_snapshot(body: &[u8]) -> Result<Snapshot, BackendError> {
    let envelope: AssignmentsResponse = serde_json::from_slice(body)?;
    Snapshot::try_from(envelope)
}

impl TryFrom<AssignmentsResponse> for Snapshot {
    type Error = BackendError;

    fn try_from(body: AssignmentsResponse) -> Result<Self, Self::Error> {
        if !body.success {
            return Err(BackendError::Unsuccessful {
                message: body.error.unwrap_or_else(|| "success=false".into()),
            });
        }
        Ok(Snapshot {
            assignments: body.assignments.unwrap_or_default(),
            modules: body.modules.unwrap_or_default(),
            last_sync: body.last_sync,
        })
    }
}

impl AssignmentSource for BackendClient {
    fn fetch(
        &self,
        endpoint: Endpoint,
    ) -> impl Future<Output = Result<Snapshot, BackendError>> + Send + 'static {
        let client = self.clone();
        async move { client.fetch_assignments(endpoint).await }
    }
}
