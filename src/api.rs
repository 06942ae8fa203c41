//! Stores backend API client.
//!
//! Authenticated HTTP against the dashboard backend: snapshot fetches for the
//! summary screens and collection-record submissions for the settlement
//! workflow. Authentication and store scoping travel in an explicit
//! [`RequestContext`] passed to every call rather than ambient state.

use reqwest::{Client, Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::settlement::{CollectionTarget, FailureReport, SettlementBackend};
use crate::snapshot::RawStoreSnapshot;

/// Default timeout for backend requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Auth token and selected store for one backend call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub token: String,
    pub store_id: i64,
}

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the backend base URL:
/// - strip trailing slashes
/// - strip a trailing `/api` segment
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_backend_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    // Strip trailing /api
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Backend call failure. Recoverable at the workflow level: the settlement
/// machine returns to `Loaded` and the user retries manually.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Transport-level failure: connection refused, timeout, DNS.
    #[error("{0}")]
    Network(String),
    /// Non-2xx response. `detail` carries the backend's structured message
    /// when present, or a status-derived fallback.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },
    /// 2xx response whose body could not be interpreted.
    #[error("invalid response from backend: {0}")]
    InvalidResponse(String),
}

/// The snapshot fetch failed; the aggregator must never run on this response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("store snapshot unavailable: {source}")]
pub struct SnapshotUnavailable {
    #[source]
    pub source: BackendError,
}

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach the stores backend at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid backend URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly fallback message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Session expired or token invalid".to_string(),
        403 => "Store not accessible with this account".to_string(),
        404 => "Backend endpoint not found".to_string(),
        s if s >= 500 => format!("Stores backend server error (HTTP {s})"),
        s => format!("Unexpected response from the stores backend (HTTP {s})"),
    }
}

/// Build a [`BackendError::Rejected`] from a non-2xx response body.
///
/// The backend's structured `detail` (or `message`) passes through verbatim;
/// the status-derived message is only a fallback when neither is present.
fn rejection(status: StatusCode, body_text: &str) -> BackendError {
    let detail = serde_json::from_str::<Value>(body_text)
        .ok()
        .and_then(|json| {
            json.get("detail")
                .or_else(|| json.get("message"))
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| status_error(status));
    BackendError::Rejected {
        status: status.as_u16(),
        detail,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the stores backend, shared across screens.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: normalize_backend_url(base_url),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform an authenticated request. `path` includes the leading slash.
    async fn request(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BackendError> {
        let url = format!("{}{}", self.base_url, path);

        let mut req = self
            .http
            .request(method, &url)
            .header("Authorization", format!("Token {}", ctx.token))
            .header("Content-Type", "application/json");
        if let Some(b) = body {
            req = req.json(&b);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| BackendError::Network(friendly_error(&self.base_url, &e)))?;
        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "backend rejected request");
            return Err(rejection(status, &body_text));
        }

        // Empty 204 bodies come back as null.
        if body_text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text)
            .map_err(|e| BackendError::InvalidResponse(format!("invalid JSON: {e}")))
    }

    /// Fetch the raw financial snapshot for the context's store.
    ///
    /// Callers must gate on success: the aggregator is never handed a
    /// partial or error response.
    pub async fn fetch_store_snapshot(
        &self,
        ctx: &RequestContext,
    ) -> Result<RawStoreSnapshot, SnapshotUnavailable> {
        let path = format!("/api/tiendas/{}/resumen/", ctx.store_id);
        let value = self
            .request(ctx, Method::GET, &path, None)
            .await
            .map_err(|source| SnapshotUnavailable { source })?;
        serde_json::from_value(value).map_err(|e| SnapshotUnavailable {
            source: BackendError::InvalidResponse(format!("invalid snapshot payload: {e}")),
        })
    }
}

impl SettlementBackend for ApiClient {
    /// Create a collection record for a received payment.
    async fn record_payment(
        &self,
        ctx: &RequestContext,
        target: &CollectionTarget,
        amount: Decimal,
    ) -> Result<(), BackendError> {
        let path = format!("/api/tiendas/{}/recaudos/", ctx.store_id);
        let body = serde_json::json!({
            "credito": target.credit_id,
            "valor": amount,
            "fecha_visita": target.visit_date,
            "cliente": {
                "nombres": target.customer.given_names,
                "apellidos": target.customer.surnames,
            },
        });
        self.request(ctx, Method::POST, &path, Some(body)).await?;
        Ok(())
    }

    /// Create a collection record marked as a non-payment visit.
    async fn report_failure(
        &self,
        ctx: &RequestContext,
        target: &CollectionTarget,
        report: &FailureReport,
    ) -> Result<(), BackendError> {
        let path = format!("/api/tiendas/{}/recaudos/", ctx.store_id);
        let body = serde_json::json!({
            "credito": target.credit_id,
            "fecha_visita": target.visit_date,
            "pago_recibido": false,
            "resultado_visita": {
                "motivo": report.reason_code,
                "comentario": report.comment,
            },
        });
        self.request(ctx, Method::POST, &path, Some(body)).await?;
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_backend_url() {
        assert_eq!(
            normalize_backend_url("tiendas.example.com"),
            "https://tiendas.example.com"
        );
        assert_eq!(
            normalize_backend_url("localhost:8000"),
            "http://localhost:8000"
        );
        assert_eq!(
            normalize_backend_url("https://tiendas.example.com/"),
            "https://tiendas.example.com"
        );
        assert_eq!(
            normalize_backend_url("https://tiendas.example.com/api/"),
            "https://tiendas.example.com"
        );
        assert_eq!(
            normalize_backend_url("  https://tiendas.example.com/api  "),
            "https://tiendas.example.com"
        );
    }

    #[test]
    fn client_normalizes_its_base_url() {
        let client = ApiClient::new("tiendas.example.com/api/").expect("client");
        assert_eq!(client.base_url(), "https://tiendas.example.com");
    }

    #[test]
    fn rejection_prefers_structured_detail() {
        let err = rejection(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "El valor excede el saldo del crédito"}"#,
        );
        assert_eq!(
            err,
            BackendError::Rejected {
                status: 400,
                detail: "El valor excede el saldo del crédito".to_string(),
            }
        );
    }

    #[test]
    fn rejection_falls_back_to_message_field() {
        let err = rejection(StatusCode::CONFLICT, r#"{"message": "visita duplicada"}"#);
        assert!(matches!(
            err,
            BackendError::Rejected { status: 409, detail } if detail == "visita duplicada"
        ));
    }

    #[test]
    fn rejection_uses_generic_fallback_when_detail_is_absent() {
        let err = rejection(StatusCode::UNAUTHORIZED, "not json at all");
        assert_eq!(
            err,
            BackendError::Rejected {
                status: 401,
                detail: "Session expired or token invalid".to_string(),
            }
        );

        let err = rejection(StatusCode::BAD_GATEWAY, r#"{"detail": ""}"#);
        assert!(matches!(
            err,
            BackendError::Rejected { status: 502, detail }
                if detail == "Stores backend server error (HTTP 502)"
        ));
    }
}
