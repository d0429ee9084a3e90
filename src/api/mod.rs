//! HTTP transport to the portal gateway.
//!
//! `ApiClient` is the single place requests are built: it resolves paths
//! against the configured base URL, injects the session's bearer token,
//! tags mutating calls with an idempotency key and maps every failure to
//! a `PortalError`. Patient-side responses come wrapped in
//! `{success, message, data}`; doctor-side responses are raw DTOs.

pub mod endpoints;

use std::sync::Arc;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::models::ApiEnvelope;
use crate::session::SessionContext;

/// Header carrying a per-call UUID on mutating requests.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Authenticated HTTP client for the portal microservices.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: Arc<SessionContext>,
    idempotency_keys: bool,
}

impl ApiClient {
    /// Build a client from `config`, sharing `session` for bearer injection.
    ///
    /// Only the connect phase is bounded unless `request_timeout` is set.
    pub fn new(config: &PortalConfig, session: Arc<SessionContext>) -> Result<Self, PortalError> {
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| PortalError::Config(format!("HTTP client: {e}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| PortalError::Config(format!("base URL {base_url}: {e}")))?;

        Ok(Self {
            base_url,
            http,
            session,
            idempotency_keys: config.idempotency_keys,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Resolve `path` plus percent-encoded `segments` against the base URL.
    pub fn url(&self, path: &str, segments: &[&str]) -> Result<Url, PortalError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| PortalError::Config(format!("URL for {path}: {e}")))?;
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| PortalError::Config(format!("{} cannot be a base URL", self.base_url)))?
                .pop_if_empty()
                .extend(segments);
        }
        Ok(url)
    }

    // ── Raw DTO calls (doctor side) ─────────────────────────

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, PortalError> {
        let body = self.send::<()>(Method::GET, url, None, true).await?;
        decode(&body)
    }

    /// GET a DTO the server may not have. An empty or `null` body is `None`.
    pub async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, PortalError> {
        let body = self.send::<()>(Method::GET, url, None, true).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        decode(&body)
    }

    pub async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, PortalError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.send(Method::POST, url, Some(body), true).await?;
        decode(&text)
    }

    /// POST without a bearer token (login).
    pub async fn post_anonymous<B, T>(&self, url: Url, body: &B) -> Result<T, PortalError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.send(Method::POST, url, Some(body), false).await?;
        decode(&text)
    }

    /// POST whose response body is not needed. Returns the raw body text.
    pub async fn post_text<B>(&self, url: Url, body: &B) -> Result<String, PortalError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, url, Some(body), true).await
    }

    // ── Enveloped calls (patient side) ──────────────────────

    /// GET and unwrap `{success, message, data}`. `data: null` yields `None`.
    pub async fn get_enveloped<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, PortalError> {
        let body = self.send::<()>(Method::GET, url, None, true).await?;
        unwrap_envelope(&body)
    }

    pub async fn post_enveloped<B, T>(&self, url: Url, body: &B) -> Result<Option<T>, PortalError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.send(Method::POST, url, Some(body), true).await?;
        unwrap_envelope(&text)
    }

    // ── Internal ────────────────────────────────────────────

    async fn send<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        authenticated: bool,
    ) -> Result<String, PortalError>
    where
        B: Serialize + ?Sized,
    {
        let path = url.path().to_string();
        let mut request = self.http.request(method.clone(), url);

        if authenticated {
            match self.session.bearer() {
                Some(bearer) => request = request.header(reqwest::header::AUTHORIZATION, bearer),
                None => tracing::warn!(%method, %path, "No auth token for request"),
            }
        }

        if method != Method::GET && self.idempotency_keys {
            request = request.header(IDEMPOTENCY_HEADER, uuid::Uuid::new_v4().to_string());
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            let err = if e.is_connect() {
                PortalError::Network(format!("cannot reach {}", self.base_url))
            } else if e.is_timeout() {
                PortalError::Network("request timed out".into())
            } else {
                PortalError::from(e)
            };
            tracing::error!(%method, %path, error = %err, "Request failed");
            err
        })?;

        let status = response.status();
        let text = response.text().await.map_err(PortalError::from)?;

        if !status.is_success() {
            let err = PortalError::from_response(status.as_u16(), &text);
            tracing::error!(%method, %path, status = status.as_u16(), error = %err, "Request rejected");
            return Err(err);
        }

        tracing::debug!(%method, %path, status = status.as_u16(), "Request succeeded");
        Ok(text)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, PortalError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, "Response parsing failed");
        PortalError::Decode(e.to_string())
    })
}

fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> Result<Option<T>, PortalError> {
    let envelope: ApiEnvelope<T> = decode(body)?;
    if !envelope.success {
        tracing::error!(message = %envelope.message, "Server envelope reported failure");
        return Err(PortalError::Envelope(envelope.message));
    }
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, UserProfile};
    use crate::test_support::MockBackend;
    use axum::http::StatusCode;
    use serde_json::json;

    fn client_for(base: &str, session: Option<Session>) -> ApiClient {
        let ctx = match session {
            Some(s) => SessionContext::with_session(s),
            None => SessionContext::new(),
        };
        ApiClient::new(&PortalConfig::new(base), Arc::new(ctx)).unwrap()
    }

    #[test]
    fn url_encodes_segments() {
        let client = client_for("http://localhost:8080/", None);
        let url = client.url("/user-service/api/v1/appointments", &["a b/c", "cancel"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/user-service/api/v1/appointments/a%20b%2Fc/cancel"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = ApiClient::new(&PortalConfig::new("not a url"), Arc::new(SessionContext::new()))
            .err()
            .unwrap();
        assert!(matches!(err, PortalError::Config(_)));
    }

    #[tokio::test]
    async fn injects_bearer_and_idempotency_key() {
        let backend = MockBackend::start().await;
        backend.respond("POST", "/echo", StatusCode::OK, json!({"ok": true}));
        let client = client_for(
            &backend.base_url(),
            Some(Session::new("tok-1", UserProfile::default())),
        );

        let url = client.url("/echo", &[]).unwrap();
        let _: serde_json::Value = client.post_json(url, &json!({"a": 1})).await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].header("authorization").as_deref(), Some("Bearer tok-1"));
        let key = calls[0].header("idempotency-key").expect("idempotency key");
        assert!(uuid::Uuid::parse_str(&key).is_ok());
        assert_eq!(calls[0].body, json!({"a": 1}));
    }

    #[tokio::test]
    async fn get_has_no_idempotency_key_and_no_bearer_without_session() {
        let backend = MockBackend::start().await;
        backend.respond("GET", "/list", StatusCode::OK, json!([]));
        let client = client_for(&backend.base_url(), None);

        let url = client.url("/list", &[]).unwrap();
        let items: Vec<serde_json::Value> = client.get_json(url).await.unwrap();
        assert!(items.is_empty());

        let calls = backend.calls();
        assert_eq!(calls[0].header("authorization"), None);
        assert_eq!(calls[0].header("idempotency-key"), None);
    }

    #[tokio::test]
    async fn optional_get_treats_empty_and_null_as_absent() {
        let backend = MockBackend::start().await;
        backend.respond_text("GET", "/empty", StatusCode::OK, "");
        backend.respond("GET", "/null", StatusCode::OK, serde_json::Value::Null);
        backend.respond("GET", "/some", StatusCode::OK, json!({"id": "p1"}));
        let client = client_for(&backend.base_url(), None);

        let empty: Option<serde_json::Value> = client.get_optional(client.url("/empty", &[]).unwrap()).await.unwrap();
        assert!(empty.is_none());
        let null: Option<serde_json::Value> = client.get_optional(client.url("/null", &[]).unwrap()).await.unwrap();
        assert!(null.is_none());
        let some: Option<serde_json::Value> = client.get_optional(client.url("/some", &[]).unwrap()).await.unwrap();
        assert_eq!(some, Some(json!({"id": "p1"})));
    }

    #[tokio::test]
    async fn maps_error_status_and_server_message() {
        let backend = MockBackend::start().await;
        backend.respond(
            "POST",
            "/fail",
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"message": "Créneau indisponible"}),
        );
        let client = client_for(&backend.base_url(), None);

        let url = client.url("/fail", &[]).unwrap();
        let err = client.post_text(url, &json!({})).await.unwrap_err();
        assert!(matches!(err, PortalError::Validation { status: 422, .. }));
        assert_eq!(err.user_message(), "Créneau indisponible");
    }

    #[tokio::test]
    async fn unwraps_envelope_and_reports_failure() {
        let backend = MockBackend::start().await;
        backend.respond("GET", "/ok", StatusCode::OK, json!({"success": true, "message": "", "data": [1, 2]}));
        backend.respond("GET", "/ko", StatusCode::OK, json!({"success": false, "message": "Docteur inactif", "data": null}));
        let client = client_for(&backend.base_url(), None);

        let data: Option<Vec<u32>> = client.get_enveloped(client.url("/ok", &[]).unwrap()).await.unwrap();
        assert_eq!(data, Some(vec![1, 2]));

        let err = client
            .get_enveloped::<Vec<u32>>(client.url("/ko", &[]).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Docteur inactif");
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = client_for(&format!("http://127.0.0.1:{port}"), None);
        let err = client
            .get_json::<serde_json::Value>(client.url("/x", &[]).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Network(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn undecodable_body_is_decode_error() {
        let backend = MockBackend::start().await;
        backend.respond_text("GET", "/html", StatusCode::OK, "<html>oops</html>");
        let client = client_for(&backend.base_url(), None);
        let err = client
            .get_json::<serde_json::Value>(client.url("/html", &[]).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Decode(_)));
    }
}
