//! HTTP client shared by every platform publisher
//!
//! One [`ApiClient`] is built per process. It carries a fixed overall timeout
//! and the identifying user agent; callers attach the platform's auth header
//! per request. Nothing is retried: a timeout, a connection failure or a
//! non-2xx status becomes a [`PublishError`] straight away.

use crate::core::error::PublishError;
use crate::core::types::Platform;
use reqwest::header::{HeaderName, HeaderValue, InvalidHeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// User-Agent header value, `<vendor>/<product>/<version>`
pub const USER_AGENT: &str = concat!("modpub/mod-publisher/", env!("CARGO_PKG_VERSION"));

/// Overall timeout applied to every call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Which half of the workflow a call belongs to; decides the error variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    FetchVersions,
    Upload,
}

impl CallKind {
    fn error(
        self,
        platform: Platform,
        status: Option<u16>,
        message: String,
        body: Option<String>,
    ) -> PublishError {
        match self {
            CallKind::FetchVersions => PublishError::FetchVersions {
                platform,
                status,
                message,
                body,
            },
            CallKind::Upload => PublishError::Upload {
                platform,
                status,
                message,
                body,
            },
        }
    }
}

/// Platform authentication header carrying the trimmed token
#[derive(Clone)]
pub struct AuthHeader {
    name: HeaderName,
    value: HeaderValue,
}

impl AuthHeader {
    pub fn new(name: &'static str, token: &SecretString) -> Result<Self, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(token.expose_secret().trim())?;
        value.set_sensitive(true);

        Ok(Self {
            name: HeaderName::from_static(name),
            value,
        })
    }

    pub fn name(&self) -> &HeaderName {
        &self.name
    }
}

// Never print the token value.
impl std::fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeader")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Thin wrapper around `reqwest::Client`; clones share one connection pool
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new() -> Result<Self, PublishError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(PublishError::ClientInit)?;

        Ok(Self { client })
    }

    /// GET `url` and decode the JSON body as `T`
    ///
    /// Transport faults and non-2xx statuses become
    /// [`PublishError::FetchVersions`]; a body that is not a valid `T` becomes
    /// [`PublishError::Deserialize`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        platform: Platform,
        url: &str,
        auth: &AuthHeader,
    ) -> Result<T, PublishError> {
        debug!(platform = %platform, url, "fetching");

        let request = self
            .client
            .get(url)
            .header(auth.name.clone(), auth.value.clone());
        let response = Self::send(request, platform, CallKind::FetchVersions).await?;
        let response = Self::check_status(response, platform, CallKind::FetchVersions).await?;

        let bytes = response.bytes().await.map_err(|e| {
            CallKind::FetchVersions.error(platform, None, describe_transport(&e), None)
        })?;

        serde_json::from_slice(&bytes)
            .map_err(|source| PublishError::Deserialize { platform, source })
    }

    /// POST a multipart form to `url`
    ///
    /// Success is decided by the status code alone. The body of a successful
    /// response is returned when it is not blank and is otherwise unparsed.
    pub async fn post_multipart(
        &self,
        platform: Platform,
        url: &str,
        auth: &AuthHeader,
        form: Form,
    ) -> Result<Option<String>, PublishError> {
        debug!(platform = %platform, url, "uploading");

        let request = self
            .client
            .post(url)
            .header(auth.name.clone(), auth.value.clone())
            .multipart(form);
        let response = Self::send(request, platform, CallKind::Upload).await?;
        let response = Self::check_status(response, platform, CallKind::Upload).await?;

        let body = response
            .text()
            .await
            .map_err(|e| CallKind::Upload.error(platform, None, describe_transport(&e), None))?;

        Ok(Some(body).filter(|b| !b.trim().is_empty()))
    }

    async fn send(
        request: reqwest::RequestBuilder,
        platform: Platform,
        kind: CallKind,
    ) -> Result<Response, PublishError> {
        request
            .send()
            .await
            .map_err(|e| kind.error(platform, None, describe_transport(&e), None))
    }

    /// Turns a non-2xx response into an error carrying status, reason and body
    async fn check_status(
        response: Response,
        platform: Platform,
        kind: CallKind,
    ) -> Result<Response, PublishError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await.ok();

        Err(kind.error(platform, Some(status.as_u16()), reason, body))
    }
}

/// Description of a transport fault, naming timeouts explicitly
fn describe_transport(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_format() {
        let parts: Vec<&str> = USER_AGENT.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "modpub");
        assert_eq!(parts[1], "mod-publisher");
        assert_eq!(parts[2], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_auth_header_trims_token() {
        let token = SecretString::new("  secret-token \n".into());
        let header = AuthHeader::new("x-api-token", &token).unwrap();

        assert_eq!(header.name().as_str(), "x-api-token");
        assert_eq!(header.value.as_bytes(), b"secret-token");
        assert!(header.value.is_sensitive());
    }

    #[test]
    fn test_auth_header_rejects_control_characters() {
        let token = SecretString::new("abc\u{7}def".into());
        assert!(AuthHeader::new("authorization", &token).is_err());
    }

    #[test]
    fn test_auth_header_debug_hides_value() {
        let token = SecretString::new("super-secret-value".into());
        let header = AuthHeader::new("authorization", &token).unwrap();

        assert!(!format!("{:?}", header).contains("super-secret-value"));
    }

    #[test]
    fn test_call_kind_selects_error_variant() {
        let fetch = CallKind::FetchVersions.error(Platform::Modrinth, Some(502), String::new(), None);
        assert_eq!(fetch.code(), "FETCH_VERSIONS_FAILED");

        let upload = CallKind::Upload.error(Platform::Modrinth, None, "boom".into(), None);
        assert_eq!(upload.code(), "UPLOAD_FAILED");
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_fetch_failure() {
        let client = ApiClient::with_timeout(Duration::from_secs(2)).unwrap();
        let auth = AuthHeader::new("authorization", &SecretString::new("t".into())).unwrap();

        // Port 9 on localhost is not expected to accept connections.
        let result: Result<Vec<String>, _> = client
            .get_json(Platform::Modrinth, "http://127.0.0.1:9/v2/tag/game_version", &auth)
            .await;

        match result {
            Err(PublishError::FetchVersions { status, .. }) => assert_eq!(status, None),
            other => panic!("expected fetch failure, got {:?}", other),
        }
    }
}
