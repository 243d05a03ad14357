// REST transport
//
// Wraps `reqwest::Client` with session-aware URL construction, credential
// injection, and status classification. Endpoint groups live in sibling
// modules as inherent methods so this file stays about transport.

use reqwest::{Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Error, HttpNotOk};
use crate::session::{Authorization, Session};
use crate::transport::TransportConfig;

/// Async client for the TrueNAS `/api/v2.0/` REST surface.
///
/// Every request snapshots the [`Session`], so the server address and
/// credentials can change between calls (login, logout, profile switch)
/// without rebuilding the client.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    session: Session,
}

impl RestClient {
    pub fn new(session: Session, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, session })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, session: Session) -> Self {
        Self { http, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn prepare(&self, method: Method, path: &str) -> Result<(RequestBuilder, Url), Error> {
        let state = self.session.snapshot();
        let url = state.resource_url(path)?;
        let mut request = self.http.request(method, url.clone());

        match &state.authorization {
            Some(Authorization::Basic { username, password }) => {
                request = request.basic_auth(username, Some(password.expose_secret()));
            }
            Some(Authorization::ApiKey(secret) | Authorization::Token(secret)) => {
                request = request.bearer_auth(secret.expose_secret());
            }
            None => {}
        }

        Ok((request, url))
    }

    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let (mut request, url) = self.prepare(method.clone(), path)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        debug!("{method} {url}");

        let response = request.send().await?;
        handle_response(&method, &url, response).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    /// POST without a request body.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.send::<T, ()>(Method::POST, path, None).await
    }

    pub(crate) async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.send::<T, ()>(Method::DELETE, path, None).await
    }
}

/// Map the response status onto [`HttpNotOk`], or decode a 2xx body.
async fn handle_response<T: DeserializeOwned>(
    method: &Method,
    url: &Url,
    response: Response,
) -> Result<T, Error> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return decode(&body);
    }

    let description = format!("{method} {url} returned {status}");
    debug!(status = status.as_u16(), "{description}");
    let body = (!body.is_empty()).then_some(body);
    match HttpNotOk::from_status(status.as_u16(), description, body) {
        Some(err) => Err(err.into()),
        None => Err(Error::UnexpectedStatus {
            status: status.as_u16(),
        }),
    }
}

/// Decode a success body. An empty body reads as JSON `null`, which is
/// what unit-returning endpoints need.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn empty_body_decodes_as_unit() {
        decode::<()>("").unwrap();
        decode::<()>("null").unwrap();
        assert_eq!(decode::<Option<u64>>("  ").unwrap(), None);
    }

    #[test]
    fn bad_body_keeps_raw_text() {
        let err = decode::<u64>("<html>oops</html>").unwrap_err();
        assert!(matches!(err, Error::Deserialization { ref body, .. } if body == "<html>oops</html>"));
    }

    #[tokio::test]
    async fn unconfigured_session_fails_before_io() {
        let client = RestClient::with_client(reqwest::Client::new(), Session::new());
        let err = client.get::<serde_json::Value>("system/info").await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured));
    }
}
