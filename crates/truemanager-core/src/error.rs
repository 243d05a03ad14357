// ── Core error types ──
//
// User-facing errors from truemanager-core. Consumers see categories
// (auth failed, not found, connection failed) rather than raw transport
// errors. The `From<truemanager_api::Error>` impl does the translation.

use thiserror::Error;

use truemanager_api::HttpNotOk;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not connected to the server")]
    Disconnected,

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// HTTP timeout reported by the transport, which does not carry the limit.
    #[error("Request timed out")]
    RequestTimedOut,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status, for REST failures.
        status: Option<u16>,
        /// Middleware error name (`EINVAL`, `ENOENT`, ...), for DDP failures.
        errname: Option<String>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<truemanager_api::Error> for CoreError {
    fn from(err: truemanager_api::Error) -> Self {
        use truemanager_api::Error as ApiError;

        match err {
            ApiError::Http(HttpNotOk::ClientUnauthorized { description, .. }) => {
                CoreError::AuthenticationFailed {
                    message: description,
                }
            }
            ApiError::Http(ref http) if http.code() == 404 => CoreError::NotFound {
                resource: http.description().to_owned(),
            },
            ApiError::Http(http) => CoreError::Api {
                message: http
                    .body()
                    .map_or_else(|| http.description().to_owned(), |body| {
                        format!("{}: {body}", http.description())
                    }),
                status: Some(http.code()),
                errname: None,
            },
            ApiError::UnexpectedStatus { status } => CoreError::Api {
                message: format!("unexpected HTTP status {status}"),
                status: Some(status),
                errname: None,
            },
            ApiError::Transport(ref e) if e.is_timeout() => CoreError::RequestTimedOut,
            ApiError::Transport(e) => CoreError::ConnectionFailed {
                url: e.url().map(ToString::to_string).unwrap_or_default(),
                reason: e.to_string(),
            },
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::UnsupportedScheme(scheme) => CoreError::Config {
                message: format!("Unsupported URL scheme '{scheme}' (expected http or https)"),
            },
            ApiError::NotConfigured => CoreError::Config {
                message: "no server address configured".into(),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            ApiError::Serialization(e) => CoreError::Internal(format!("Serialization error: {e}")),
            ApiError::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            ApiError::Handshake { reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("DDP handshake failed: {reason}"),
            },
            ApiError::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            ApiError::Disconnected => CoreError::Disconnected,
            ApiError::Rpc {
                code: _,
                errname,
                reason,
            } => {
                if errname.as_deref() == Some("ENOENT") {
                    CoreError::NotFound { resource: reason }
                } else {
                    CoreError::Api {
                        message: reason,
                        status: None,
                        errname,
                    }
                }
            }
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn unauthorized_maps_to_auth_failed() {
        let err: CoreError = truemanager_api::Error::from(HttpNotOk::unauthorized("GET x returned 401", None)).into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[test]
    fn not_found_and_server_errors() {
        let not_found = HttpNotOk::client_request(404, "GET pool/id/9 returned 404", None).unwrap();
        let err: CoreError = truemanager_api::Error::from(not_found).into();
        assert!(matches!(err, CoreError::NotFound { .. }));

        let server = HttpNotOk::server_response(500, "boom", Some("trace".into())).unwrap();
        let err: CoreError = truemanager_api::Error::from(server).into();
        assert!(
            matches!(err, CoreError::Api { status: Some(500), ref message, .. } if message == "boom: trace")
        );
    }

    #[test]
    fn rpc_enoent_is_not_found() {
        let err: CoreError = truemanager_api::Error::Rpc {
            code: Some(2),
            errname: Some("ENOENT".into()),
            reason: "pool 9 does not exist".into(),
        }
        .into();
        assert!(matches!(err, CoreError::NotFound { ref resource } if resource.contains("pool 9")));
    }

    #[test]
    fn disconnected_passes_through() {
        let err: CoreError = truemanager_api::Error::Disconnected.into();
        assert!(matches!(err, CoreError::Disconnected));
    }
}
