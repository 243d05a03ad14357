use std::ops::RangeInclusive;

use thiserror::Error;

// ── HTTP status taxonomy ─────────────────────────────────────────────

const REDIRECT_RANGE: RangeInclusive<u16> = 300..=399;
const CLIENT_RANGE: RangeInclusive<u16> = 400..=499;
const SERVER_RANGE: RangeInclusive<u16> = 500..=599;
const UNAUTHORIZED: u16 = 401;

/// A non-2xx HTTP response, classified by status class.
///
/// Every variant carries the numeric status, a human-readable description
/// and the response body (if the server sent one). The checked constructors
/// refuse codes outside the variant's range, so a `ServerResponse` always
/// holds a 5xx code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpNotOk {
    /// 3xx that the HTTP client did not follow.
    #[error("Redirect response (HTTP {code}): {description}")]
    Redirect {
        code: u16,
        description: String,
        body: Option<String>,
    },

    /// 4xx other than 401.
    #[error("Client request error (HTTP {code}): {description}")]
    ClientRequest {
        code: u16,
        description: String,
        body: Option<String>,
    },

    /// 401 -- credentials missing, wrong, or expired.
    #[error("Unauthorized (HTTP {code}): {description}")]
    ClientUnauthorized {
        code: u16,
        description: String,
        body: Option<String>,
    },

    /// 5xx.
    #[error("Server error (HTTP {code}): {description}")]
    ServerResponse {
        code: u16,
        description: String,
        body: Option<String>,
    },
}

/// Returned when a checked [`HttpNotOk`] constructor gets a code from the
/// wrong status class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("HTTP status {code} is outside {expected}")]
pub struct StatusOutOfRange {
    pub code: u16,
    pub expected: &'static str,
}

fn check_range(
    code: u16,
    range: &RangeInclusive<u16>,
    expected: &'static str,
) -> Result<(), StatusOutOfRange> {
    if range.contains(&code) {
        Ok(())
    } else {
        Err(StatusOutOfRange { code, expected })
    }
}

impl HttpNotOk {
    /// Build a [`Redirect`](Self::Redirect). `code` must be in `300..=399`.
    pub fn redirect(
        code: u16,
        description: impl Into<String>,
        body: Option<String>,
    ) -> Result<Self, StatusOutOfRange> {
        check_range(code, &REDIRECT_RANGE, "300..=399")?;
        Ok(Self::Redirect {
            code,
            description: description.into(),
            body,
        })
    }

    /// Build a client error. `code` must be in `400..=499`; 401 yields
    /// [`ClientUnauthorized`](Self::ClientUnauthorized).
    pub fn client_request(
        code: u16,
        description: impl Into<String>,
        body: Option<String>,
    ) -> Result<Self, StatusOutOfRange> {
        check_range(code, &CLIENT_RANGE, "400..=499")?;
        if code == UNAUTHORIZED {
            return Ok(Self::unauthorized(description, body));
        }
        Ok(Self::ClientRequest {
            code,
            description: description.into(),
            body,
        })
    }

    /// Build the 401 case.
    pub fn unauthorized(description: impl Into<String>, body: Option<String>) -> Self {
        Self::ClientUnauthorized {
            code: UNAUTHORIZED,
            description: description.into(),
            body,
        }
    }

    /// Build a [`ServerResponse`](Self::ServerResponse). `code` must be in `500..=599`.
    pub fn server_response(
        code: u16,
        description: impl Into<String>,
        body: Option<String>,
    ) -> Result<Self, StatusOutOfRange> {
        check_range(code, &SERVER_RANGE, "500..=599")?;
        Ok(Self::ServerResponse {
            code,
            description: description.into(),
            body,
        })
    }

    /// Classify an arbitrary status. Returns `None` for anything that is
    /// not a 3xx, 4xx or 5xx.
    pub fn from_status(
        code: u16,
        description: impl Into<String>,
        body: Option<String>,
    ) -> Option<Self> {
        match code {
            300..=399 => Self::redirect(code, description, body).ok(),
            400..=499 => Self::client_request(code, description, body).ok(),
            500..=599 => Self::server_response(code, description, body).ok(),
            _ => None,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Redirect { code, .. }
            | Self::ClientRequest { code, .. }
            | Self::ClientUnauthorized { code, .. }
            | Self::ServerResponse { code, .. } => *code,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Redirect { description, .. }
            | Self::ClientRequest { description, .. }
            | Self::ClientUnauthorized { description, .. }
            | Self::ServerResponse { description, .. } => description,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Redirect { body, .. }
            | Self::ClientRequest { body, .. }
            | Self::ClientUnauthorized { body, .. }
            | Self::ServerResponse { body, .. } => body.as_deref(),
        }
    }

    /// `true` for any 4xx, including 401.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ClientRequest { .. } | Self::ClientUnauthorized { .. }
        )
    }
}

// ── Crate error ──────────────────────────────────────────────────────

/// Top-level error type for the `truemanager-api` crate.
///
/// Covers both API surfaces (REST and WebSocket/DDP). Nothing here is
/// retried; every failure is terminal for the call that produced it.
#[derive(Debug, Error)]
pub enum Error {
    // ── HTTP ────────────────────────────────────────────────────────
    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Http(#[from] HttpNotOk),

    /// A status outside every known class (1xx that leaked through, 6xx, ...).
    #[error("Unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Server address has a scheme other than http/https.
    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    /// No server address in the session.
    #[error("No server address configured")]
    NotConfigured,

    /// TLS configuration error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request parameters could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── WebSocket / DDP ─────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// The DDP handshake was rejected or never completed.
    #[error("DDP handshake failed: {reason}")]
    Handshake { reason: String },

    /// WebSocket closed by the server.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// No live connection, or the connection went away while waiting.
    #[error("Not connected")]
    Disconnected,

    /// The server reported a method-call error.
    #[error("RPC error{}: {reason}", rpc_code_suffix(.code))]
    Rpc {
        code: Option<i64>,
        errname: Option<String>,
        reason: String,
    },

    /// A caller-configured deadline elapsed.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

fn rpc_code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" {c}")).unwrap_or_default()
}

impl Error {
    /// The HTTP status code behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => Some(e.code()),
            Self::UnexpectedStatus { status } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the server rejected our credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http(HttpNotOk::ClientUnauthorized { .. }))
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the failure happened below the HTTP/DDP layer.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            Self::WebSocketConnect(_)
            | Self::WebSocketClosed { .. }
            | Self::Disconnected
            | Self::Handshake { .. } => true,
            _ => false,
        }
    }
}
