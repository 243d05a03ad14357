// Session state: which server we talk to and how we are authorized.
//
// A `Session` is created once by whoever composes the clients and handed to
// each of them. Every outgoing request takes a snapshot, so a concurrent
// login/logout never produces a request with half-updated state.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use secrecy::SecretString;
use url::Url;

use crate::error::Error;

/// Path suffix every REST call is resolved against.
pub const API_BASE_PATH: &str = "api/v2.0/";

/// Path of the DDP endpoint, relative to the server root.
pub const WEBSOCKET_PATH: &str = "websocket";

// ── Authorization ────────────────────────────────────────────────────

/// Credential attached to outgoing requests.
#[derive(Clone)]
pub enum Authorization {
    /// HTTP Basic with username/password.
    Basic {
        username: String,
        password: SecretString,
    },
    /// API key generated under Credentials > API Keys.
    ApiKey(SecretString),
    /// Short-lived session token from `auth/generate_token`.
    Token(SecretString),
}

impl Authorization {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(SecretString::from(key.into()))
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(SecretString::from(token.into()))
    }

    /// Short label for logs. Never includes secret material.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::ApiKey(_) => "api-key",
            Self::Token(_) => "token",
        }
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
            Self::Token(_) => f.write_str("Token([REDACTED])"),
        }
    }
}

// ── ApiState ─────────────────────────────────────────────────────────

/// Immutable snapshot of the session.
#[derive(Debug, Clone, Default)]
pub struct ApiState {
    /// Normalized REST base, always ending in `/api/v2.0/`.
    pub server_address: Option<Url>,
    pub authorization: Option<Authorization>,
}

impl ApiState {
    /// Resolve a resource path (e.g. `"pool/id/1"`) against the REST base.
    pub fn resource_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.server_address.as_ref().ok_or(Error::NotConfigured)?;
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    /// The DDP endpoint for the configured server: `ws(s)://host[/prefix]/websocket`.
    pub fn websocket_url(&self) -> Result<Url, Error> {
        let base = self.server_address.as_ref().ok_or(Error::NotConfigured)?;
        websocket_url_for(base)
    }
}

/// Normalize a user-supplied server address into the REST base URL.
///
/// `http://host`, `http://host/` and `http://host/api/v2.0` all become
/// `http://host/api/v2.0/`. A path prefix (reverse proxy) is preserved:
/// `https://proxy/nas` becomes `https://proxy/nas/api/v2.0/`.
pub fn normalize_server_address(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(Error::UnsupportedScheme(other.to_owned())),
    }

    let path = url.path().trim_end_matches('/').to_owned();
    let suffix = API_BASE_PATH.trim_end_matches('/');
    if path.ends_with(&format!("/{suffix}")) {
        url.set_path(&format!("{path}/"));
    } else {
        url.set_path(&format!("{path}/{API_BASE_PATH}"));
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Derive the websocket endpoint from a normalized REST base.
fn websocket_url_for(base: &Url) -> Result<Url, Error> {
    let mut url = base.clone();
    let scheme = match base.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|()| Error::UnsupportedScheme(base.scheme().to_owned()))?;

    let suffix = API_BASE_PATH.trim_end_matches('/');
    let root = base
        .path()
        .trim_end_matches('/')
        .trim_end_matches(suffix)
        .trim_end_matches('/')
        .to_owned();
    url.set_path(&format!("{root}/{WEBSOCKET_PATH}"));
    Ok(url)
}

// ── Session ──────────────────────────────────────────────────────────

/// Shared, cheaply cloneable handle to the current [`ApiState`].
///
/// Clones observe each other's updates.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<ArcSwap<ApiState>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a session already pointed at `server` with `authorization`.
    pub fn with_server(server: &str, authorization: Option<Authorization>) -> Result<Self, Error> {
        let session = Self::new();
        session.set_server_address(Some(server))?;
        session.set_authorization(authorization);
        Ok(session)
    }

    /// Consistent view of the whole state for one request.
    pub fn snapshot(&self) -> Arc<ApiState> {
        self.state.load_full()
    }

    /// Set (and normalize) the server address, or clear it with `None`.
    pub fn set_server_address(&self, raw: Option<&str>) -> Result<(), Error> {
        let normalized = raw.map(normalize_server_address).transpose()?;
        if let Some(ref url) = normalized {
            tracing::debug!(server = %url, "session server address set");
        } else {
            tracing::debug!("session server address cleared");
        }
        self.state.rcu(|current| ApiState {
            server_address: normalized.clone(),
            authorization: current.authorization.clone(),
        });
        Ok(())
    }

    pub fn server_address(&self) -> Option<Url> {
        self.state.load().server_address.clone()
    }

    pub fn set_authorization(&self, authorization: Option<Authorization>) {
        tracing::debug!(
            kind = authorization.as_ref().map_or("none", Authorization::kind),
            "session authorization set"
        );
        self.state.rcu(|current| ApiState {
            server_address: current.server_address.clone(),
            authorization: authorization.clone(),
        });
    }

    pub fn authorization(&self) -> Option<Authorization> {
        self.state.load().authorization.clone()
    }

    pub fn is_configured(&self) -> bool {
        self.state.load().server_address.is_some()
    }

    /// Forget credentials but keep the server (logout).
    pub fn clear_authorization(&self) {
        self.set_authorization(None);
    }

    /// Forget everything.
    pub fn clear(&self) {
        self.state.store(Arc::new(ApiState::default()));
    }
}
