// ── Runtime connection configuration ──
//
// These types describe *how* to reach a TrueNAS server. They carry
// credential data and connection tuning, but never touch disk. The CLI
// builds a `ConnectionConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use truemanager_api::{Authorization, DdpConfig, TlsMode, TransportConfig};

/// How to authenticate with the server.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Local account username/password.
    Password {
        username: String,
        password: SecretString,
    },
    /// API key (preferred for automation).
    ApiKey(SecretString),
    /// Token from `auth/generate_token`.
    Token(SecretString),
}

impl AuthCredentials {
    pub fn to_authorization(&self) -> Authorization {
        match self {
            Self::Password { username, password } => {
                Authorization::basic(username.clone(), password.expose_secret())
            }
            Self::ApiKey(key) => Authorization::api_key(key.expose_secret()),
            Self::Token(token) => Authorization::token(token.expose_secret()),
        }
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Bundled webpki roots (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. TrueNAS ships a self-signed certificate.
    #[default]
    DangerAcceptInvalid,
}

/// Everything needed to talk to one server.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server root, e.g. `https://nas.local`.
    pub url: Url,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Deadline for a single DDP method call; `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
}

impl ConnectionConfig {
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            call_timeout: None,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }

    pub(crate) fn ddp(&self) -> DdpConfig {
        DdpConfig {
            transport: self.transport(),
            call_timeout: self.call_timeout,
            ..DdpConfig::default()
        }
    }
}
