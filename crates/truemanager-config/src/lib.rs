//! Saved configuration for the truemanager CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `truemanager_core::ConnectionConfig`. The CLI layers
//! its global flags on top of what this crate resolves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use truemanager_core::{AuthCredentials, ConnectionConfig, TlsVerification};

/// Service name under which secrets are stored in the OS keyring.
pub const KEYRING_SERVICE: &str = "truemanager";

/// Prefix for environment overrides, e.g. `TRUEMANAGER_DEFAULTS__TIMEOUT=5`.
pub const ENV_PREFIX: &str = "TRUEMANAGER_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level contents of `config.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is requested.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Pick the active profile: the requested name, else `default_profile`.
    pub fn resolve_profile<'a>(
        &'a self,
        requested: Option<&'a str>,
    ) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// How a profile authenticates.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AuthMethod {
    #[default]
    ApiKey,
    Password,
    Token,
}

/// A named server profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Server address, e.g. `https://nas.local`.
    pub server: String,

    #[serde(default)]
    pub auth: AuthMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Plaintext password. Prefer the keyring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Plaintext API key. Prefer the keyring or `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Name of an environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Custom CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Profile {
    pub fn new(server: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            server: server.into(),
            auth,
            username: None,
            password: None,
            api_key: None,
            api_key_env: None,
            token: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "truemanager", "truemanager").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("truemanager");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the full config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then `path` (if present), then `TRUEMANAGER_*` variables.
/// Nested keys use a double underscore: `TRUEMANAGER_PROFILES__NAS__SERVER`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Which secret of a profile a keyring entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SecretKind {
    ApiKey,
    Password,
    Token,
}

fn keyring_entry(profile_name: &str, kind: SecretKind) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{kind}"))
}

fn keyring_secret(profile_name: &str, kind: SecretKind) -> Option<SecretString> {
    keyring_entry(profile_name, kind)
        .and_then(|entry| entry.get_password())
        .ok()
        .map(SecretString::from)
}

/// Store a secret for `profile_name` in the OS keyring.
pub fn store_secret(profile_name: &str, kind: SecretKind, secret: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name, kind)?.set_password(secret)?;
    Ok(())
}

/// Remove a stored secret. Returns `false` if there was none.
pub fn delete_secret(profile_name: &str, kind: SecretKind) -> Result<bool, ConfigError> {
    match keyring_entry(profile_name, kind)?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn env_secret(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

/// API key: `api_key_env`, `TRUEMANAGER_API_KEY`, keyring, plaintext.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    profile
        .api_key_env
        .as_deref()
        .and_then(env_secret)
        .or_else(|| env_secret("TRUEMANAGER_API_KEY"))
        .or_else(|| keyring_secret(profile_name, SecretKind::ApiKey))
        .or_else(|| profile.api_key.clone().map(SecretString::from))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Username from the profile or `TRUEMANAGER_USERNAME`; password from
/// `TRUEMANAGER_PASSWORD`, keyring, plaintext.
pub fn resolve_password_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };

    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("TRUEMANAGER_USERNAME").ok())
        .ok_or_else(no_credentials)?;

    let password = env_secret("TRUEMANAGER_PASSWORD")
        .or_else(|| keyring_secret(profile_name, SecretKind::Password))
        .or_else(|| profile.password.clone().map(SecretString::from))
        .ok_or_else(no_credentials)?;

    Ok((username, password))
}

/// Token: `TRUEMANAGER_TOKEN`, keyring, plaintext.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    env_secret("TRUEMANAGER_TOKEN")
        .or_else(|| keyring_secret(profile_name, SecretKind::Token))
        .or_else(|| profile.token.clone().map(SecretString::from))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve `AuthCredentials` from a profile's `auth` field.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    match profile.auth {
        AuthMethod::ApiKey => resolve_api_key(profile, profile_name).map(AuthCredentials::ApiKey),
        AuthMethod::Password => {
            let (username, password) = resolve_password_credentials(profile, profile_name)?;
            Ok(AuthCredentials::Password { username, password })
        }
        AuthMethod::Token => resolve_token(profile, profile_name).map(AuthCredentials::Token),
    }
}

/// TLS choice: `insecure` wins, then a custom CA, then strict verification.
pub fn tls_for(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `ConnectionConfig` from a profile, no CLI flag overrides.
pub fn profile_to_connection_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConnectionConfig, ConfigError> {
    let url: url::Url = profile
        .server
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", profile.server),
        })?;

    let auth = resolve_auth(profile, profile_name)?;

    let mut config = ConnectionConfig::new(url, auth);
    config.tls = tls_for(profile, defaults);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(config)
}
