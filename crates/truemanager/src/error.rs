//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use truemanager_config::ConfigError;
use truemanager_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(truemanager::connection_failed),
        help(
            "{reason}\n\
             Check that the server is reachable. Self-signed certificate? Try --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Not connected to the server")]
    #[diagnostic(
        code(truemanager::disconnected),
        help("The websocket closed before the request completed. Retry the command.")
    )]
    Disconnected,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(truemanager::auth_failed),
        help(
            "Verify your API key or username/password.\n\
             Store a new secret with: truemanager config set-secret"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(truemanager::no_credentials),
        help(
            "Configure credentials with: truemanager config init\n\
             Or pass --api-key / --username, or set TRUEMANAGER_API_KEY."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource} not found")]
    #[diagnostic(code(truemanager::not_found))]
    NotFound { resource: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(truemanager::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(truemanager::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(truemanager::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: truemanager config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(truemanager::no_config),
        help(
            "Create a profile with: truemanager config init\n\
             Or pass --server. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(truemanager::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Prompt failed: {0}")]
    #[diagnostic(
        code(truemanager::prompt),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    Prompt(String),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(truemanager::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(truemanager::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    #[diagnostic(code(truemanager::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::Prompt(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Disconnected => CliError::Disconnected,
            err @ (CoreError::Timeout { .. } | CoreError::RequestTimedOut) => CliError::Timeout {
                message: err.to_string(),
            },
            CoreError::NotFound { resource } => CliError::NotFound { resource },
            CoreError::Api {
                message,
                status,
                errname,
            } => CliError::ApiError {
                code: errname
                    .or_else(|| status.map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<truemanager_api::Error> for CliError {
    fn from(err: truemanager_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(see: truemanager config profiles)".into(),
            },
            other => CliError::Config(Box::new(other)),
        }
    }
}

/// Map a dialoguer / rpassword failure into `CliError`.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Prompt(e.to_string())
}
