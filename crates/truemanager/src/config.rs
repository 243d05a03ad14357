//! CLI configuration: thin wrapper around `truemanager_config`.
//!
//! Adds `GlobalOpts` flag overrides (--server, --api-key, --username,
//! --insecure, --timeout) on top of the shared profile resolution.

use std::io::{self, IsTerminal};
use std::time::Duration;

use secrecy::SecretString;

use truemanager_config::{AuthMethod, ConfigError, Profile};
use truemanager_core::{AuthCredentials, ConnectionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::{CliError, prompt_err};

pub use truemanager_config::{
    Config, SecretKind, config_path, delete_secret, load_config_or_default, save_config,
    store_secret,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Build a `ConnectionConfig` from the config file, profile, and flags.
///
/// Without a matching profile, `--server` plus credentials from flags or
/// environment are enough.
pub fn build_connection_config(global: &GlobalOpts) -> Result<ConnectionConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                available: available_profiles(&cfg),
                name: profile_name,
            });
        }
        None => {
            let server = global.server.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(server, AuthMethod::ApiKey)
        }
    };

    resolve_profile(&profile, &profile_name, &cfg, global)
}

/// Translate a `Profile` + global flags into a `ConnectionConfig`.
/// Flags win over profile values, profile values over `[defaults]`.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<ConnectionConfig, CliError> {
    let server = global.server.as_deref().unwrap_or(&profile.server);
    let url: url::Url = server.parse().map_err(|_| CliError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {server}"),
    })?;

    let auth = resolve_auth_with_flags(profile, profile_name, global)?;

    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        truemanager_config::tls_for(profile, &cfg.defaults)
    };

    let timeout = Duration::from_secs(
        global
            .timeout
            .or(profile.timeout)
            .unwrap_or(cfg.defaults.timeout),
    );

    let mut config = ConnectionConfig::new(url, auth);
    config.tls = tls;
    config.timeout = timeout;
    config.call_timeout = Some(timeout);
    Ok(config)
}

/// `--api-key` wins outright; `--username` switches the profile to
/// password auth. A missing password is prompted for on a terminal.
fn resolve_auth_with_flags(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<AuthCredentials, CliError> {
    if let Some(ref key) = global.api_key {
        return Ok(AuthCredentials::ApiKey(SecretString::from(key.clone())));
    }

    let mut profile = profile.clone();
    if let Some(ref username) = global.username {
        profile.auth = AuthMethod::Password;
        profile.username = Some(username.clone());
    }

    match truemanager_config::resolve_auth(&profile, profile_name) {
        Ok(auth) => Ok(auth),
        Err(ConfigError::NoCredentials { .. })
            if profile.auth == AuthMethod::Password && io::stdin().is_terminal() =>
        {
            let Some(username) = profile.username else {
                return Err(CliError::NoCredentials {
                    profile: profile_name.into(),
                });
            };
            let password = rpassword::prompt_password(format!("Password for {username}: "))
                .map_err(prompt_err)?;
            Ok(AuthCredentials::Password {
                username,
                password: SecretString::from(password),
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["truemanager"];
        argv.extend_from_slice(args);
        argv.push("dashboard");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn flags_override_profile() {
        let mut profile = Profile::new("https://nas.local", AuthMethod::Token);
        profile.timeout = Some(60);
        profile.ca_cert = Some("/etc/ca.pem".into());
        let cfg = Config::default();

        let global = global(&["--server", "https://other.local", "--api-key", "1-k", "-k", "--timeout", "9"]);
        let config = resolve_profile(&profile, "nas", &cfg, &global).unwrap();

        assert_eq!(config.url.as_str(), "https://other.local/");
        assert!(matches!(config.auth, AuthCredentials::ApiKey(_)));
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(config.timeout, Duration::from_secs(9));
        assert_eq!(config.call_timeout, Some(Duration::from_secs(9)));
    }

    #[test]
    fn profile_values_apply_without_flags() {
        let mut profile = Profile::new("https://nas.local", AuthMethod::ApiKey);
        profile.timeout = Some(60);
        profile.ca_cert = Some("/etc/ca.pem".into());
        let cfg = Config::default();

        let global = global(&["--api-key", "1-k"]);
        let config = resolve_profile(&profile, "nas", &cfg, &global).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.tls, TlsVerification::CustomCa("/etc/ca.pem".into()));
    }

    #[test]
    fn profile_listing() {
        let mut cfg = Config::default();
        assert_eq!(available_profiles(&cfg), "(none)");
        cfg.profiles
            .insert("b".into(), Profile::new("https://b", AuthMethod::ApiKey));
        cfg.profiles
            .insert("a".into(), Profile::new("https://a", AuthMethod::ApiKey));
        assert_eq!(available_profiles(&cfg), "a, b");
    }
}
