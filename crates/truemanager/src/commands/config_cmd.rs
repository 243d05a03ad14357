//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use truemanager_config::{AuthMethod, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, SecretKind};
use crate::error::{CliError, prompt_err};
use crate::output;

const REDACTED: &str = "********";

// ── Helpers ─────────────────────────────────────────────────────────

fn secret_kind(auth: AuthMethod) -> SecretKind {
    match auth {
        AuthMethod::ApiKey => SecretKind::ApiKey,
        AuthMethod::Password => SecretKind::Password,
        AuthMethod::Token => SecretKind::Token,
    }
}

fn prompt_secret(auth: AuthMethod) -> Result<String, CliError> {
    let label = match auth {
        AuthMethod::ApiKey => "API key: ",
        AuthMethod::Password => "Password: ",
        AuthMethod::Token => "Token: ",
    };
    let secret = rpassword::prompt_password(label).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "secret".into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(secret)
}

/// Copy of the config with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        for secret in [&mut profile.password, &mut profile.api_key, &mut profile.token] {
            if secret.is_some() {
                *secret = Some(REDACTED.into());
            }
        }
    }
    cfg
}

/// Apply `key = value` to a profile.
fn set_profile_value(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    let invalid = |field: &str, reason: &str| CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    };

    match key {
        "server" => profile.server = value,
        "auth" => {
            profile.auth = value
                .parse()
                .map_err(|_| invalid("auth", "must be 'api-key', 'password', or 'token'"))?;
        }
        "username" => profile.username = Some(value),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            profile.insecure = Some(
                value
                    .parse()
                    .map_err(|_| invalid("insecure", "must be 'true' or 'false'"))?,
            );
        }
        "timeout" => {
            profile.timeout = Some(
                value
                    .parse()
                    .map_err(|_| invalid("timeout", "must be a number (seconds)"))?,
            );
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: server, auth, username, \
                     api_key_env, ca_cert, insecure, timeout"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(
                global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n({e})")),
                |c| c.default_profile.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::new(String::new(), AuthMethod::default()));
            set_profile_value(profile, &key, value)?;

            config::save_config(&cfg)?;
            output::notice(&format!("Set {key} on profile '{profile_name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                output::notice("No profiles configured. Run: truemanager config init", global.quiet);
            } else {
                let lines: Vec<String> = cfg
                    .profiles
                    .iter()
                    .map(|(name, p)| {
                        let marker = if name == default { " *" } else { "" };
                        format!("{name}{marker}\t{}\t{}", p.server, p.auth)
                    })
                    .collect();
                output::print_output(&lines.join("\n"), global.quiet);
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::notice(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::SetSecret { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let prof = cfg
                .profiles
                .get(&profile_name)
                .ok_or_else(|| CliError::ProfileNotFound {
                    name: profile_name.clone(),
                    available: config::available_profiles(&cfg),
                })?;

            let secret = prompt_secret(prof.auth)?;
            config::store_secret(&profile_name, secret_kind(prof.auth), &secret)?;
            output::notice(
                &format!("Secret stored in system keyring for profile '{profile_name}'"),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::ClearSecret { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            let mut removed = 0;
            for kind in [SecretKind::ApiKey, SecretKind::Password, SecretKind::Token] {
                if config::delete_secret(&profile_name, kind)? {
                    removed += 1;
                }
            }
            output::notice(
                &format!("Removed {removed} keyring entries for profile '{profile_name}'"),
                global.quiet,
            );
            Ok(())
        }
    }
}

/// Interactive wizard. Adds (or replaces) one profile and makes it the default.
fn init() -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let config_path = config::config_path();
    eprintln!("truemanager configuration");
    eprintln!("  Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let server: String = Input::new()
        .with_prompt("Server URL")
        .default("https://truenas.local".into())
        .interact_text()
        .map_err(prompt_err)?;

    let auth_choices = &["API key (recommended)", "Username/password"];
    let auth = match Select::new()
        .with_prompt("Authentication method")
        .items(auth_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?
    {
        0 => AuthMethod::ApiKey,
        _ => AuthMethod::Password,
    };

    let mut profile = Profile::new(server, auth);

    if auth == AuthMethod::Password {
        let username: String = Input::new()
            .with_prompt("Username")
            .default("truenas_admin".into())
            .interact_text()
            .map_err(prompt_err)?;
        profile.username = Some(username);
    }

    let secret = prompt_secret(auth)?;
    let store_choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let in_keyring = Select::new()
        .with_prompt("Where to store it?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?
        == 0;

    if in_keyring {
        config::store_secret(&profile_name, secret_kind(auth), &secret)?;
        eprintln!("  Stored in system keyring");
    } else if auth == AuthMethod::ApiKey {
        profile.api_key = Some(secret);
    } else {
        profile.password = Some(secret);
    }

    let self_signed = Confirm::new()
        .with_prompt("Accept the server's self-signed certificate?")
        .default(true)
        .interact()
        .map_err(prompt_err)?;
    if self_signed {
        profile.insecure = Some(true);
    }

    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    let path = config::save_config(&cfg)?;

    eprintln!("\nConfiguration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: truemanager login");
    Ok(())
}
