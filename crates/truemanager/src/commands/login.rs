//! Login command handler.

use serde::Serialize;

use truemanager_api::types::GenerateTokenRequest;
use truemanager_core::{AuthCredentials, Manager};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct LoginInfo {
    server: String,
    user: String,
    auth: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

pub async fn handle(manager: &Manager, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let me = manager.login().await?;

    let user = match (&me, &manager.config().auth) {
        (Some(me), _) => me.pw_name.clone(),
        (None, AuthCredentials::Password { username, .. }) => username.clone(),
        (None, _) => "-".into(),
    };

    let token = if args.token {
        let request = GenerateTokenRequest {
            ttl: args.ttl,
            ..GenerateTokenRequest::default()
        };
        Some(manager.rest().generate_token(&request).await?)
    } else {
        None
    };

    let info = LoginInfo {
        server: manager.config().url.to_string(),
        user,
        auth: manager.config().auth.to_authorization().kind(),
        token,
    };

    let out = output::render_single(
        global.output,
        &info,
        |i| match &i.token {
            Some(token) => token.clone(),
            None => format!("Logged in to {} as {} ({})", i.server, i.user, i.auth),
        },
        |i| i.token.clone().unwrap_or_else(|| i.user.clone()),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
