//! `login`, `logout`, `whoami`.

use secrecy::SecretString;
use serde::Serialize;
use tracing::debug;

use catalogo_config::{self as config, Config, ConfigError};
use catalogo_core::AuthData;

use super::CliApp;
use crate::cli::{GlobalOpts, LoginArgs, LogoutArgs};
use crate::error::CliError;
use crate::output;

/// Resolve the password from env / keyring / config, prompting when none
/// is configured.
fn password_for(cfg: &Config, user: &str) -> Result<SecretString, CliError> {
    match config::resolve_password(cfg, user) {
        Ok(pw) => Ok(pw),
        Err(ConfigError::NoCredentials { .. }) => {
            let pw = rpassword::prompt_password(format!("Contraseña para {user}: ")).map_err(
                |_| CliError::NoCredentials {
                    user: user.to_owned(),
                },
            )?;
            Ok(SecretString::from(pw))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login(
    app: &CliApp,
    cfg: &Config,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let user = config::resolve_username(cfg, args.user.as_deref())?;
    let password = password_for(cfg, &user)?;

    let data = app.login(&user, &password).await?;

    if args.save {
        config::store_password(&user, &password)?;
        debug!(user, "password stored in keyring");
    }

    print_session(&data, global)
}

pub async fn logout(app: &CliApp, args: LogoutArgs) -> Result<(), CliError> {
    app.auth().is_user_authenticated().await?;
    let user = app.auth().username();
    app.logout().await?;

    if args.forget {
        if let Some(user) = user {
            config::forget_password(&user)?;
        }
    }
    Ok(())
}

pub async fn whoami(app: &CliApp, global: &GlobalOpts) -> Result<(), CliError> {
    if !app.auth().is_user_authenticated().await? {
        return Err(CliError::NotAuthenticated);
    }
    let data = app.auth().auth_data().ok_or(CliError::NotAuthenticated)?;
    print_session(&data, global)
}

/// Session summary; the token itself is never printed.
#[derive(Serialize)]
struct SessionView<'a> {
    id: &'a str,
    username: &'a str,
    email: &'a str,
    rut: &'a str,
    roles: &'a [String],
    cost_centres: &'a [String],
    expire: String,
}

fn print_session(data: &AuthData, global: &GlobalOpts) -> Result<(), CliError> {
    let view = SessionView {
        id: &data.user.id,
        username: &data.user.username,
        email: &data.user.email,
        rut: &data.user.national_id,
        roles: &data.user.roles,
        cost_centres: &data.user.cost_centres,
        expire: data.expire.to_rfc3339(),
    };
    let rendered = output::render(global.output, &view, |v| {
        format!("{} ({})", v.username, v.roles.join(", "))
    })?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
