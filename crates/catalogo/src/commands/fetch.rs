//! `get`: authenticated GET against the backend.

use catalogo_api::{RequestConfig, ResponseKind};

use super::CliApp;
use crate::cli::{GetArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(app: &CliApp, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let authenticated = app.auth().is_user_authenticated().await?;
    if !authenticated && !args.no_token {
        return Err(CliError::NotAuthenticated);
    }

    let mut config = RequestConfig::get(&args.path);
    for (key, value) in args.params {
        config = config.param(key, value);
    }

    if args.raw {
        let body = app
            .service()
            .fetch_body(config.response_kind(ResponseKind::Text), args.no_token)
            .await?;
        output::print_output(&body.into_text().unwrap_or_default(), global.quiet);
        return Ok(());
    }

    // Top-level arrays carry no envelope; print the body as-is.
    let data = app
        .service()
        .fetch_body(config.response_kind(ResponseKind::Json), args.no_token)
        .await?
        .into_json()
        .unwrap_or_default();
    let rendered = output::render(global.output, &data, ToString::to_string)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
