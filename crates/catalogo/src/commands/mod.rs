//! Command dispatch: bridges CLI args -> core App -> output formatting.

pub mod auth;
pub mod fetch;
pub mod navigate;

use catalogo_config::Config;
use catalogo_core::{App, FileSessionStore};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub type CliApp = App<FileSessionStore>;

/// Build the app from config: shared fetch module, file-backed session
/// store, and the configured route table.
pub fn build_app(cfg: &Config) -> Result<CliApp, CliError> {
    let client = cfg.client_config()?;
    let app = App::from_config(&client, cfg.session_store(), cfg.route_table())?;
    Ok(app)
}

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    cfg: &Config,
    app: &CliApp,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut notes = app.notifier().subscribe();

    let result = match cmd {
        Command::Login(args) => auth::login(app, cfg, args, global).await,
        Command::Logout(args) => auth::logout(app, args).await,
        Command::Whoami => auth::whoami(app, global).await,
        Command::Navigate(args) => navigate::handle(app, args, global).await,
        Command::Get(args) => fetch::handle(app, args, global).await,
        // Completions is handled before dispatch
        Command::Completions(_) => Ok(()),
    };

    output::drain_notifications(&mut notes, global);
    result
}
