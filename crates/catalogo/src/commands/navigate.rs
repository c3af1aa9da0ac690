//! `navigate`: run the route guard for a path.

use catalogo_core::Navigation;

use super::CliApp;
use crate::cli::{GlobalOpts, NavigateArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(app: &CliApp, args: NavigateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // Adopt the persisted session first; the guard falls back to the
    // server-side session when there is none.
    app.auth().is_user_authenticated().await?;

    match app
        .navigate_with_cookie(&args.path, args.cookie.as_deref())
        .await?
    {
        Navigation::Proceed => {
            output::print_output(&args.path, global.quiet);
            Ok(())
        }
        Navigation::Redirect(to) => Err(CliError::Redirected {
            from: args.path,
            to,
        }),
    }
}
