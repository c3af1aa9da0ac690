//! Clap derive structures for the `catalogo` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// catalogo -- session-aware client for the catalogo backend
#[derive(Debug, Parser)]
#[command(
    name = "catalogo",
    version,
    about = "Log in to the catalogo backend and issue authenticated requests",
    long_about = "Command-line client for the catalogo backend.\n\n\
        Keeps a local session after login, checks route permissions the same\n\
        way the web frontend does, and issues requests with the session token.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "CATALOGO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "json", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and persist the session
    Login(LoginArgs),

    /// Drop the persisted session
    Logout(LogoutArgs),

    /// Show the current session's user
    Whoami,

    /// Check whether the current session may open a route
    #[command(alias = "nav")]
    Navigate(NavigateArgs),

    /// Issue an authenticated GET against the backend
    Get(GetArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// User name (defaults to `username` in config)
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    /// Store the password in the system keyring after a successful login
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct LogoutArgs {
    /// Also remove the stored keyring password for this user
    #[arg(long)]
    pub forget: bool,
}

#[derive(Debug, Args)]
pub struct NavigateArgs {
    /// Route path, e.g. /solicitudes
    pub path: String,

    /// Cookie header forwarded to the session lookup
    #[arg(long)]
    pub cookie: Option<String>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Backend path or absolute URL, e.g. /product
    pub path: String,

    /// Query parameter (repeatable)
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Print the body as text instead of decoding JSON
    #[arg(long)]
    pub raw: bool,

    /// Send the request without the session token
    #[arg(long)]
    pub no_token: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}
