//! Command-line front end over `promptloom::core`.

pub mod args;
pub mod clipboard;
pub mod handlers;
pub mod state;

pub use args::{Cli, Command};
pub use state::AppState;

use anyhow::Result;
use promptloom::core::{FolderCheckPolicy, default_settings_file};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();
}

pub async fn run(cli: Cli) -> Result<()> {
    let settings_path = cli.config.clone().unwrap_or_else(default_settings_file);
    let mut state = AppState::load(settings_path, FolderCheckPolicy::ImmediateFiles);

    match &cli.command {
        Command::Tree(sel) => handlers::on_tree(&mut state, sel).await,
        Command::Pack(a) => handlers::on_pack(&mut state, &a.selection, &a.prompt).await,
        Command::Watch(a) => {
            handlers::on_watch(&mut state, &a.selection, &a.prompt, a.interval_ms).await
        }
        Command::View { file } => handlers::on_view(file).await,
        Command::Write { file } => handlers::on_write(file).await,
        Command::Redact { file } => handlers::on_redact(&state, file.as_deref()).await,
        Command::Settings => handlers::on_settings(&state),
    }
}
