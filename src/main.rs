#![allow(clippy::needless_return)]

mod cli;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    // A copy of this binary may have been spawned only to hold the clipboard.
    if cli::clipboard::run_daemon_if_requested()? {
        return Ok(());
    }

    let args = cli::Cli::parse();
    cli::init_tracing(args.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(cli::run(args))
}
