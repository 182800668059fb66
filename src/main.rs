use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use ponzu::cli::{Cli, Invocation, Verb};
use ponzu::config::Config;
use ponzu::dispatch::Dispatcher;
use ponzu::launcher::SystemProcessRunner;
use ponzu::logging;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let invocation = Invocation::from(&cli);
    let is_server_mode = matches!(invocation.verb, Some(Verb::Serve));

    let logging_handle = logging::init_logging(&config, is_server_mode, cli.debug)?;
    if let Some(path) = &logging_handle.log_file_path {
        tracing::info!(path = %path.display(), "Logging to file");
    }

    let dispatcher = Dispatcher::new(config, Arc::new(SystemProcessRunner::new()));
    let exit = dispatcher.dispatch(&invocation).await;

    Ok(exit.into())
}
