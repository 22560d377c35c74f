use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use healthchecker::check::HttpCheck;
use healthchecker::cli::{Cli, Command, HttpArgs, ServeCheck};
use healthchecker::client;
use healthchecker::logging;
use healthchecker::server::{spawn_signal_watcher, wait_for_signal, ServeError, Server, Shutdown};

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init();

    // The daemon is deliberately serial; one thread is all it needs
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            error!("Failed to start runtime: {}", error);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{}", error);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match cli.command {
        Command::Serve { check } => match check {
            ServeCheck::Http(args) => serve(cli.socket, args).await,
        },
        Command::Check => check(cli.socket).await,
        Command::Http(args) => http(args).await,
        Command::Wait => wait().await,
    }
}

/// `serve http`: answer check requests until SIGINT/SIGTERM.
async fn serve(
    socket: PathBuf,
    args: HttpArgs,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Starting healthchecker {}", healthchecker::VERSION);

    let check = HttpCheck::new(args.into())?;
    let shutdown = Shutdown::new();
    let _watcher =
        spawn_signal_watcher(shutdown.clone()).map_err(|error| ServeError::Signal { error })?;

    let server = Server::new(socket, check);
    server.run(shutdown).await?;
    Ok(())
}

/// `check`: probe the daemon once and exit accordingly.
async fn check(socket: PathBuf) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let verdict = client::probe(&socket).await?;
    if verdict.is_healthy() {
        info!("Health check returned: healthy");
        Ok(())
    } else {
        warn!("Health check returned: unhealthy");
        Err("unhealthy".into())
    }
}

/// `http`: run the probe once in-process, no daemon involved.
async fn http(args: HttpArgs) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let check = HttpCheck::new(args.into())?;
    check.execute().await?;
    info!("All checks succeeded");
    Ok(())
}

/// `wait`: block until an interrupt signal arrives.
async fn wait() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Waiting for signals on PID {}...", std::process::id());
    let name = wait_for_signal().await?;
    info!("Received '{}'. Exiting", name);
    Ok(())
}
