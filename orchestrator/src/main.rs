use clap::Parser as _;
use dotenvy::dotenv;
use orchestrator::cli::{Cli, Commands, RunCmd};
use orchestrator::core::config::Config;
use orchestrator::server::setup_server;
use orchestrator::utils::logging::init_logging;
use orchestrator::utils::signal_handler::SignalHandler;
use orchestrator::worker::initialize_worker;
use orchestrator::{OrchestratorError, OrchestratorResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Start the server
#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();
    info!("Starting orchestrator");
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { run_command } => {
            debug!("Executing run command with args: {:?}", run_command);
            if let Err(e) = run_orchestrator(run_command).await {
                error!(
                    error = %e,
                    error_chain = ?e,
                    "Orchestrator service failed"
                );
                std::process::exit(1);
            }
        }
    }
}

async fn run_orchestrator(run_cmd: &RunCmd) -> OrchestratorResult<()> {
    let config = Arc::new(Config::from_run_cmd(run_cmd).await?);
    debug!("Configuration initialized");

    let (address, server_handle) = setup_server(config.clone()).await?;
    info!(address = %address, "Application router initialized");

    let shutdown_token = CancellationToken::new();
    let mut worker_controller = initialize_worker(config.clone(), shutdown_token.clone()).await?;
    info!("Orchestrator service started");

    let mut signal_handler = SignalHandler::new();
    signal_handler.wait_for_shutdown().await?;

    let shutdown_timeout = config.service_config().shutdown_timeout;
    let shutdown_config = config.clone();
    signal_handler
        .handle_graceful_shutdown(
            || async move {
                // Workers first: in-flight jobs finish while the API still answers reads
                worker_controller.shutdown(shutdown_timeout).await;
                server_handle.shutdown().await?;
                shutdown_config.database().disconnect().await?;
                Ok(())
            },
            shutdown_timeout * 2,
        )
        .await
        .map_err(OrchestratorError::from)?;

    info!("Orchestrator service shut down");
    Ok(())
}
