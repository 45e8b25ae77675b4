use clap::Parser as _;
use dotenvy::dotenv;
use quiz_grader::cli::{Cli, Commands, RunCmd, SetupCmd};
use quiz_grader::core::config::Config;
use quiz_grader::setup::setup;
use quiz_grader::utils::logging::init_logging;
use quiz_grader::utils::signal_handler::SignalHandler;
use quiz_grader::worker::initialize_worker;
use quiz_grader::GraderResult;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    if let Err(e) = init_logging() {
        report_logging_failure(&e);
        return ExitCode::FAILURE;
    }
    info!("Starting quiz grader");
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { run_command } => {
            info!("Executing run command with args: {:?}", run_command);
            match run_grader(run_command).await {
                Ok(_) => {
                    info!("Quiz grader stopped");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(
                        error = %e,
                        error_chain = ?e,
                        "Quiz grader failed"
                    );
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Setup { setup_command } => {
            info!("Executing setup command with args: {:?}", setup_command);
            match setup_grader(setup_command).await {
                Ok(_) => {
                    info!("Quiz grader setup completed successfully");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(
                        error = %e,
                        error_chain = ?e,
                        "Failed to set up quiz grader"
                    );
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn run_grader(run_cmd: &RunCmd) -> GraderResult<()> {
    let config = Arc::new(Config::from_run_cmd(run_cmd).await?);
    debug!("Configuration initialized");
    let shutdown_timeout = config.params().graceful_shutdown_timeout;

    let mut signal_handler = SignalHandler::new();
    let worker_controller = initialize_worker(config, signal_handler.shutdown_trigger().child_token()).await?;

    signal_handler.wait_for_shutdown().await?;

    signal_handler
        .handle_graceful_shutdown(
            || async move {
                let stats = worker_controller.shutdown().await?;
                info!(?stats, "Grading worker drained");
                Ok(())
            },
            shutdown_timeout,
        )
        .await?;
    Ok(())
}

/// setup_grader - Creates the queue and the result-store index
async fn setup_grader(setup_cmd: &SetupCmd) -> GraderResult<()> {
    setup(setup_cmd).await
}

/// Logging is not available yet, so this is the only place that writes to stderr directly
#[allow(clippy::print_stderr)]
fn report_logging_failure(error: &anyhow::Error) {
    eprintln!("Failed to initialize logging: {error:#}");
}
