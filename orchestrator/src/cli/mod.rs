use clap::{Parser, Subcommand};

pub mod database;
pub mod pool;
pub mod reconciler;
pub mod runner;
pub mod server;
pub mod service;
pub mod training;

#[derive(Parser, Debug)]
#[command(
    name = "orchestrator",
    about = "Orchestrator - annotation review and model training job engine",
    long_about = "The orchestrator accepts review, local training and remote training jobs, runs them on \
    per-kind worker pools and follows remote training runs until they finish.\n\n\
    Quick Start:\n  \
    orchestrator run\n  \
    orchestrator run --mongodb --ai-platform --ai-platform-url https://ml.example.com --ai-platform-project alchemy"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the orchestrator service
    Run {
        #[command(flatten)]
        run_command: Box<RunCmd>,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct RunCmd {
    #[clap(flatten)]
    pub service_args: service::ServiceCliArgs,

    #[clap(flatten)]
    pub pool_args: pool::WorkerPoolCliArgs,

    #[clap(flatten)]
    pub reconciler_args: reconciler::ReconcilerCliArgs,

    #[clap(flatten)]
    pub server_args: server::ServerCliArgs,

    #[clap(flatten)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,

    #[clap(flatten)]
    pub ai_platform_args: training::ai_platform::AiPlatformCliArgs,

    #[clap(flatten)]
    pub runner_args: runner::LocalRunnerCliArgs,
}
