use clap::Args;

/// Commands executing local jobs. The job is written as JSON on stdin, the last line printed on
/// stdout is taken as the result location.
#[derive(Debug, Clone, Args)]
pub struct LocalRunnerCliArgs {
    /// Command building the annotation requests of a review job.
    #[arg(env = "ORCHESTRATOR_REVIEW_COMMAND", long)]
    pub review_command: Option<String>,

    /// Command training a model on this host.
    #[arg(env = "ORCHESTRATOR_LOCAL_TRAIN_COMMAND", long)]
    pub local_train_command: Option<String>,

    /// Wall clock limit of one local execution, in seconds.
    #[arg(env = "ORCHESTRATOR_LOCAL_RUNNER_TIMEOUT_SECONDS", long, default_value = "3600")]
    pub local_runner_timeout_seconds: u64,
}
