use std::time::Duration;

use crate::cli::runner::LocalRunnerCliArgs;

#[derive(Debug, Clone)]
pub struct RunnerParams {
    pub review_command: Option<Vec<String>>,
    pub local_train_command: Option<Vec<String>>,
    pub timeout: Duration,
}

fn split_command(command: Option<String>) -> Option<Vec<String>> {
    command
        .map(|c| c.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .filter(|parts| !parts.is_empty())
}

impl From<LocalRunnerCliArgs> for RunnerParams {
    fn from(args: LocalRunnerCliArgs) -> Self {
        Self {
            review_command: split_command(args.review_command),
            local_train_command: split_command(args.local_train_command),
            timeout: Duration::from_secs(args.local_runner_timeout_seconds),
        }
    }
}
