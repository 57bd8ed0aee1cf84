use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{LocalRunner, RunnerError};
use crate::types::jobs::context::JobContext;
use crate::types::jobs::types::JobType;
use crate::types::params::RunnerParams;

/// `EX_TEMPFAIL` from sysexits.h, the command asks to be retried later
pub const EXIT_CODE_TEMPFAIL: i32 = 75;

const STDERR_TAIL_BYTES: usize = 2048;

/// Runs each job as an external command.
///
/// The job input is written as JSON on stdin and the command runs inside the worker's scratch
/// directory. The last non-empty stdout line is the result location.
pub struct CommandRunner {
    review_command: Option<Vec<String>>,
    local_train_command: Option<Vec<String>>,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(params: &RunnerParams) -> Self {
        Self {
            review_command: params.review_command.clone(),
            local_train_command: params.local_train_command.clone(),
            timeout: params.timeout,
        }
    }

    fn command_for(&self, job_type: JobType) -> Option<&[String]> {
        match job_type {
            JobType::Review => self.review_command.as_deref(),
            JobType::LocalTrain => self.local_train_command.as_deref(),
            JobType::RemoteTrain => None,
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}

#[async_trait]
impl LocalRunner for CommandRunner {
    async fn run(
        &self,
        job_type: JobType,
        input: serde_json::Value,
        context: &JobContext,
    ) -> Result<String, RunnerError> {
        let (program, args) =
            self.command_for(job_type).and_then(|c| c.split_first()).ok_or(RunnerError::NotConfigured(job_type))?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&context.scratch_dir)
            .env("ORCHESTRATOR_WORKER_ID", &context.worker_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        debug!(program = %program, worker_id = %context.worker_id, "Local command spawned");

        let body = serde_json::to_vec(&input).map_err(|e| RunnerError::Failed(e.to_string()))?;
        let stdin = child.stdin.take();
        let write_input = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(&body).await {
                // The command exited or closed its input without reading all of it.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                // Dropping stdin closes it, which signals the end of the input.
                other => other,
            }
        };
        // Writing the input counts against the timeout: a command that never reads it would
        // otherwise block the worker once the pipe buffer is full.
        let execution = async {
            let (written, output) = tokio::join!(write_input, child.wait_with_output());
            written?;
            output
        };

        let output = match tokio::time::timeout(self.timeout, execution).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(program = %program, timeout_secs = self.timeout.as_secs(), "Local command timed out");
                return Err(RunnerError::Transient(format!("timed out after {}s", self.timeout.as_secs())));
            }
        };

        match output.status.code() {
            Some(0) => {}
            Some(EXIT_CODE_TEMPFAIL) => {
                return Err(RunnerError::Transient(format!(
                    "exit code {}: {}",
                    EXIT_CODE_TEMPFAIL,
                    stderr_tail(&output.stderr)
                )))
            }
            Some(code) => return Err(RunnerError::Failed(format!("exit code {}: {}", code, stderr_tail(&output.stderr)))),
            None => return Err(RunnerError::Failed("terminated by signal".to_string())),
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .map(str::trim)
            .rev()
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| RunnerError::Failed("command produced no result location".to_string()))
    }
}
