use std::collections::HashMap;
use std::sync::Arc;

use orchestrator_ai_platform_service::AiPlatformTrainingService;
use orchestrator_training_client_interface::TrainingClient;
use tracing::{debug, info};

use crate::cli::RunCmd;
use crate::core::client::database::mongodb::MongoDbClient;
use crate::core::client::{
    CommandRunner, DatabaseClient, InMemoryDatabase, InMemoryLock, InMemoryQueue, LocalRunner, LockClient,
    QueueClient,
};
use crate::types::jobs::types::JobType;
use crate::types::params::{
    DatabaseParams, PoolParams, ReconcilerParams, RetryParams, RunnerParams, ServerParams, ServiceParams,
    TrainingParams,
};
use crate::worker::event_handler::factory;
use crate::worker::event_handler::jobs::JobHandlerTrait;
use crate::worker::event_handler::running::RunningJobs;
use crate::{OrchestratorError, OrchestratorResult};

/// Plain settings of the orchestrator, everything that is not a client.
#[derive(Debug, Clone, Default)]
pub struct ConfigParams {
    pub service: ServiceParams,
    pub retry: RetryParams,
    pub pools: PoolParams,
    pub reconciler: ReconcilerParams,
    pub server: ServerParams,
}

/// The app config. It can be accessed from anywhere inside the service
/// by calling `config` function.
pub struct Config {
    params: ConfigParams,
    /// The database client
    database: Box<dyn DatabaseClient>,
    /// Queue client
    queue: Box<dyn QueueClient>,
    /// Lock client
    lock: Box<dyn LockClient>,
    /// Remote training platform, absent when none is configured
    training_client: Option<Box<dyn TrainingClient>>,
    /// Executes review and local training jobs
    local_runner: Box<dyn LocalRunner>,
    handlers: HashMap<JobType, Arc<dyn JobHandlerTrait>>,
    /// Attempts executing in this process, so that a cancellation can stop them
    running_jobs: RunningJobs,
}

impl Config {
    pub fn new(
        params: ConfigParams,
        database: Box<dyn DatabaseClient>,
        queue: Box<dyn QueueClient>,
        lock: Box<dyn LockClient>,
        training_client: Option<Box<dyn TrainingClient>>,
        local_runner: Box<dyn LocalRunner>,
    ) -> Self {
        Self {
            params,
            database,
            queue,
            lock,
            training_client,
            local_runner,
            handlers: factory::default_job_handlers(),
            running_jobs: RunningJobs::new(),
        }
    }

    /// Replaces the handler bound to `job_type`.
    pub fn with_handler(mut self, job_type: JobType, handler: Arc<dyn JobHandlerTrait>) -> Self {
        self.handlers.insert(job_type, handler);
        self
    }

    /// Builds the config from the parsed `run` command, connecting every configured client.
    pub async fn from_run_cmd(run_cmd: &RunCmd) -> OrchestratorResult<Self> {
        let params = ConfigParams {
            service: ServiceParams::from(run_cmd.service_args.clone()),
            retry: RetryParams::from(&run_cmd.service_args),
            pools: PoolParams::try_from(run_cmd.pool_args.clone())?,
            reconciler: ReconcilerParams::try_from(run_cmd.reconciler_args.clone())?,
            server: ServerParams::from(run_cmd.server_args.clone()),
        };
        let database_params = DatabaseParams::try_from(run_cmd.mongodb_args.clone())?;
        let training_params = TrainingParams::try_from(run_cmd.ai_platform_args.clone())?;
        let runner_params = RunnerParams::from(run_cmd.runner_args.clone());

        let database = Self::build_database_client(&database_params).await?;
        let training_client = Self::build_training_client(&training_params)?;
        let local_runner: Box<dyn LocalRunner> = Box::new(CommandRunner::new(&runner_params));
        debug!(
            review_command = runner_params.review_command.is_some(),
            local_train_command = runner_params.local_train_command.is_some(),
            "Local runner configured"
        );

        Ok(Self::new(
            params,
            database,
            Box::new(InMemoryQueue::new()),
            Box::new(InMemoryLock::new()),
            training_client,
            local_runner,
        ))
    }

    pub async fn build_database_client(params: &DatabaseParams) -> OrchestratorResult<Box<dyn DatabaseClient>> {
        match params {
            DatabaseParams::InMemory => {
                info!("Using the in-memory job store, jobs do not survive a restart");
                Ok(Box::new(InMemoryDatabase::new()))
            }
            DatabaseParams::MongoDB(mongo) => {
                info!(database = %mongo.database_name, "Connecting to MongoDB");
                Ok(Box::new(MongoDbClient::new(mongo).await?))
            }
        }
    }

    pub fn build_training_client(params: &TrainingParams) -> OrchestratorResult<Option<Box<dyn TrainingClient>>> {
        match params {
            TrainingParams::Disabled => {
                info!("No remote training platform configured, remote-train jobs will fail");
                Ok(None)
            }
            TrainingParams::AiPlatform(args) => {
                let service = AiPlatformTrainingService::new_with_args(args)
                    .map_err(|e| OrchestratorError::TrainingClientError(e.to_string()))?;
                info!(base_url = %args.base_url, project = %args.project, "AI Platform training client configured");
                Ok(Some(Box::new(service)))
            }
        }
    }

    pub fn params(&self) -> &ConfigParams {
        &self.params
    }

    pub fn service_config(&self) -> &ServiceParams {
        &self.params.service
    }

    pub fn retry_config(&self) -> &RetryParams {
        &self.params.retry
    }

    pub fn pool_config(&self) -> &PoolParams {
        &self.params.pools
    }

    pub fn reconciler_config(&self) -> &ReconcilerParams {
        &self.params.reconciler
    }

    pub fn server_config(&self) -> &ServerParams {
        &self.params.server
    }

    /// Returns the database client
    pub fn database(&self) -> &dyn DatabaseClient {
        self.database.as_ref()
    }

    /// Returns the queue provider
    pub fn queue(&self) -> &dyn QueueClient {
        self.queue.as_ref()
    }

    /// Returns the lock client
    pub fn lock(&self) -> &dyn LockClient {
        self.lock.as_ref()
    }

    /// Returns the training client, if one is configured
    pub fn training_client(&self) -> Option<&dyn TrainingClient> {
        self.training_client.as_deref()
    }

    pub fn local_runner(&self) -> &dyn LocalRunner {
        self.local_runner.as_ref()
    }

    pub fn running_jobs(&self) -> &RunningJobs {
        &self.running_jobs
    }

    /// Returns the handler bound to `job_type`
    pub fn job_handler(&self, job_type: &JobType) -> Option<Arc<dyn JobHandlerTrait>> {
        self.handlers.get(job_type).cloned()
    }
}
