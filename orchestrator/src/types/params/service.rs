use std::time::Duration;

use crate::cli::server::ServerCliArgs;
use crate::cli::service::ServiceCliArgs;

#[derive(Debug, Clone)]
pub struct ServiceParams {
    /// Deployment environment, part of every model identifier
    pub environment: String,
    pub job_lock_ttl: Duration,
    pub shutdown_timeout: Duration,
}

impl From<ServiceCliArgs> for ServiceParams {
    fn from(args: ServiceCliArgs) -> Self {
        Self {
            environment: args.environment,
            job_lock_ttl: Duration::from_secs(args.job_lock_ttl_seconds),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_seconds),
        }
    }
}

impl Default for ServiceParams {
    fn default() -> Self {
        Self {
            environment: "dev".to_string(),
            job_lock_ttl: Duration::from_secs(3600),
            shutdown_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerParams {
    pub host: String,
    pub port: u16,
}

impl From<ServerCliArgs> for ServerParams {
    fn from(value: ServerCliArgs) -> Self {
        Self { host: value.host, port: value.port }
    }
}

impl Default for ServerParams {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 3000 }
    }
}
