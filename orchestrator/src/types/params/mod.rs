pub mod database;
pub mod pool;
pub mod reconciler;
pub mod retry;
pub mod runner;
pub mod service;
pub mod training;

pub use database::DatabaseParams;
pub use pool::{PoolParams, WorkerPoolParams};
pub use reconciler::ReconcilerParams;
pub use retry::RetryParams;
pub use runner::RunnerParams;
pub use service::{ServerParams, ServiceParams};
pub use training::TrainingParams;
