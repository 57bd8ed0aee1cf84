// Client abstractions module - contains all client interface traits

pub mod database;
pub mod lock;
pub mod queue;
pub mod runner;

// Re-export commonly used types
pub use database::{memory::InMemoryDatabase, mongodb::MongoDbClient, DatabaseClient};
pub use lock::{memory::InMemoryLock, LockClient};
pub use queue::{memory::InMemoryQueue, QueueClient};
pub use runner::{command::CommandRunner, LocalRunner};
