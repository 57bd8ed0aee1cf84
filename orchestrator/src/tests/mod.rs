pub mod common;
pub mod database;
pub mod reconciler;
pub mod scenarios;
pub mod server;
