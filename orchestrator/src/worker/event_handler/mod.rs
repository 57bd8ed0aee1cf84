pub mod factory;
pub mod jobs;
pub mod running;
pub mod service;
