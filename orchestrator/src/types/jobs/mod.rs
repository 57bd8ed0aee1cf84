pub mod context;
pub mod job_item;
pub mod job_updates;
pub mod metadata;
pub mod payloads;
pub mod types;
pub mod view;
