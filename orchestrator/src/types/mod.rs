pub mod jobs;
pub mod params;
pub mod queue;
