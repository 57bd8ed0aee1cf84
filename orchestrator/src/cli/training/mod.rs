pub mod ai_platform;
