use std::time::Duration;

pub const AI_PLATFORM_API_VERSION: &str = "v1";
pub const AI_PLATFORM_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const AI_PLATFORM_DISPLAY_NAME_PREFIX: &str = "alchemy-train";
