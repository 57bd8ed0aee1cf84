use clap::Args;
use url::Url;

/// Parameters used to config the AI Platform training service.
#[derive(Debug, Clone, Args)]
pub struct AiPlatformCliArgs {
    /// Use the AI Platform training service for remote training jobs.
    #[arg(long)]
    pub ai_platform: bool,

    /// Base URL of the AI Platform API.
    #[arg(env = "ORCHESTRATOR_AI_PLATFORM_URL", long)]
    #[arg(required_if_eq("ai_platform", "true"))]
    pub ai_platform_url: Option<Url>,

    /// Project the training jobs are created in.
    #[arg(env = "ORCHESTRATOR_AI_PLATFORM_PROJECT", long)]
    #[arg(required_if_eq("ai_platform", "true"))]
    pub ai_platform_project: Option<String>,

    /// Bearer token used to authenticate against the API.
    #[arg(env = "ORCHESTRATOR_AI_PLATFORM_API_KEY", long)]
    #[arg(required_if_eq("ai_platform", "true"))]
    pub ai_platform_api_key: Option<String>,

    /// Timeout of a single API request, in seconds.
    #[arg(env = "ORCHESTRATOR_AI_PLATFORM_REQUEST_TIMEOUT_SECONDS", long, default_value = "30")]
    pub ai_platform_request_timeout_seconds: u64,
}
