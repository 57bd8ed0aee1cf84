use std::time::Duration;

use orchestrator_ai_platform_service::AiPlatformValidatedArgs;

use crate::cli::training::ai_platform::AiPlatformCliArgs;
use crate::OrchestratorError;

#[derive(Debug, Clone)]
pub enum TrainingParams {
    /// No remote platform configured, remote training jobs fail permanently
    Disabled,
    AiPlatform(AiPlatformValidatedArgs),
}

impl TryFrom<AiPlatformCliArgs> for TrainingParams {
    type Error = OrchestratorError;
    fn try_from(args: AiPlatformCliArgs) -> Result<Self, Self::Error> {
        if !args.ai_platform {
            return Ok(Self::Disabled);
        }
        Ok(Self::AiPlatform(AiPlatformValidatedArgs {
            base_url: args
                .ai_platform_url
                .ok_or_else(|| OrchestratorError::RunCommandError("AI Platform url is required".to_string()))?,
            project: args
                .ai_platform_project
                .ok_or_else(|| OrchestratorError::RunCommandError("AI Platform project is required".to_string()))?,
            api_key: args
                .ai_platform_api_key
                .ok_or_else(|| OrchestratorError::RunCommandError("AI Platform API key is required".to_string()))?,
            request_timeout: Some(Duration::from_secs(args.ai_platform_request_timeout_seconds)),
        }))
    }
}
