use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum AiPlatformError {
    /// Network/transport errors that may be retryable (timeouts, refused connections, etc.)
    #[error("Network error during {operation}: {message}")]
    NetworkError { operation: String, message: String },

    /// The platform answered with a non-success status code
    #[error("AI Platform API error during {operation} (status {status}): {message}")]
    ApiError { operation: String, status: StatusCode, message: String },

    /// JSON parsing errors
    #[error("Failed to parse response during {operation}: {message}")]
    ParseError { operation: String, message: String },

    /// URL/path segment errors
    #[error("Failed to build URL for {operation}: {message}")]
    UrlError { operation: String, message: String },

    /// Client construction errors
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl AiPlatformError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            AiPlatformError::NetworkError { .. } => true,
            AiPlatformError::ApiError { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AiPlatformError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Create an error from a reqwest error
    pub fn from_reqwest_error(operation: impl Into<String>, source: reqwest::Error) -> Self {
        let operation = operation.into();

        if source.is_timeout() {
            AiPlatformError::NetworkError { operation, message: "request timed out".to_string() }
        } else if source.is_connect() {
            AiPlatformError::NetworkError { operation, message: format!("connection failed: {}", source) }
        } else if source.is_decode() {
            AiPlatformError::ParseError { operation, message: source.to_string() }
        } else if let Some(status) = source.status() {
            AiPlatformError::ApiError { operation, status, message: source.to_string() }
        } else {
            AiPlatformError::NetworkError { operation, message: source.to_string() }
        }
    }

    pub fn api_error(operation: impl Into<String>, status: StatusCode, message: impl Into<String>) -> Self {
        AiPlatformError::ApiError { operation: operation.into(), status, message: message.into() }
    }

    pub fn url_error(operation: impl Into<String>, message: impl Into<String>) -> Self {
        AiPlatformError::UrlError { operation: operation.into(), message: message.into() }
    }
}
