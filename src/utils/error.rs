use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("{service} responded with status {status}: {body}")]
    UpstreamStatus {
        service: String,
        status: u16,
        body: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Stream error: {message}")]
    StreamError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Upstream,
    Configuration,
    Data,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RagError {
    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) => ErrorCategory::Network,
            Self::UpstreamStatus { .. } | Self::StreamError { .. } => ErrorCategory::Upstream,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::SerializationError(_)
            | Self::ProcessingError { .. }
            | Self::ValidationError { .. } => ErrorCategory::Data,
            Self::IoError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ValidationError { .. } => ErrorSeverity::Low,
            // 429 和 5xx 通常稍後重試即可
            Self::UpstreamStatus { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            Self::ApiError(_) | Self::StreamError { .. } => ErrorSeverity::Medium,
            Self::UpstreamStatus { .. }
            | Self::SerializationError(_)
            | Self::ProcessingError { .. } => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) => "Check network connectivity to the OpenAI and Qdrant endpoints",
            Self::UpstreamStatus { status: 401, .. } | Self::UpstreamStatus { status: 403, .. } => {
                "Verify OPENAI_SECRET_KEY and QDRANT_API_KEY"
            }
            Self::UpstreamStatus { status: 404, .. } => {
                "Make sure the Qdrant collection exists and the model names are correct"
            }
            Self::UpstreamStatus { .. } => "The upstream service rejected the request; retry later",
            Self::StreamError { .. } => "The completion stream was interrupted; ask again",
            Self::IoError(_) => "Check that the paths exist and are readable",
            Self::SerializationError(_) => "The payload did not match the expected JSON shape",
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file or environment variables and restart"
            }
            Self::ProcessingError { .. } => "Inspect the input data; see logs for details",
            Self::ValidationError { .. } => "Correct the request and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach an upstream service: {}", self),
            ErrorCategory::Upstream => format!("An upstream service failed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Could not process data: {}", self),
            ErrorCategory::Io => format!("File system error: {}", self),
        }
    }
}

impl ResponseError for RagError {
    fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
            _ if matches!(self, Self::ValidationError { .. }) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // 上游回應內容只留在日誌，不回給瀏覽器
        let body = if status.is_server_error() {
            tracing::error!("❌ {} ({:?})", self, self.category());
            status.canonical_reason().unwrap_or("Internal Server Error").to_string()
        } else {
            self.user_friendly_message()
        };

        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(body)
    }
}

pub type Result<T> = std::result::Result<T, RagError>;
