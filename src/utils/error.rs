use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Staging error: {message}")]
    StagingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Storage,
    Internal,
}

impl LoaderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LoaderError::ConfigError { .. }
            | LoaderError::InvalidConfigValueError { .. }
            | LoaderError::MissingConfigError { .. }
            | LoaderError::PatternError(_) => ErrorCategory::Configuration,
            LoaderError::HttpError(_) => ErrorCategory::Network,
            LoaderError::IoError(_) | LoaderError::StagingError { .. } => ErrorCategory::Storage,
            LoaderError::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LoaderError::InvalidConfigValueError { field, reason, .. } => {
                format!("設定值無效 `{}`: {}", field, reason)
            }
            LoaderError::MissingConfigError { field } => format!("缺少必要設定 `{}`", field),
            LoaderError::PatternError(e) => format!("診斷訊息樣式無法編譯: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the resource URLs, total size and [diagnostics] patterns"
            }
            ErrorCategory::Network => "Check network connectivity and TLS settings",
            ErrorCategory::Storage => "Check that the output directory is writable",
            ErrorCategory::Internal => "Re-run with --verbose and report the log",
        }
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;
