use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Not authorized")]
    Unauthorized,

    #[error("Resource not found: {path}")]
    NotFound { path: String },

    #[error("API returned {status}: {message}")]
    ApiStatus { status: u16, message: String },

    #[error("CSV rendering error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Journal entry is not balanced: debits {debits:.2} vs credits {credits:.2}")]
    UnbalancedJournal { debits: f64, credits: f64 },

    #[error("Return of {requested} for item {item_id} exceeds balance quantity {balance}")]
    ReturnExceedsBalance {
        item_id: i64,
        requested: f64,
        balance: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Auth,
    Backend,
    Configuration,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ConsoleError {
    pub fn validation(message: impl Into<String>) -> Self {
        ConsoleError::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ConsoleError::HttpError(_) => ErrorCategory::Network,
            ConsoleError::Unauthorized => ErrorCategory::Auth,
            ConsoleError::NotFound { .. } | ConsoleError::ApiStatus { .. } => {
                ErrorCategory::Backend
            }
            ConsoleError::ConfigError { .. }
            | ConsoleError::ConfigValidationError { .. }
            | ConsoleError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ConsoleError::ValidationError { .. }
            | ConsoleError::UnbalancedJournal { .. }
            | ConsoleError::ReturnExceedsBalance { .. } => ErrorCategory::Input,
            ConsoleError::CsvError(_)
            | ConsoleError::IoError(_)
            | ConsoleError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 401 已由登入流程處理，不重複提示
            ErrorCategory::Auth => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Backend => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Errors the console swallows without an alert.
    pub fn is_silent(&self) -> bool {
        self.category() == ErrorCategory::Auth
    }

    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    /// 給終端使用者看的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            ConsoleError::HttpError(e) if e.is_timeout() => {
                "The server did not respond in time".to_string()
            }
            ConsoleError::HttpError(e) if e.is_connect() => {
                "Could not connect to the back-office server".to_string()
            }
            ConsoleError::HttpError(_) => "Request to the back-office server failed".to_string(),
            ConsoleError::Unauthorized => "Session expired, please sign in again".to_string(),
            ConsoleError::NotFound { path } => format!("{} was not found", path),
            ConsoleError::ApiStatus { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ConsoleError::HttpError(_) => "Check --base-url and that the API server is running",
            ConsoleError::Unauthorized => "Refresh the token passed via --token or PMS_TOKEN",
            ConsoleError::NotFound { .. } => "Check the id and that the record still exists",
            ConsoleError::ApiStatus { .. } => "Review the request values and try again",
            ConsoleError::UnbalancedJournal { .. } => {
                "Adjust the lines so total debits equal total credits"
            }
            ConsoleError::ReturnExceedsBalance { .. } => {
                "Return at most the balance quantity shown for the assignment"
            }
            ConsoleError::ValidationError { .. } => "Fix the highlighted input and retry",
            ConsoleError::ConfigError { .. }
            | ConsoleError::ConfigValidationError { .. }
            | ConsoleError::InvalidConfigValueError { .. } => {
                "Check the profile file and command-line flags"
            }
            ConsoleError::CsvError(_)
            | ConsoleError::IoError(_)
            | ConsoleError::SerializationError(_) => "Check file permissions and disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
