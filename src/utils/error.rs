use thiserror::Error;

/// sysexits(3) codes used by the CLI.
pub mod exit_code {
    pub const DATAERR: i32 = 65;
    pub const SOFTWARE: i32 = 70;
    pub const IOERR: i32 = 74;
    pub const CONFIG: i32 = 78;
}

#[derive(Error, Debug)]
pub enum MsrError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to replace registry file: {0}")]
    PersistError(#[from] tempfile::PersistError),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Malformed registry line {line_number}: {reason}")]
    MalformedLine { line_number: usize, reason: String },

    #[error("Registry not found at {path}")]
    RegistryMissing { path: String },

    #[error("Request to {url} timed out after {seconds:.1}s")]
    FetchTimeout { url: String, seconds: f64 },

    #[error("Configuration validation error in field '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl MsrError {
    pub fn exit_code(&self) -> i32 {
        match self {
            MsrError::InvalidUrl { .. } | MsrError::MalformedLine { .. } => exit_code::DATAERR,
            MsrError::IoError(_) | MsrError::PersistError(_) | MsrError::RegistryMissing { .. } => {
                exit_code::IOERR
            }
            MsrError::ConfigValidationError { .. } | MsrError::InvalidConfigValueError { .. } => {
                exit_code::CONFIG
            }
            MsrError::HttpError(_)
            | MsrError::FetchTimeout { .. }
            | MsrError::SerializationError(_) => exit_code::SOFTWARE,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MsrError::InvalidUrl { .. } => "Error: invalid URL.".to_string(),
            MsrError::RegistryMissing { .. } => "Warning: No URLs in the registry.".to_string(),
            MsrError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            MsrError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration problem in '{}': {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MsrError::InvalidUrl { .. } => "Use an absolute http:// or https:// URL",
            MsrError::RegistryMissing { .. } => "Register a URL first with `msr register <url>`",
            MsrError::IoError(_) | MsrError::PersistError(_) => {
                "Check permissions on the msr data directory"
            }
            MsrError::ConfigValidationError { .. } | MsrError::InvalidConfigValueError { .. } => {
                "Check the config file and command line flags"
            }
            MsrError::MalformedLine { .. } => "Fix or remove the offending registry line",
            MsrError::HttpError(_) | MsrError::FetchTimeout { .. } => {
                "Check network connectivity or raise --timeout"
            }
            MsrError::SerializationError(_) => "Report this as a bug",
        }
    }
}

pub type Result<T> = std::result::Result<T, MsrError>;
