//! Error types for the AIRS MCP bridge

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No usable TLS trust strategy: {0}")]
    Tls(String),

    #[error("Not yet implemented: {operation}")]
    Unimplemented { operation: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse error classes surfaced to tool callers and used for exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Transport,
    Rejected,
    MalformedResponse,
    Unimplemented,
    Config,
    Tls,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Auth => "auth",
            ErrorKind::Transport => "transport",
            ErrorKind::Rejected => "rejected",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::Unimplemented => "unimplemented",
            ErrorKind::Config => "config",
            ErrorKind::Tls => "tls",
            ErrorKind::Internal => "internal",
        }
    }
}

impl Error {
    /// Classify this error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Api(ApiError::Unauthorized | ApiError::Forbidden) => ErrorKind::Auth,
            Error::Api(ApiError::Transport { .. }) => ErrorKind::Transport,
            Error::Api(ApiError::Rejected { .. }) => ErrorKind::Rejected,
            Error::Api(ApiError::MalformedResponse(_)) => ErrorKind::MalformedResponse,
            Error::Config(_) => ErrorKind::Config,
            Error::Tls(_) => ErrorKind::Tls,
            Error::Unimplemented { .. } => ErrorKind::Unimplemented,
            Error::Io(_) | Error::Json(_) => ErrorKind::Internal,
        }
    }

    /// Process exit code for the connectivity self-test.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Auth => 2,
            ErrorKind::Transport => 3,
            ErrorKind::MalformedResponse => 4,
            ErrorKind::Tls => 5,
            ErrorKind::Rejected => 6,
            _ => 1,
        }
    }
}

/// Caller-side shape and bound violations. Never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Missing required field '{field}' in scan_objects[{index}]")]
    MissingBatchField { field: &'static str, index: usize },

    #[error("Batch must contain between 1 and {max} scan objects, got {actual}")]
    BatchSize { actual: usize, max: usize },

    #[error("At most {max} scan_ids allowed per request, got {actual}")]
    TooManyScanIds { actual: usize, max: usize },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Upstream API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed. Check that PAN_AIRS_API_KEY is a valid AIRS API key.")]
    Unauthorized,

    #[error("Access denied. The API key is not permitted to use this profile or endpoint.")]
    Forbidden,

    #[error("Request failed after {attempts} attempt(s): {cause}")]
    Transport { attempts: u32, cause: String },

    #[error("Request rejected by the scanning service (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response from the scanning service: {0}")]
    MalformedResponse(String),
}

/// Configuration-related errors. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key not configured. Set PAN_AIRS_API_KEY or pass --api-key.")]
    MissingApiKey,

    #[error("AI security profile not configured. Set PAN_AIRS_PROFILE or pass --profile.")]
    MissingProfile,

    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
