// src/error.rs
//! Application error types with structured error handling.
//!
//! Every failure keeps the server's numeric code where one exists, so the
//! user-facing edge can translate it into guidance without losing it.

use crate::constants::{DEFAULT_PERMISSION_DENIED_CODES, DEFAULT_STALE_CREDENTIAL_CODES};
use thiserror::Error;

/// What a non-zero application code means to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The bearer credential expired mid-session; refresh and retry once.
    StaleCredential,
    /// The caller may not read this resource with the current access path.
    PermissionDenied,
    /// Anything else; surfaced to the caller as-is.
    Other,
}

/// The numeric codes that drive retry and fallback decisions.
///
/// The service documents these only by observed behavior, so deployments
/// can override them through `ClientConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCodePolicy {
    pub stale_credential: Vec<i64>,
    pub permission_denied: Vec<i64>,
}

impl Default for ErrorCodePolicy {
    fn default() -> Self {
        Self {
            stale_credential: DEFAULT_STALE_CREDENTIAL_CODES.to_vec(),
            permission_denied: DEFAULT_PERMISSION_DENIED_CODES.to_vec(),
        }
    }
}

impl ErrorCodePolicy {
    /// Classify an application code into the typed vocabulary.
    pub fn classify(&self, code: i64) -> ErrorClass {
        if self.stale_credential.contains(&code) {
            ErrorClass::StaleCredential
        } else if self.permission_denied.contains(&code) {
            ErrorClass::PermissionDenied
        } else {
            ErrorClass::Other
        }
    }

    /// Parses a comma-separated list of codes, e.g. `"99991401,99991677"`.
    pub fn parse_codes(raw: &str) -> Result<Vec<i64>, AppError> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>().map_err(|_| {
                    AppError::MissingConfiguration(format!("'{}' is not a numeric error code", part))
                })
            })
            .collect()
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),

    #[error("Network failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Feishu API returned an error ({code}): {message}")]
    Api { code: i64, message: String },

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Invalid Feishu URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("No Feishu credentials configured")]
    NoCredentialsConfigured { instructions: String },

    #[error("Authentication failed ({code}): {message}")]
    AuthenticationFailed { code: i64, message: String },

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Protocol(format!("unexpected response shape: {}", err))
    }
}

impl AppError {
    /// The server's application code, when the failure carries one.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            AppError::Api { code, .. } | AppError::AuthenticationFailed { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }

    /// Process exit code used by the command-line binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Validation(_) => 2,
            AppError::Transport(_) => 3,
            AppError::Api { .. } => 4,
            AppError::Protocol(_) => 5,
            AppError::InvalidUrl(_) => 6,
            AppError::UnsupportedOperation(_) => 7,
            AppError::NoCredentialsConfigured { .. } => 8,
            AppError::AuthenticationFailed { .. } => 9,
            AppError::MissingConfiguration(_) => 10,
            AppError::Io(_) => 11,
        }
    }

    /// Human-readable guidance for the terminal.
    pub fn user_guidance(&self) -> String {
        match self {
            AppError::NoCredentialsConfigured { instructions } => instructions.clone(),
            AppError::AuthenticationFailed { code, message } => format!(
                "Authentication failed ({}): {}\n\nCheck FEISHU_APP_ID / FEISHU_APP_SECRET or the \
                 \"feishu\" section of your config file.",
                code, message
            ),
            AppError::InvalidUrl(url) => format!(
                "Unrecognized Feishu URL: {}\nExpected https://<tenant>.feishu.cn/wiki/<token> or \
                 https://<tenant>.feishu.cn/docx/<id> (larksuite.com works too).",
                url
            ),
            other => other.to_string(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_classification() {
        let policy = ErrorCodePolicy::default();
        assert_eq!(policy.classify(99991401), ErrorClass::StaleCredential);
        assert_eq!(policy.classify(99991677), ErrorClass::StaleCredential);
        assert_eq!(policy.classify(99991404), ErrorClass::PermissionDenied);
        assert_eq!(policy.classify(99991663), ErrorClass::PermissionDenied);
        assert_eq!(policy.classify(1770002), ErrorClass::Other);
    }

    #[test]
    fn test_overridden_policy_classification() {
        let policy = ErrorCodePolicy {
            stale_credential: vec![42],
            permission_denied: vec![],
        };
        assert_eq!(policy.classify(42), ErrorClass::StaleCredential);
        assert_eq!(policy.classify(99991401), ErrorClass::Other);
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(
            ErrorCodePolicy::parse_codes(" 1, 2,,3 ").unwrap(),
            vec![1, 2, 3]
        );
        assert!(ErrorCodePolicy::parse_codes("1,abc").is_err());
    }

    #[test]
    fn test_error_exit_codes_and_api_code() {
        let err = AppError::Api {
            code: 1770002,
            message: "not found".into(),
        };
        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.api_code(), Some(1770002));
        assert_eq!(AppError::Protocol("loop".into()).api_code(), None);
    }

    #[test]
    fn test_guidance_keeps_the_code() {
        let err = AppError::AuthenticationFailed {
            code: 10003,
            message: "invalid app_secret".into(),
        };
        let guidance = err.user_guidance();
        assert!(guidance.contains("10003"));
        assert!(guidance.contains("invalid app_secret"));
    }
}
