// src/error.rs
//! Application error types with structured error handling.
//!
//! Every failure the client can report is one `AppError` variant. The
//! variants fall into a few families that callers treat differently:
//! decoding errors and configuration mismatches are fatal and never
//! retried, transport errors have already exhausted the transport's own
//! retry budget (and feed the pagination iterator's page-size halving),
//! and rollup-state errors describe remote state rather than a fault.

use crate::api::transport::TransportError;
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
///
/// Parsed from the `code` field of an error body, so callers can match on
/// what the API reported instead of comparing strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded
    RateLimited,
    /// The requested object does not exist or is not shared with the integration
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with the current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound)
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Unknown {base} discriminator '{value}'")]
    UnknownDiscriminator { base: &'static str, value: String },

    #[error("Missing '{field}' discriminator for {base}: {payload}")]
    MissingDiscriminator {
        base: &'static str,
        field: &'static str,
        payload: String,
    },

    #[error("Failed to construct {type_name}: {reason}\nPayload: {payload}")]
    InvalidPayload {
        type_name: &'static str,
        reason: String,
        payload: String,
    },

    #[error("Expected a {expected} object, got '{found}'")]
    UnexpectedObject { expected: &'static str, found: String },

    #[error("Property is configured as '{expected}' and cannot accept {supplied}")]
    ConfigurationMismatch { expected: String, supplied: String },

    #[error("Writing '{property_type}' properties is not supported")]
    UnsupportedWrite { property_type: String },

    #[error("No property named or identified by '{0}'")]
    UnknownProperty(String),

    #[error("Request to {url} failed with status {status} ({code}): {message}")]
    RequestFailed {
        url: String,
        status: u16,
        code: NotionErrorCode,
        message: String,
        body: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Rollup '{property_id}' is still being computed by Notion")]
    RollupIncomplete { property_id: String },

    #[error("Rollup '{property_id}' uses an aggregation the API does not expose")]
    RollupUnsupported { property_id: String },

    #[error("Unknown rollup variant '{variant}'")]
    UnknownRollupVariant { variant: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Whether this failure survived the transport's own retry budget, which
    /// is the only failure the pagination iterator answers by shrinking pages.
    pub fn is_exhausted_transient(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }

    /// Builds a construction error with a bounded preview of the payload.
    pub(crate) fn invalid_payload(
        type_name: &'static str,
        reason: impl fmt::Display,
        payload: &serde_json::Value,
    ) -> Self {
        AppError::InvalidPayload {
            type_name,
            reason: reason.to_string(),
            payload: preview(&payload.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Truncates `text` to the preview length on a char boundary.
pub(crate) fn preview(text: &str) -> String {
    if text.len() <= ERROR_BODY_PREVIEW_LENGTH {
        return text.to_string();
    }
    let mut end = ERROR_BODY_PREVIEW_LENGTH;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_round_trip() {
        for code in ["rate_limited", "object_not_found", "validation_error"] {
            assert_eq!(NotionErrorCode::from_api_response(code).to_string(), code);
        }
        assert_eq!(
            NotionErrorCode::from_api_response("brand_new"),
            NotionErrorCode::Unknown("brand_new".to_string())
        );
        assert!(NotionErrorCode::ObjectNotFound.is_not_found());
        assert_eq!(NotionErrorCode::from_http_status(502).to_string(), "http_502");
    }

    #[test]
    fn test_only_transport_errors_are_exhausted_transients() {
        let exhausted = AppError::Transport(TransportError::RetriesExhausted {
            url: "https://api.notion.com/v1/pages".to_string(),
            attempts: 4,
            status: Some(503),
        });
        assert!(exhausted.is_exhausted_transient());

        let rejected = AppError::RequestFailed {
            url: "https://api.notion.com/v1/pages".to_string(),
            status: 400,
            code: NotionErrorCode::ValidationFailed,
            message: "bad".to_string(),
            body: String::new(),
        };
        assert!(!rejected.is_exhausted_transient());
    }

    #[test]
    fn test_mismatch_message_names_expected_type() {
        let err = AppError::ConfigurationMismatch {
            expected: "status".to_string(),
            supplied: "number 42".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("status"));
        assert!(message.contains("42"));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(ERROR_BODY_PREVIEW_LENGTH);
        let short = preview(&long);
        assert!(short.ends_with("..."));
        assert!(short.len() <= ERROR_BODY_PREVIEW_LENGTH + 3);
    }
}
