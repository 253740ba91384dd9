//! Provider-agnostic error taxonomy shared by every summarization backend.

use std::{error::Error as StdError, fmt, io};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    RateLimited,
    Unauthorized,
    Unavailable,
    ConnectionFailure,
    QuotaExhausted,
    ContextTooLong,
    /// Backend rejected the request itself (400 class, low credit balance)
    InvalidRequest,
    CombinedFailure,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "rate-limited",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::ConnectionFailure => "connection-failure",
            ErrorKind::QuotaExhausted => "quota-exhausted",
            ErrorKind::ContextTooLong => "context-too-long",
            ErrorKind::InvalidRequest => "invalid-request",
            ErrorKind::CombinedFailure => "combined-failure",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend failure after it has been classified into [`ErrorKind`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Only an invalid request (which covers an exhausted credit balance) on the
    /// primary backend hands the transcript over to the secondary one.
    pub fn triggers_fallback(&self) -> bool {
        self.kind == ErrorKind::InvalidRequest
    }

    pub(crate) fn with_context(self, context: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{context}: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SummarizeError {
    #[error("{0}")]
    Provider(#[from] ProviderError),
    #[error("Both summarization services failed. Primary: {}. Secondary: {}", .primary.message, .secondary.message)]
    Combined {
        primary: ProviderError,
        secondary: ProviderError,
    },
}

impl SummarizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SummarizeError::Provider(e) => e.kind,
            SummarizeError::Combined { .. } => ErrorKind::CombinedFailure,
        }
    }
}

/// Substring checks on backend messages shared by the adapters' classifiers
pub(crate) fn classify_message(message: &str) -> Option<ErrorKind> {
    if message.contains("insufficient_quota") {
        Some(ErrorKind::QuotaExhausted)
    } else if message.contains("context_length_exceeded") {
        Some(ErrorKind::ContextTooLong)
    } else {
        None
    }
}

/// Transport-level failures are classified identically for every backend.
/// A body that breaks off mid-read counts as a connection failure.
pub(crate) fn classify_transport(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        return ErrorKind::ConnectionFailure;
    }
    if has_io_disconnect(err) {
        return ErrorKind::ConnectionFailure;
    }
    ErrorKind::Unknown
}

fn has_io_disconnect(err: &(dyn StdError + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if is_disconnect(io_err.kind()) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

fn is_disconnect(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&ErrorKind::ContextTooLong).unwrap();
        assert_eq!(json, "\"context-too-long\"");
        assert_eq!(ErrorKind::ConnectionFailure.to_string(), "connection-failure");
    }

    #[test]
    fn test_only_invalid_request_triggers_fallback() {
        assert!(ProviderError::new(ErrorKind::InvalidRequest, "low balance").triggers_fallback());

        for kind in [
            ErrorKind::RateLimited,
            ErrorKind::Unauthorized,
            ErrorKind::Unavailable,
            ErrorKind::ConnectionFailure,
            ErrorKind::QuotaExhausted,
            ErrorKind::ContextTooLong,
            ErrorKind::Unknown,
        ] {
            assert!(
                !ProviderError::new(kind, "nope").triggers_fallback(),
                "{kind} should not trigger fallback"
            );
        }
    }

    #[test]
    fn test_combined_error_embeds_both_messages() {
        let err = SummarizeError::Combined {
            primary: ProviderError::new(ErrorKind::InvalidRequest, "credit balance too low"),
            secondary: ProviderError::new(ErrorKind::RateLimited, "slow down"),
        };

        assert_eq!(err.kind(), ErrorKind::CombinedFailure);
        let message = err.to_string();
        assert!(message.contains("credit balance too low"));
        assert!(message.contains("slow down"));
    }

    #[test]
    fn test_disconnect_io_kinds() {
        for kind in [
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::UnexpectedEof,
            io::ErrorKind::TimedOut,
        ] {
            assert!(is_disconnect(kind), "{kind:?} should be a disconnect");
        }
        assert!(!is_disconnect(io::ErrorKind::InvalidData));
        assert!(!is_disconnect(io::ErrorKind::PermissionDenied));
    }

    #[test]
    fn test_message_classification() {
        assert_eq!(
            classify_message("You exceeded your current quota (insufficient_quota)"),
            Some(ErrorKind::QuotaExhausted)
        );
        assert_eq!(
            classify_message("code: context_length_exceeded"),
            Some(ErrorKind::ContextTooLong)
        );
        assert_eq!(classify_message("something else"), None);
    }
}
