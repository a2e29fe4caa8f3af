//! Error types for the Mellivora domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Mellivora operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Classification errors ---
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    // --- Reply generation errors ---
    #[error("Reply error: {0}")]
    Reply(#[from] ReplyError),

    // --- Report delivery errors ---
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the scam-classification collaborator.
///
/// The engine never surfaces these to callers: any classifier failure
/// degrades to `is_scam = false, confidence = 0.0` (fail safe — never
/// engage on ambiguous signal).
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    #[error("Classification request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed classifier output: {0}")]
    MalformedOutput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Classifier not configured: {0}")]
    NotConfigured(String),
}

/// Failures of the reply-generation collaborator.
///
/// The engine substitutes a fixed fallback reply on any of these;
/// extraction and conclusion evaluation still run.
#[derive(Debug, Clone, Error)]
pub enum ReplyError {
    #[error("Reply generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model returned empty output")]
    EmptyOutput,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Reply generator not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Clone, Error)]
pub enum ReportError {
    #[error("Report delivery failed for session {session_id}: {reason}")]
    DeliveryFailed { session_id: String, reason: String },

    #[error("Collector rejected report for session {session_id} (status: {status_code})")]
    Rejected {
        session_id: String,
        status_code: u16,
    },

    #[error("Collector not configured: {0}")]
    NotConfigured(String),
}
