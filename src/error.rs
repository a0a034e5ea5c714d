//! Error types for the letter-enhancer library.
//!
//! Three error types mirror the three places a letter can fail:
//!
//! * [`ExtractionError`]: a selected file could not be turned into text
//!   (too large, wrong format, unreadable, blank). Produced once per file
//!   by [`crate::pipeline::extract`] and returned as a value, never thrown.
//!
//! * [`SubmissionError`]: the round trip to the enhancement webhook
//!   failed (no response, timeout, non-2xx, malformed body).
//!
//! * [`EnhancerError`]: everything the orchestrator can report. Wraps the
//!   two above and adds the session-level refusals (`NoContent`,
//!   `AlreadyInProgress`, `MissingConfiguration`). Every variant has a
//!   user-facing title/message pair via [`EnhancerError::notification_text`].

use crate::pipeline::extract::format_file_size;
use std::path::PathBuf;
use thiserror::Error;

/// Why a file could not be turned into letter text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// File is bigger than the configured limit.
    #[error("File '{name}' is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    /// Extension is not one of the configured formats.
    #[error("Unsupported format '{format}' (supported: {})", supported.join(", "))]
    UnsupportedFormat {
        format: String,
        supported: Vec<String>,
    },

    /// Extraction worked but produced only whitespace.
    #[error("No text found in '{name}'")]
    EmptyContent { name: String },

    /// The format-specific reader failed.
    #[error("Failed to extract text from '{name}': {detail}")]
    ExtractionFailure { name: String, detail: String },
}

/// Why a submission to the enhancement webhook failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// No response was received (connection refused, DNS, reset).
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The service answered with a non-2xx status.
    #[error("Enhancement service returned HTTP {0}")]
    ServiceError(u16),

    /// The body was not the expected `{"enhancedText": "<json>"}` envelope.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Blank text was handed to the client; this is a caller bug.
    #[error("Refusing to submit blank text")]
    BlankText,
}

/// All errors surfaced at the orchestrator boundary.
#[derive(Debug, Error)]
pub enum EnhancerError {
    // ── Intake ────────────────────────────────────────────────────────────
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    // ── Submission ────────────────────────────────────────────────────────
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    // ── Session ───────────────────────────────────────────────────────────
    /// `analyze()` was called while a submission is in flight.
    #[error("An analysis is already in progress")]
    AlreadyInProgress,

    /// The canonical text is blank.
    #[error("No text to analyze")]
    NoContent,

    /// No webhook URL is configured.
    #[error("Webhook URL is not configured")]
    MissingConfiguration,

    // ── Config / output ───────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not write the enhanced letter to disk.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EnhancerError {
    /// Title and message shown to the user for this error.
    pub fn notification_text(&self) -> (String, String) {
        match self {
            EnhancerError::Extraction(e) => extraction_notification(e),
            EnhancerError::Submission(_) => (
                "Analysis Failed".into(),
                "Failed to enhance your letter. Please try again or check your connection.".into(),
            ),
            EnhancerError::AlreadyInProgress => (
                "Analysis In Progress".into(),
                "Please wait for the current analysis to finish.".into(),
            ),
            EnhancerError::NoContent => (
                "No Content".into(),
                "Please provide some text to analyze.".into(),
            ),
            EnhancerError::MissingConfiguration => (
                "Configuration Error".into(),
                "Webhook URL is not configured. Please check the configuration.".into(),
            ),
            EnhancerError::InvalidConfig(detail) => {
                ("Configuration Error".into(), detail.clone())
            }
            EnhancerError::OutputWriteFailed { path, .. } => (
                "Save Failed".into(),
                format!("Could not write {}", path.display()),
            ),
        }
    }
}

fn extraction_notification(e: &ExtractionError) -> (String, String) {
    match e {
        ExtractionError::FileTooLarge { limit, .. } => (
            "File Too Large".into(),
            format!("File size must be less than {}", format_file_size(*limit)),
        ),
        ExtractionError::UnsupportedFormat { supported, .. } => (
            "Unsupported Format".into(),
            format!("Please use one of these formats: {}", supported.join(", ")),
        ),
        ExtractionError::EmptyContent { .. } => (
            "No Text Found".into(),
            "No text found in the file. Please paste the text manually.".into(),
        ),
        ExtractionError::ExtractionFailure { .. } => (
            "Extraction Failed".into(),
            "Failed to extract text from the file. Please paste the text manually.".into(),
        ),
    }
}
