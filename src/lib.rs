//! # letter-enhancer
//!
//! Take a motivation letter (pasted, or from a `.txt`, `.md`, `.pdf` or
//! `.docx` file), send it to an enhancement webhook, and show the improved
//! version next to the original.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file / paste
//!  │
//!  ├─ 1. Extract    size + format checks, PDF via pdfium, DOCX via zip + XML
//!  ├─ 2. Normalize  one canonical text; stale file results dropped
//!  ├─ 3. Submit     POST {text, timestamp} → {"enhancedText": "<json>"}
//!  └─ 4. Present    original, enhanced, diff and notifications
//! ```
//!
//! [`EnhancementSession`] drives the steps and allows at most one
//! submission in flight. It reports through a [`Presenter`], so the same
//! session runs behind a terminal, a GUI or a test recorder.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use letter_enhancer::{EnhancementSession, EnhancerConfig, HttpSubmissionClient, NullPresenter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads LETTER_ENHANCER_WEBHOOK_URL and friends.
//!     let config = EnhancerConfig::from_env()?;
//!     let session = EnhancementSession::new(config, HttpSubmissionClient::new(), NullPresenter);
//!     session.on_paste("Dear hiring team, ...");
//!     let letter = session.analyze().await?;
//!     println!("{}", letter.enhanced_text.unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `letter-enhancer` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! letter-enhancer = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod letter;
pub mod pipeline;
pub mod present;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EnhancerConfig, EnhancerConfigBuilder};
pub use error::{EnhancerError, ExtractionError, SubmissionError};
pub use letter::{Letter, LetterSource, SessionState};
pub use pipeline::extract::{
    format_file_size, DocumentFormat, ExtractionResult, FileBlob, FileTextExtractor,
};
pub use pipeline::normalize::{ApplyOutcome, InputNormalizer, SelectionToken};
pub use pipeline::submit::{HttpSubmissionClient, SubmissionClient, SubmissionOutcome};
pub use present::{Notification, NotificationKind, NullPresenter, Presenter};
pub use session::EnhancementSession;
