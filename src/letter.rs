//! In-memory data model: the letter being worked on and the session state.
//!
//! Nothing here is persisted; a [`Letter`] lives exactly as long as the
//! session that owns it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the canonical text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterSource {
    /// Typed or pasted directly.
    #[default]
    Paste,
    /// Extracted from an uploaded file.
    File,
}

/// The letter under edit.
///
/// `enhanced_text` is `Some` only after a successful submission of the
/// *current* `original_text`; any change to the original clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    pub original_text: String,
    pub enhanced_text: Option<String>,
    pub source: LetterSource,
}

impl Letter {
    /// A fresh letter with no enhancement.
    pub fn new(original_text: impl Into<String>, source: LetterSource) -> Self {
        Self {
            original_text: original_text.into(),
            enhanced_text: None,
            source,
        }
    }

    /// True when the original text has something other than whitespace.
    pub fn has_content(&self) -> bool {
        !self.original_text.trim().is_empty()
    }
}

/// Lifecycle of an [`crate::session::EnhancementSession`].
///
/// ```text
/// Idle ──▶ Submitting ──▶ Done ──┐
///  ▲            │                │
///  │            └────▶ Failed ───┤
///  └──────── (input changed) ◀───┘
/// ```
///
/// `analyze()` may start from `Idle`, `Done` or `Failed`, never from
/// `Submitting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Submitting,
    Done,
    Failed,
}

impl SessionState {
    /// Whether a new submission may start from this state.
    pub fn can_analyze(self) -> bool {
        !matches!(self, SessionState::Submitting)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Submitting => "submitting",
            SessionState::Done => "done",
            SessionState::Failed => "failed",
        };
        f.write_str(s)
    }
}
