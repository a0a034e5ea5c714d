//! Canonical text: one current string, whichever source it came from.
//!
//! Pasted text and extracted file text both land in a single [`Letter`].
//! Every write replaces the original text and its source tag, drops any
//! enhanced text, and wipes the *other* source's leftovers so a stale
//! paste can never ride along with a file submission (or vice versa).
//!
//! File extraction is asynchronous, so a slow file can finish after the
//! user has already picked another one. [`InputNormalizer::begin_selection`]
//! hands out a monotonically increasing [`SelectionToken`];
//! [`InputNormalizer::apply_extraction`] ignores results whose token is not
//! the latest.

use crate::error::ExtractionError;
use crate::letter::{Letter, LetterSource};
use crate::pipeline::extract::ExtractionResult;
use tracing::debug;

/// Identifies one file selection; later selections compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionToken(u64);

/// What happened to an extraction result handed to the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Text is now the canonical text.
    Applied,
    /// Extraction failed; canonical text was cleared.
    Rejected(ExtractionError),
    /// A newer selection exists; the result was discarded.
    Stale,
}

/// Merges pasted and extracted text into the canonical letter.
#[derive(Debug, Default)]
pub struct InputNormalizer {
    letter: Letter,
    file_name: Option<String>,
    latest_selection: u64,
}

impl InputNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the canonical text with pasted input.
    pub fn set_pasted_text(&mut self, text: impl Into<String>) {
        self.file_name = None;
        // Any extraction still running belongs to a file the user has left.
        self.latest_selection += 1;
        self.replace(text.into(), LetterSource::Paste);
    }

    /// Replace the canonical text with an extraction result.
    ///
    /// A failed extraction still switches the source to `File` and clears
    /// the text.
    pub fn set_extracted_text(&mut self, result: &ExtractionResult) {
        let text = result.as_deref().unwrap_or_default().to_string();
        self.replace(text, LetterSource::File);
    }

    /// Start a new file selection. Results for earlier tokens become stale.
    ///
    /// The canonical text is emptied right away: until the extraction
    /// lands there is nothing to submit.
    pub fn begin_selection(&mut self, file_name: impl Into<String>) -> SelectionToken {
        self.latest_selection += 1;
        self.file_name = Some(file_name.into());
        self.replace(String::new(), LetterSource::File);
        SelectionToken(self.latest_selection)
    }

    /// Whether `token` is still the most recent selection.
    pub fn is_current(&self, token: SelectionToken) -> bool {
        token.0 == self.latest_selection
    }

    /// Apply an extraction result if it belongs to the latest selection.
    pub fn apply_extraction(
        &mut self,
        token: SelectionToken,
        result: &ExtractionResult,
    ) -> ApplyOutcome {
        if !self.is_current(token) {
            debug!(
                "Discarding stale extraction (token {} < {})",
                token.0, self.latest_selection
            );
            return ApplyOutcome::Stale;
        }
        self.set_extracted_text(result);
        match result {
            Ok(_) => ApplyOutcome::Applied,
            Err(e) => ApplyOutcome::Rejected(e.clone()),
        }
    }

    /// Forget the selected file and its text.
    pub fn remove_file(&mut self) {
        self.latest_selection += 1;
        self.file_name = None;
        if self.letter.source == LetterSource::File {
            self.replace(String::new(), LetterSource::File);
        }
    }

    /// Record enhanced text for `snapshot`.
    ///
    /// Returns `false` (and stores nothing) when the canonical text has
    /// changed since `snapshot` was submitted.
    pub fn store_enhanced(&mut self, snapshot: &str, enhanced: impl Into<String>) -> bool {
        if self.letter.original_text != snapshot {
            debug!("Discarding enhancement for outdated text");
            return false;
        }
        self.letter.enhanced_text = Some(enhanced.into());
        true
    }

    /// The canonical text, whitespace preserved.
    pub fn current_text(&self) -> &str {
        &self.letter.original_text
    }

    /// Whether the canonical text is non-blank.
    pub fn has_content(&self) -> bool {
        self.letter.has_content()
    }

    /// Number of characters (not bytes) in the canonical text.
    pub fn character_count(&self) -> usize {
        self.letter.original_text.chars().count()
    }

    pub fn source(&self) -> LetterSource {
        self.letter.source
    }

    /// Name of the selected file, if the current source is a file.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn letter(&self) -> &Letter {
        &self.letter
    }

    fn replace(&mut self, text: String, source: LetterSource) {
        self.letter = Letter::new(text, source);
    }
}
