//! The orchestrator: input commands in, one submission at a time, results out.
//!
//! [`EnhancementSession`] owns the letter and the [`SessionState`] and is the
//! only place errors are turned into user notifications. It is driven by
//! explicit command handlers:
//!
//! | Handler | Effect |
//! |---------|--------|
//! | [`on_paste`](EnhancementSession::on_paste) | canonical text ← pasted text |
//! | [`on_file_selected`](EnhancementSession::on_file_selected) | extract, then canonical text ← file text (latest selection wins) |
//! | [`on_remove_file`](EnhancementSession::on_remove_file) | drop file text |
//! | [`analyze`](EnhancementSession::analyze) | submit canonical text |
//!
//! ## Scheduling
//!
//! The session is single-threaded and cooperative: handlers take `&self`,
//! state lives in `Cell`/`RefCell`, and no borrow is held across an
//! `.await`. Two `analyze()` futures polled together on one thread produce
//! exactly one request; the second sees `Submitting` and is refused with
//! [`EnhancerError::AlreadyInProgress`].
//!
//! ## Stale results
//!
//! A submission is never cancelled. If the text changes while it is in
//! flight, its outcome still moves the session to `Done`/`Failed`, but the
//! enhanced text is stored only if it was produced for the *current*
//! original text; otherwise it is dropped without a notification.

use crate::config::EnhancerConfig;
use crate::error::{EnhancerError, ExtractionError, SubmissionError};
use crate::letter::{Letter, SessionState};
use crate::pipeline::extract::{
    file_display_name, format_hint, DocumentFormat, ExtractionResult, FileBlob, FileTextExtractor,
};
use crate::pipeline::normalize::{ApplyOutcome, InputNormalizer};
use crate::pipeline::submit::SubmissionClient;
use crate::present::{Notification, NotificationKind, Presenter};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::path::Path;
use tracing::{debug, info, warn};

/// Coordinates intake, submission and presentation for one letter.
pub struct EnhancementSession<C, P> {
    config: EnhancerConfig,
    extractor: FileTextExtractor,
    client: C,
    presenter: P,
    input: RefCell<InputNormalizer>,
    state: Cell<SessionState>,
    snapshot: RefCell<Option<String>>,
    last_failure: RefCell<Option<SubmissionError>>,
}

impl<C, P> EnhancementSession<C, P>
where
    C: SubmissionClient,
    P: Presenter,
{
    /// Session with the default file extractor for `config`.
    pub fn new(config: EnhancerConfig, client: C, presenter: P) -> Self {
        let extractor = FileTextExtractor::new(&config);
        Self {
            config,
            extractor,
            client,
            presenter,
            input: RefCell::new(InputNormalizer::new()),
            state: Cell::new(SessionState::Idle),
            snapshot: RefCell::new(None),
            last_failure: RefCell::new(None),
        }
    }

    /// Replace the file extractor (custom PDF/DOCX readers).
    pub fn with_extractor(mut self, extractor: FileTextExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    // ── Command handlers ─────────────────────────────────────────────────

    /// Warn the user up front when no webhook is configured.
    ///
    /// Returns `true` when the session is ready to submit.
    pub fn check_configuration(&self) -> bool {
        if self.config.webhook_url.is_some() {
            return true;
        }
        self.notify(
            NotificationKind::Warning,
            "Configuration Required",
            "Please configure the enhancement webhook URL.",
        );
        false
    }

    /// Pasted or typed text replaces the canonical text.
    pub fn on_paste(&self, text: impl Into<String>) {
        self.input.borrow_mut().set_pasted_text(text);
        self.input_changed();
    }

    /// Extract `file` and, if it is still the latest selection, make its
    /// text canonical.
    pub async fn on_file_selected(&self, file: FileBlob) -> ApplyOutcome {
        let hint = file.format_hint();
        info!("File selected: {} ({} bytes)", file.name, file.size());
        self.select_file(&file.name, &hint, self.extractor.extract(&file, &hint))
            .await
    }

    /// Read `path` from disk and handle it like a selected file.
    ///
    /// Oversized files are rejected before their contents are read; read
    /// errors are reported as [`ExtractionError::ExtractionFailure`].
    pub async fn on_file_path(&self, path: impl AsRef<Path>) -> ApplyOutcome {
        let path = path.as_ref();
        let name = file_display_name(path);
        let hint = format_hint(&name);
        info!("File selected: {}", path.display());
        self.select_file(&name, &hint, async {
            let file = self.extractor.load(path).await?;
            self.extractor.extract(&file, &hint).await
        })
        .await
    }

    /// Forget the selected file and its text.
    pub fn on_remove_file(&self) {
        self.input.borrow_mut().remove_file();
        self.input_changed();
    }

    /// Submit the canonical text.
    ///
    /// Refused without I/O when a submission is already in flight, when no
    /// webhook is configured, or when the text is blank. Every error is
    /// also sent to the presenter as a notification.
    ///
    /// Returns the letter as it stands after the outcome was applied; its
    /// `enhanced_text` is `None` if the text changed while in flight.
    pub async fn analyze(&self) -> Result<Letter, EnhancerError> {
        if !self.state.get().can_analyze() {
            return Err(self.report(EnhancerError::AlreadyInProgress));
        }
        let Some(endpoint) = self.config.webhook_url.clone() else {
            return Err(self.report(EnhancerError::MissingConfiguration));
        };
        if !self.input.borrow().has_content() {
            return Err(self.report(EnhancerError::NoContent));
        }
        let snapshot = self.current_text();

        self.state.set(SessionState::Submitting);
        *self.snapshot.borrow_mut() = Some(snapshot.clone());
        *self.last_failure.borrow_mut() = None;
        self.presenter.set_busy(true);

        let outcome = self
            .client
            .submit(&snapshot, &endpoint, self.config.request_timeout())
            .await;

        self.presenter.set_busy(false);
        match outcome {
            Ok(enhanced) => {
                self.state.set(SessionState::Done);
                let stored = self
                    .input
                    .borrow_mut()
                    .store_enhanced(&snapshot, enhanced.as_str());
                if stored {
                    self.show_result(&snapshot, &enhanced);
                    self.notify(
                        NotificationKind::Success,
                        "Analysis Complete",
                        "Your motivation letter has been enhanced successfully!",
                    );
                } else {
                    debug!("Text changed during submission; enhanced text dropped");
                }
                Ok(self.letter())
            }
            Err(e) => {
                self.state.set(SessionState::Failed);
                *self.last_failure.borrow_mut() = Some(e.clone());
                Err(self.report(e.into()))
            }
        }
    }

    /// Write the enhanced text to `path` (temp file + rename).
    pub async fn save_enhanced(&self, path: impl AsRef<Path>) -> Result<(), EnhancerError> {
        let path = path.as_ref();
        let Some(text) = self.displayable_enhanced_text() else {
            return Err(self.report(EnhancerError::NoContent));
        };

        let write_failed = |source: std::io::Error| EnhancerError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.report(write_failed(e)))?;
        }
        let tmp_path = temp_path_for(path);
        let written = match tokio::fs::write(&tmp_path, text.as_bytes()).await {
            Ok(()) => tokio::fs::rename(&tmp_path, path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(self.report(write_failed(e)));
        }

        info!("Enhanced letter written to {}", path.display());
        self.notify(
            NotificationKind::Success,
            "Saved!",
            format!("Enhanced text saved to {}", path.display()),
        );
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Copy of the current letter.
    pub fn letter(&self) -> Letter {
        self.input.borrow().letter().clone()
    }

    /// The canonical text.
    pub fn current_text(&self) -> String {
        self.input.borrow().current_text().to_string()
    }

    pub fn character_count(&self) -> usize {
        self.input.borrow().character_count()
    }

    /// Text sent by the most recent `analyze()`.
    pub fn submitted_snapshot(&self) -> Option<String> {
        self.snapshot.borrow().clone()
    }

    /// Why the most recent submission failed, if it did.
    pub fn last_failure(&self) -> Option<SubmissionError> {
        self.last_failure.borrow().clone()
    }

    /// Enhanced text, only if it was produced for the current original text.
    pub fn displayable_enhanced_text(&self) -> Option<String> {
        let input = self.input.borrow();
        let snapshot = self.snapshot.borrow();
        match (&input.letter().enhanced_text, snapshot.as_deref()) {
            (Some(text), Some(sent)) if sent == input.current_text() => Some(text.clone()),
            _ => None,
        }
    }

    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    async fn select_file(
        &self,
        name: &str,
        hint: &str,
        extraction: impl Future<Output = ExtractionResult>,
    ) -> ApplyOutcome {
        let token = self.input.borrow_mut().begin_selection(name);
        self.input_changed();
        self.presenter
            .file_status(name, NotificationKind::Warning, "Processing file...");

        let result = extraction.await;

        let outcome = self.input.borrow_mut().apply_extraction(token, &result);
        let format = DocumentFormat::from_hint(hint);
        match &outcome {
            ApplyOutcome::Stale => return outcome,
            ApplyOutcome::Applied => {
                let message = format
                    .map(DocumentFormat::success_message)
                    .unwrap_or_else(|| "Text extracted successfully".to_string());
                self.presenter
                    .file_status(name, NotificationKind::Success, &message);
            }
            ApplyOutcome::Rejected(e) => self.report_extraction(name, format, e),
        }
        self.input_changed();
        outcome
    }

    fn input_changed(&self) {
        if self.state.get() != SessionState::Submitting {
            self.state.set(SessionState::Idle);
        }
        let text = self.current_text();
        self.presenter.clear_enhanced();
        self.presenter.render_original(&text);
    }

    fn show_result(&self, original: &str, enhanced: &str) {
        self.presenter.render_original(original);
        self.presenter.render_enhanced(enhanced);
        if self.config.show_diff {
            self.presenter.render_diff(original, enhanced);
        }
    }

    fn report_extraction(&self, name: &str, format: Option<DocumentFormat>, e: &ExtractionError) {
        warn!("Extraction of '{}' failed: {}", name, e);
        match (e, format) {
            (ExtractionError::EmptyContent { .. }, Some(f)) => {
                self.presenter
                    .file_status(name, NotificationKind::Warning, &f.empty_message())
            }
            (ExtractionError::ExtractionFailure { .. }, Some(f)) => {
                self.presenter
                    .file_status(name, NotificationKind::Error, &f.failure_message())
            }
            _ => {
                let (title, message) = EnhancerError::from(e.clone()).notification_text();
                self.presenter
                    .file_status(name, NotificationKind::Error, &message);
                self.notify(NotificationKind::Error, title, message);
            }
        }
    }

    fn report(&self, e: EnhancerError) -> EnhancerError {
        warn!("{}", e);
        let kind = match e {
            EnhancerError::AlreadyInProgress => NotificationKind::Warning,
            _ => NotificationKind::Error,
        };
        let (title, message) = e.notification_text();
        self.notify(kind, title, message);
        e
    }

    fn notify(&self, kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) {
        self.presenter.notify(&Notification::new(
            kind,
            title,
            message,
            self.config.notification_duration(),
        ));
    }
}

/// Sibling temp file for an atomic write: `letter.txt` → `letter.txt.tmp`.
fn temp_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
