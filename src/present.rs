//! Presentation collaborator: how the session talks to whatever draws it.
//!
//! The session never prints or draws anything itself. It calls into a
//! [`Presenter`] at well-defined points (text changed, busy started/ended,
//! result ready, something to tell the user). A terminal, a GUI, or a test
//! recorder can implement it; all methods default to no-ops, so
//! implementations only override what they render.
//!
//! # Example
//!
//! ```rust
//! use letter_enhancer::{Notification, Presenter};
//! use std::cell::RefCell;
//!
//! #[derive(Default)]
//! struct Log(RefCell<Vec<String>>);
//!
//! impl Presenter for Log {
//!     fn notify(&self, n: &Notification) {
//!         self.0.borrow_mut().push(format!("{}: {}", n.title, n.message));
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// How long the message should stay visible.
    pub display_for: Duration,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        display_for: Duration,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            display_for,
        }
    }
}

/// Called by [`crate::session::EnhancementSession`] as state changes.
pub trait Presenter {
    /// The canonical (original) text changed or is being shown with a result.
    fn render_original(&self, text: &str) {
        let _ = text;
    }

    /// A valid enhanced text for the current original is available.
    fn render_enhanced(&self, text: &str) {
        let _ = text;
    }

    /// Any previously shown enhanced text no longer matches the original.
    fn clear_enhanced(&self) {}

    /// Show the difference between original and enhanced text.
    fn render_diff(&self, original: &str, enhanced: &str) {
        let _ = (original, enhanced);
    }

    /// Per-file status line (processing, extracted, no text found, …).
    fn file_status(&self, file_name: &str, kind: NotificationKind, message: &str) {
        let _ = (file_name, kind, message);
    }

    /// Show a transient message.
    fn notify(&self, notification: &Notification) {
        let _ = notification;
    }

    /// A submission started (`true`) or finished (`false`).
    fn set_busy(&self, busy: bool) {
        let _ = busy;
    }
}

/// Presenter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

impl<P: Presenter + ?Sized> Presenter for &P {
    fn render_original(&self, text: &str) {
        (**self).render_original(text)
    }
    fn render_enhanced(&self, text: &str) {
        (**self).render_enhanced(text)
    }
    fn clear_enhanced(&self) {
        (**self).clear_enhanced()
    }
    fn render_diff(&self, original: &str, enhanced: &str) {
        (**self).render_diff(original, enhanced)
    }
    fn file_status(&self, file_name: &str, kind: NotificationKind, message: &str) {
        (**self).file_status(file_name, kind, message)
    }
    fn notify(&self, notification: &Notification) {
        (**self).notify(notification)
    }
    fn set_busy(&self, busy: bool) {
        (**self).set_busy(busy)
    }
}
