//! Pipeline stages between a user's input and an enhanced letter.
//!
//! Each submodule does one step and is testable on its own. None of them
//! talks to the user; that is [`crate::session`]'s job.
//!
//! ## Data Flow
//!
//! ```text
//! file ──▶ extract ──┐
//!          (pdf/docx) ├──▶ normalize ──▶ submit ──▶ enhanced text
//! paste ─────────────┘    (one text)     (webhook)
//! ```
//!
//! 1. [`extract`]: validate size and format, decode a file to text;
//!    binary formats run in `spawn_blocking`
//! 2. [`pdf`] / [`docx`]: the default page and raw-text readers
//! 3. [`normalize`]: keep exactly one canonical text and drop stale
//!    extraction results
//! 4. [`submit`]: the only stage with network I/O; one POST, no retry

pub mod docx;
pub mod extract;
pub mod normalize;
pub mod pdf;
pub mod submit;
