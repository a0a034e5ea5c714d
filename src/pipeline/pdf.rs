//! PDF page text via pdfium.
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and blocks; callers run [`PdfiumPageReader`] inside
//! `spawn_blocking` (see [`crate::pipeline::extract`]).
//!
//! The library is bound lazily on every call, in this order:
//!
//! 1. `PDFIUM_LIB_PATH`: explicit path to `libpdfium.{so,dylib}` / `pdfium.dll`
//! 2. the platform library name in the current directory
//! 3. the system library search path
//!
//! A missing library is an ordinary [`ReaderError`], so the caller can ask
//! the user to paste the text instead.

use crate::pipeline::extract::{PageTextReader, ReaderError};
use pdfium_render::prelude::*;
use tracing::debug;

/// Environment variable pointing at an existing pdfium library.
pub const ENV_PDFIUM_LIB_PATH: &str = "PDFIUM_LIB_PATH";

/// [`PageTextReader`] backed by pdfium.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumPageReader;

impl PdfiumPageReader {
    pub fn new() -> Self {
        Self
    }

    fn bind() -> Result<Pdfium, ReaderError> {
        let bindings = match std::env::var(ENV_PDFIUM_LIB_PATH) {
            Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
            _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| {
            ReaderError(format!(
                "pdfium library unavailable ({e:?}); set {ENV_PDFIUM_LIB_PATH}"
            ))
        })?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageTextReader for PdfiumPageReader {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ReaderError> {
        let pdfium = Self::bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ReaderError(format!("PDF could not be opened: {e:?}")))?;

        let pages = document.pages();
        debug!("PDF loaded: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| ReaderError(format!("page {}: {e:?}", idx + 1)))?;
            texts.push(text.all());
        }
        Ok(texts)
    }
}
