//! File intake: turn a selected file into plain letter text.
//!
//! [`FileTextExtractor::extract`] validates the blob against the configured
//! size limit and format list, then routes it to a decoder:
//!
//! | Format | Decoder |
//! |--------|---------|
//! | `.txt`, `.md` | UTF-8 decode, in this module |
//! | `.pdf` | [`PageTextReader`] (pdfium by default), pages joined in order |
//! | `.docx` | [`RawTextReader`] (zip + XML by default) |
//!
//! Binary decoders run on `spawn_blocking`; pdfium in particular must not be
//! driven from an async worker thread. Every outcome is an
//! [`ExtractionResult`] value and nothing here mutates shared state.

use crate::config::{normalise_format, EnhancerConfig};
use crate::error::ExtractionError;
use crate::pipeline::docx::DocxTextReader;
use crate::pipeline::pdf::PdfiumPageReader;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Result of extracting text from one file.
pub type ExtractionResult = Result<String, ExtractionError>;

/// Failure reported by a format-specific reader.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ReaderError(pub String);

/// Reads the text of every page of a paged document, in page order.
pub trait PageTextReader: Send + Sync {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ReaderError>;
}

/// Reads the raw (unformatted) text of a markup document.
pub trait RawTextReader: Send + Sync {
    fn extract_raw_text(&self, bytes: &[u8]) -> Result<String, ReaderError>;
}

/// A selected file: its name and its full contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-cased extension with a leading dot (`"letter.PDF"` → `".pdf"`).
    ///
    /// A name without a dot yields the whole name, which no configured
    /// format will match.
    pub fn format_hint(&self) -> String {
        format_hint(&self.name)
    }
}

/// Display name of a file on disk: its last path component.
pub fn file_display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Lower-cased extension of `name` with a leading dot.
pub fn format_hint(name: &str) -> String {
    let ext = name.rsplit('.').next().unwrap_or_default();
    format!(".{}", ext.to_lowercase())
}

/// The decoders this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Map a format hint such as `".md"` to a decoder.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match normalise_format(hint).as_str() {
            ".txt" | ".md" | ".markdown" => Some(DocumentFormat::PlainText),
            ".pdf" => Some(DocumentFormat::Pdf),
            ".docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "Text",
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
        }
    }

    /// Status line shown after a successful extraction.
    pub fn success_message(self) -> String {
        match self {
            DocumentFormat::PlainText => "Text extracted successfully".to_string(),
            other => format!("{} text extracted successfully", other.label()),
        }
    }

    /// Status line shown when the document holds no text.
    pub fn empty_message(self) -> String {
        format!(
            "No text found in {}. Please paste the text manually.",
            self.label()
        )
    }

    /// Status line shown when the decoder failed.
    pub fn failure_message(self) -> String {
        match self {
            DocumentFormat::PlainText => "Failed to read file".to_string(),
            other => format!(
                "Failed to extract {} text. Please paste the text manually.",
                other.label()
            ),
        }
    }
}

/// Validates and decodes selected files.
#[derive(Clone)]
pub struct FileTextExtractor {
    config: EnhancerConfig,
    pages: Arc<dyn PageTextReader>,
    raw: Arc<dyn RawTextReader>,
}

impl std::fmt::Debug for FileTextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTextExtractor")
            .field("max_file_size", &self.config.max_file_size)
            .field("supported_formats", &self.config.supported_formats)
            .field("pages", &"<dyn PageTextReader>")
            .field("raw", &"<dyn RawTextReader>")
            .finish()
    }
}

impl FileTextExtractor {
    /// Extractor using pdfium for PDF and the built-in DOCX reader.
    pub fn new(config: &EnhancerConfig) -> Self {
        Self::with_readers(
            config,
            Arc::new(PdfiumPageReader::new()),
            Arc::new(DocxTextReader),
        )
    }

    /// Extractor with caller-supplied format readers.
    pub fn with_readers(
        config: &EnhancerConfig,
        pages: Arc<dyn PageTextReader>,
        raw: Arc<dyn RawTextReader>,
    ) -> Self {
        Self {
            config: config.clone(),
            pages,
            raw,
        }
    }

    /// Read `path` from disk, never holding more than `max_file_size + 1`
    /// bytes.
    ///
    /// Regular files are rejected from their metadata before any read.
    /// Anything else (pipes, devices) is read through a capped reader, so
    /// `size` in the resulting `FileTooLarge` is a lower bound.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<FileBlob, ExtractionError> {
        let path = path.as_ref();
        let name = file_display_name(path);
        let limit = self.config.max_file_size;
        let read_failed = |e: std::io::Error| ExtractionError::ExtractionFailure {
            name: name.clone(),
            detail: e.to_string(),
        };
        let too_large = |size: u64| ExtractionError::FileTooLarge {
            name: name.clone(),
            size,
            limit,
        };

        let meta = tokio::fs::metadata(path).await.map_err(read_failed)?;
        if meta.is_file() && meta.len() > limit {
            return Err(too_large(meta.len()));
        }

        let file = tokio::fs::File::open(path).await.map_err(read_failed)?;
        let mut bytes = Vec::new();
        file.take(limit.saturating_add(1))
            .read_to_end(&mut bytes)
            .await
            .map_err(read_failed)?;
        if bytes.len() as u64 > limit {
            return Err(too_large(bytes.len() as u64));
        }
        debug!("Loaded '{}' ({} bytes)", name, bytes.len());
        Ok(FileBlob { name, bytes })
    }

    /// Extract the text of `file`, treating it as `format_hint`.
    pub async fn extract(&self, file: &FileBlob, format_hint: &str) -> ExtractionResult {
        let format = self.validate(file, format_hint)?;
        info!(
            "Extracting {} text from '{}' ({})",
            format.label(),
            file.name,
            format_file_size(file.size())
        );

        let text = match format {
            DocumentFormat::PlainText => decode_plain_text(file)?,
            DocumentFormat::Pdf => self.extract_pdf(file).await?,
            DocumentFormat::Docx => self.extract_docx(file).await?,
        };

        if text.trim().is_empty() {
            debug!("'{}' produced only whitespace", file.name);
            return Err(ExtractionError::EmptyContent {
                name: file.name.clone(),
            });
        }

        debug!("'{}' → {} chars", file.name, text.chars().count());
        Ok(text)
    }

    /// Size and format checks. Never looks at the content.
    pub fn validate(
        &self,
        file: &FileBlob,
        format_hint: &str,
    ) -> Result<DocumentFormat, ExtractionError> {
        if file.size() > self.config.max_file_size {
            return Err(ExtractionError::FileTooLarge {
                name: file.name.clone(),
                size: file.size(),
                limit: self.config.max_file_size,
            });
        }

        let hint = normalise_format(format_hint);
        let unsupported = || ExtractionError::UnsupportedFormat {
            format: hint.clone(),
            supported: self.config.supported_formats.clone(),
        };
        if !self.config.supports_format(&hint) {
            return Err(unsupported());
        }
        DocumentFormat::from_hint(&hint).ok_or_else(unsupported)
    }

    async fn extract_pdf(&self, file: &FileBlob) -> ExtractionResult {
        if !file.bytes.starts_with(b"%PDF") {
            return Err(ExtractionError::ExtractionFailure {
                name: file.name.clone(),
                detail: "not a PDF (missing %PDF header)".into(),
            });
        }

        let reader = Arc::clone(&self.pages);
        let bytes = file.bytes.clone();
        let pages = tokio::task::spawn_blocking(move || reader.extract_pages(&bytes))
            .await
            .map_err(|e| failure(file, format!("PDF task panicked: {e}")))?
            .map_err(|e| failure(file, e.0))?;

        debug!("'{}': {} pages", file.name, pages.len());
        let mut text = String::new();
        for page in &pages {
            text.push_str(page);
            text.push('\n');
        }
        Ok(text)
    }

    async fn extract_docx(&self, file: &FileBlob) -> ExtractionResult {
        let reader = Arc::clone(&self.raw);
        let bytes = file.bytes.clone();
        tokio::task::spawn_blocking(move || reader.extract_raw_text(&bytes))
            .await
            .map_err(|e| failure(file, format!("DOCX task panicked: {e}")))?
            .map_err(|e| failure(file, e.0))
    }
}

fn failure(file: &FileBlob, detail: String) -> ExtractionError {
    ExtractionError::ExtractionFailure {
        name: file.name.clone(),
        detail,
    }
}

/// UTF-8 decode, dropping a leading byte-order mark.
fn decode_plain_text(file: &FileBlob) -> ExtractionResult {
    let text = std::str::from_utf8(&file.bytes)
        .map_err(|e| failure(file, format!("not valid UTF-8: {e}")))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
