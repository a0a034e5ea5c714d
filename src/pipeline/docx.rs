//! DOCX raw text.
//!
//! A `.docx` file is a zip archive; the body lives in `word/document.xml`.
//! Only text content is kept: every `<w:p>` becomes one paragraph followed by
//! a blank line, `<w:tab/>` becomes `\t` and `<w:br/>` / `<w:cr/>` a newline.
//! Styles, numbering and headers/footers are ignored.

use crate::pipeline::extract::{RawTextReader, ReaderError};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// [`RawTextReader`] for Office Open XML word-processing documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxTextReader;

impl RawTextReader for DocxTextReader {
    fn extract_raw_text(&self, bytes: &[u8]) -> Result<String, ReaderError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ReaderError(format!("not a DOCX archive: {e}")))?;

        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| ReaderError(format!("missing {DOCUMENT_PART}: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| ReaderError(format!("failed to read {DOCUMENT_PART}: {e}")))?;

        document_text(&xml)
    }
}

/// Collect paragraph text from a `document.xml` body.
fn document_text(xml: &str) -> Result<String, ReaderError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut paragraph = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => paragraph.clear(),
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                // <w:tab/> also appears in <w:tabs> stop definitions; only runs count.
                b"tab" if in_run => paragraph.push('\t'),
                b"br" | b"cr" if in_run => paragraph.push('\n'),
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ReaderError(format!("bad text in {DOCUMENT_PART}: {e}")))?;
                paragraph.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => in_run = false,
                b"p" => {
                    out.push_str(&paragraph);
                    out.push_str("\n\n");
                    paragraph.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ReaderError(format!(
                    "malformed {DOCUMENT_PART} at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(out)
}
