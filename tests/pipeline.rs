//! Integration tests for letter-enhancer.
//!
//! Every test runs against a throwaway HTTP stub on `127.0.0.1:0`, so no
//! network access or real webhook is needed. PDF tests use an in-process
//! page reader; pdfium itself is not required.
//!
//! Run with:
//!   cargo test --test pipeline

use letter_enhancer::pipeline::docx::DocxTextReader;
use letter_enhancer::pipeline::extract::{PageTextReader, ReaderError};
use letter_enhancer::{
    ApplyOutcome, EnhancementSession, EnhancerConfig, EnhancerError, FileBlob, FileTextExtractor,
    HttpSubmissionClient, LetterSource, NullPresenter, SessionState, SubmissionClient,
    SubmissionError,
};
use reqwest::Url;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ── HTTP stub ────────────────────────────────────────────────────────────────

const GOOD_REPLY: &str = r#"{"enhancedText": "{\"improved_text\": \"E\"}"}"#;

/// A one-route webhook that answers every request with a fixed reply.
struct Stub {
    url: Url,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl Stub {
    async fn start(status: u16, body: &'static str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let bodies = Arc::new(Mutex::new(Vec::new()));

        let (h, b) = (Arc::clone(&hits), Arc::clone(&bodies));
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let (h, b) = (Arc::clone(&h), Arc::clone(&b));
                tokio::spawn(async move {
                    let request = read_request(&mut sock).await;
                    h.fetch_add(1, Ordering::SeqCst);
                    b.lock().unwrap().push(request);
                    tokio::time::sleep(delay).await;
                    let response = format!(
                        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\n\
                         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = sock.write_all(response.as_bytes()).await;
                    let _ = sock.shutdown().await;
                });
            }
        });

        Self {
            url: Url::parse(&format!("http://{addr}/webhook/motivation-letter")).unwrap(),
            hits,
            bodies,
        }
    }

    async fn ok() -> Self {
        Self::start(200, GOOD_REPLY, Duration::ZERO).await
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn last_body(&self) -> serde_json::Value {
        let bodies = self.bodies.lock().unwrap();
        serde_json::from_str(bodies.last().expect("no request recorded")).unwrap()
    }

    fn config(&self) -> EnhancerConfig {
        EnhancerConfig::builder()
            .webhook_url(self.url.as_str())
            .request_timeout_ms(2_000)
            .build()
            .unwrap()
    }
}

/// Read one HTTP/1.1 request and return its body.
async fn read_request(sock: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = sock.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return String::new();
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
        let len = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let start = end + 4;
        if buf.len() >= start + len {
            return String::from_utf8_lossy(&buf[start..start + len]).into_owned();
        }
    }
}

fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

// ── Submission client ────────────────────────────────────────────────────────

#[tokio::test]
async fn round_trip_decodes_nested_reply() {
    let stub = Stub::ok().await;
    let outcome = HttpSubmissionClient::new()
        .submit("Dear team", &stub.url, Duration::from_secs(2))
        .await;
    assert_eq!(outcome, Ok("E".to_string()));
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn request_carries_text_and_timestamp() {
    let stub = Stub::ok().await;
    HttpSubmissionClient::new()
        .submit("  Dear team,\n\nHello  ", &stub.url, Duration::from_secs(2))
        .await
        .unwrap();

    let body = stub.last_body();
    assert_eq!(body["text"], "  Dear team,\n\nHello  ");
    let ts = body["timestamp"].as_str().unwrap();
    assert!(ts.ends_with('Z'), "got: {ts}");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
}

#[tokio::test]
async fn missing_inner_field_is_malformed() {
    let stub = Stub::start(200, r#"{"enhancedText": "{}"}"#, Duration::ZERO).await;
    let outcome = HttpSubmissionClient::new()
        .submit("x", &stub.url, Duration::from_secs(2))
        .await;
    assert!(
        matches!(outcome, Err(SubmissionError::MalformedResponse(_))),
        "got: {outcome:?}"
    );
}

#[tokio::test]
async fn non_success_status_is_service_error() {
    let stub = Stub::start(500, r#"{"error": "boom"}"#, Duration::ZERO).await;
    let outcome = HttpSubmissionClient::new()
        .submit("x", &stub.url, Duration::from_secs(2))
        .await;
    assert_eq!(outcome, Err(SubmissionError::ServiceError(500)));
}

#[tokio::test]
async fn slow_service_times_out() {
    let stub = Stub::start(200, GOOD_REPLY, Duration::from_secs(3)).await;
    let outcome = HttpSubmissionClient::new()
        .submit("x", &stub.url, Duration::from_millis(200))
        .await;
    assert!(
        matches!(outcome, Err(SubmissionError::Timeout { .. })),
        "got: {outcome:?}"
    );
}

// ── Session over HTTP ────────────────────────────────────────────────────────

#[tokio::test]
async fn pasted_letter_is_enhanced() {
    let stub = Stub::ok().await;
    let session = EnhancementSession::new(stub.config(), HttpSubmissionClient::new(), NullPresenter);

    session.on_paste("Dear team");
    let letter = session.analyze().await.unwrap();

    assert_eq!(letter.original_text, "Dear team");
    assert_eq!(letter.enhanced_text.as_deref(), Some("E"));
    assert_eq!(letter.source, LetterSource::Paste);
    assert_eq!(session.state(), SessionState::Done);
}

#[tokio::test]
async fn double_analyze_sends_one_request() {
    let stub = Stub::start(200, GOOD_REPLY, Duration::from_millis(100)).await;
    let session = EnhancementSession::new(stub.config(), HttpSubmissionClient::new(), NullPresenter);
    session.on_paste("Dear team");

    let (first, second) = tokio::join!(session.analyze(), session.analyze());

    assert!(first.is_ok());
    assert!(matches!(second, Err(EnhancerError::AlreadyInProgress)));
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn unconfigured_session_sends_nothing() {
    let stub = Stub::ok().await;
    let session = EnhancementSession::new(
        EnhancerConfig::default(),
        HttpSubmissionClient::new(),
        NullPresenter,
    );
    session.on_paste("Dear team");

    assert!(matches!(
        session.analyze().await,
        Err(EnhancerError::MissingConfiguration)
    ));
    assert_eq!(stub.hits(), 0);
}

#[tokio::test]
async fn service_failure_keeps_original() {
    let stub = Stub::start(503, "", Duration::ZERO).await;
    let session = EnhancementSession::new(stub.config(), HttpSubmissionClient::new(), NullPresenter);
    session.on_paste("Dear team");

    let err = session.analyze().await.unwrap_err();
    assert!(matches!(
        err,
        EnhancerError::Submission(SubmissionError::ServiceError(503))
    ));
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(session.current_text(), "Dear team");
    assert!(session.letter().enhanced_text.is_none());
}

#[tokio::test]
async fn text_file_from_disk() {
    let stub = Stub::ok().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("letter.txt");
    std::fs::write(&path, "Dear hiring team,\nI am applying.\n").unwrap();

    let session = EnhancementSession::new(stub.config(), HttpSubmissionClient::new(), NullPresenter);
    let outcome = session.on_file_path(&path).await;
    assert_eq!(outcome, ApplyOutcome::Applied);
    assert_eq!(session.letter().source, LetterSource::File);

    session.analyze().await.unwrap();
    assert_eq!(stub.last_body()["text"], "Dear hiring team,\nI am applying.\n");

    let out = dir.path().join("enhanced.txt");
    session.save_enhanced(&out).await.unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "E");
}

#[tokio::test]
async fn docx_paragraphs_are_submitted() {
    let stub = Stub::ok().await;
    let session = EnhancementSession::new(stub.config(), HttpSubmissionClient::new(), NullPresenter);

    let outcome = session
        .on_file_selected(FileBlob::new("cv.docx", docx_bytes(&["Hello", "world"])))
        .await;
    assert_eq!(outcome, ApplyOutcome::Applied);
    assert_eq!(session.current_text(), "Hello\n\nworld\n\n");

    session.analyze().await.unwrap();
    assert_eq!(stub.last_body()["text"], "Hello\n\nworld\n\n");
}

#[tokio::test]
async fn oversized_file_is_rejected_without_reading() {
    let stub = Stub::ok().await;
    let config = EnhancerConfig::builder()
        .webhook_url(stub.url.as_str())
        .max_file_size(8)
        .build()
        .unwrap();
    let session = EnhancementSession::new(config, HttpSubmissionClient::new(), NullPresenter);
    session.on_paste("kept?");

    let outcome = session
        .on_file_selected(FileBlob::new("big.txt", "0123456789"))
        .await;
    assert!(matches!(outcome, ApplyOutcome::Rejected(_)));
    assert_eq!(session.current_text(), "");
    assert!(matches!(
        session.analyze().await,
        Err(EnhancerError::NoContent)
    ));
    assert_eq!(stub.hits(), 0);
}

#[tokio::test]
async fn oversized_file_on_disk_is_rejected() {
    let stub = Stub::ok().await;
    let config = EnhancerConfig::builder()
        .webhook_url(stub.url.as_str())
        .max_file_size(1024)
        .build()
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.txt");
    std::fs::File::create(&path)
        .unwrap()
        .set_len(64 * 1024 * 1024)
        .unwrap();

    let session = EnhancementSession::new(config, HttpSubmissionClient::new(), NullPresenter);
    let outcome = session.on_file_path(&path).await;
    assert!(matches!(outcome, ApplyOutcome::Rejected(_)));
    assert_eq!(session.letter().source, LetterSource::File);
    assert_eq!(session.current_text(), "");
    assert_eq!(stub.hits(), 0);
}

// ── Selection ordering ───────────────────────────────────────────────────────

/// Page reader that blocks long enough for another selection to overtake it.
struct SlowPages;

impl PageTextReader for SlowPages {
    fn extract_pages(&self, _bytes: &[u8]) -> Result<Vec<String>, ReaderError> {
        std::thread::sleep(Duration::from_millis(300));
        Ok(vec!["slow pdf".to_string()])
    }
}

#[tokio::test]
async fn later_selection_wins_over_slow_extraction() {
    let config = EnhancerConfig::default();
    let extractor =
        FileTextExtractor::with_readers(&config, Arc::new(SlowPages), Arc::new(DocxTextReader));
    let session = EnhancementSession::new(config, HttpSubmissionClient::new(), NullPresenter)
        .with_extractor(extractor);

    let (slow, fast) = tokio::join!(
        session.on_file_selected(FileBlob::new("old.pdf", "%PDF-1.7")),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            session
                .on_file_selected(FileBlob::new("new.txt", "fast text"))
                .await
        }
    );

    assert_eq!(fast, ApplyOutcome::Applied);
    assert_eq!(slow, ApplyOutcome::Stale);
    assert_eq!(session.current_text(), "fast text");
}
