//! Webhook submission: send the canonical text, decode the enhanced text.
//!
//! ## Wire format
//!
//! ```text
//! POST <webhook>                       200 OK
//! Content-Type: application/json       {"enhancedText": "{\"improved_text\": \"…\"}"}
//! {"text": "…", "timestamp": "…Z"}
//! ```
//!
//! The reply nests a JSON document inside a JSON string. Decoding is two
//! separate steps, [`decode_envelope`] then [`decode_improved_text`], and a
//! failure in either is [`SubmissionError::MalformedResponse`].
//!
//! One request per call, no retries. The client keeps no state between
//! calls; at-most-one-in-flight is enforced by
//! [`crate::session::EnhancementSession`].

use crate::error::SubmissionError;
use chrono::{SecondsFormat, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of one submission: the enhanced text or why there is none.
pub type SubmissionOutcome = Result<String, SubmissionError>;

/// Sends canonical text to an enhancement service.
pub trait SubmissionClient {
    /// Submit `text` to `endpoint`, giving up after `timeout`.
    ///
    /// `text` must be non-blank; blank text is answered with
    /// [`SubmissionError::BlankText`] without any I/O.
    fn submit(
        &self,
        text: &str,
        endpoint: &Url,
        timeout: Duration,
    ) -> impl Future<Output = SubmissionOutcome>;
}

/// Request body.
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    text: &'a str,
    timestamp: String,
}

/// Outer reply: carries the inner document as a string.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "enhancedText")]
    enhanced_text: String,
}

/// Inner document.
#[derive(Debug, Deserialize)]
struct Improved {
    improved_text: String,
}

/// First decode step: extract the embedded JSON string from the reply body.
pub fn decode_envelope(body: &str) -> Result<String, SubmissionError> {
    serde_json::from_str::<Envelope>(body)
        .map(|e| e.enhanced_text)
        .map_err(|e| SubmissionError::MalformedResponse(format!("reply envelope: {e}")))
}

/// Second decode step: read `improved_text` from the embedded document.
pub fn decode_improved_text(embedded: &str) -> Result<String, SubmissionError> {
    serde_json::from_str::<Improved>(embedded)
        .map(|i| i.improved_text)
        .map_err(|e| SubmissionError::MalformedResponse(format!("embedded document: {e}")))
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-05-01T09:30:00.123Z`.
pub fn submission_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// [`SubmissionClient`] over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpSubmissionClient {
    client: reqwest::Client,
}

impl HttpSubmissionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing `reqwest::Client` (connection pool, proxies, TLS).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl SubmissionClient for HttpSubmissionClient {
    async fn submit(&self, text: &str, endpoint: &Url, timeout: Duration) -> SubmissionOutcome {
        if text.trim().is_empty() {
            return Err(SubmissionError::BlankText);
        }

        let body = SubmitRequest {
            text,
            timestamp: submission_timestamp(),
        };
        info!("Submitting {} chars to {}", text.chars().count(), endpoint);

        let start = Instant::now();
        let timed_out = |start: Instant| SubmissionError::Timeout {
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        let response = self
            .client
            .post(endpoint.clone())
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!("Submission timed out after {:?}", timeout);
                    timed_out(start)
                } else {
                    warn!("Submission failed: {}", e);
                    SubmissionError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        debug!("Webhook answered {} in {:?}", status, start.elapsed());
        if !status.is_success() {
            return Err(SubmissionError::ServiceError(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                timed_out(start)
            } else {
                SubmissionError::NetworkError(e.to_string())
            }
        })?;

        let embedded = decode_envelope(&body)?;
        decode_improved_text(&embedded)
    }
}
