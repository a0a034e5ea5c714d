//! Configuration for the intake and submission pipeline.
//!
//! Every externally supplied knob lives in [`EnhancerConfig`], built via
//! [`EnhancerConfigBuilder`] or read from the environment with
//! [`EnhancerConfig::from_env`]. Nothing in the pipeline hard-codes an
//! endpoint, a size limit or a timeout; they all flow from here.

use crate::error::EnhancerError;
use reqwest::Url;
use std::time::Duration;

/// Environment variable holding the webhook URL.
pub const ENV_WEBHOOK_URL: &str = "LETTER_ENHANCER_WEBHOOK_URL";
/// Environment variable holding the maximum file size in bytes.
pub const ENV_MAX_FILE_SIZE: &str = "LETTER_ENHANCER_MAX_FILE_SIZE";
/// Environment variable holding the comma-separated format list.
pub const ENV_FORMATS: &str = "LETTER_ENHANCER_FORMATS";
/// Environment variable holding the request timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "LETTER_ENHANCER_TIMEOUT_MS";
/// Environment variable holding the notification display time in milliseconds.
pub const ENV_NOTIFICATION_MS: &str = "LETTER_ENHANCER_NOTIFICATION_MS";
/// Environment variable toggling the diff view (`true`/`false`).
pub const ENV_DIFF: &str = "LETTER_ENHANCER_DIFF";

/// Formats accepted when none are configured.
pub const DEFAULT_FORMATS: [&str; 4] = [".txt", ".md", ".pdf", ".docx"];

/// Configuration for an [`crate::session::EnhancementSession`].
///
/// # Example
/// ```rust
/// use letter_enhancer::EnhancerConfig;
///
/// let config = EnhancerConfig::builder()
///     .webhook_url("http://localhost:5678/webhook/motivation-letter")
///     .request_timeout_ms(10_000)
///     .build()
///     .unwrap();
/// assert!(config.webhook_url.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct EnhancerConfig {
    /// Enhancement webhook. `None` means unconfigured; `analyze()` then
    /// fails with [`EnhancerError::MissingConfiguration`] before any I/O.
    pub webhook_url: Option<Url>,

    /// Largest accepted upload in bytes. Default: 2 MiB.
    pub max_file_size: u64,

    /// Accepted extensions, lower-case with a leading dot.
    /// Default: `.txt`, `.md`, `.pdf`, `.docx`.
    pub supported_formats: Vec<String>,

    /// Upper bound on one submission round trip. Default: 30 000 ms.
    pub request_timeout_ms: u64,

    /// How long a notification stays visible. Default: 5 000 ms.
    pub notification_ms: u64,

    /// Render a diff between original and enhanced text. Default: true.
    pub show_diff: bool,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            max_file_size: 2 * 1024 * 1024,
            supported_formats: DEFAULT_FORMATS.iter().map(|s| s.to_string()).collect(),
            request_timeout_ms: 30_000,
            notification_ms: 5_000,
            show_diff: true,
        }
    }
}

impl EnhancerConfig {
    /// Create a new builder for `EnhancerConfig`.
    pub fn builder() -> EnhancerConfigBuilder {
        EnhancerConfigBuilder {
            config: Self::default(),
            webhook_url: None,
        }
    }

    /// Read the configuration from `LETTER_ENHANCER_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, EnhancerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EnhancerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(url) = lookup(ENV_WEBHOOK_URL) {
            builder = builder.webhook_url(url);
        }
        if let Some(v) = lookup(ENV_MAX_FILE_SIZE) {
            builder = builder.max_file_size(parse_number(ENV_MAX_FILE_SIZE, &v)?);
        }
        if let Some(v) = lookup(ENV_FORMATS) {
            builder = builder.supported_formats(v.split(','));
        }
        if let Some(v) = lookup(ENV_TIMEOUT_MS) {
            builder = builder.request_timeout_ms(parse_number(ENV_TIMEOUT_MS, &v)?);
        }
        if let Some(v) = lookup(ENV_NOTIFICATION_MS) {
            builder = builder.notification_ms(parse_number(ENV_NOTIFICATION_MS, &v)?);
        }
        if let Some(v) = lookup(ENV_DIFF) {
            let show = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(EnhancerError::InvalidConfig(format!(
                        "{ENV_DIFF} must be true or false, got '{other}'"
                    )))
                }
            };
            builder = builder.show_diff(show);
        }

        builder.build()
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Notification display time as a [`Duration`].
    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    /// Whether `format_hint` (e.g. `".PDF"`) is one of the supported formats.
    pub fn supports_format(&self, format_hint: &str) -> bool {
        let hint = normalise_format(format_hint);
        self.supported_formats.iter().any(|f| *f == hint)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, EnhancerError> {
    value.trim().parse().map_err(|_| {
        EnhancerError::InvalidConfig(format!("{key} must be a whole number, got '{value}'"))
    })
}

/// Lower-case a format and make sure it starts with a dot.
pub(crate) fn normalise_format(format: &str) -> String {
    let f = format.trim().to_lowercase();
    if f.is_empty() || f.starts_with('.') {
        f
    } else {
        format!(".{f}")
    }
}

/// Builder for [`EnhancerConfig`].
#[derive(Debug)]
pub struct EnhancerConfigBuilder {
    config: EnhancerConfig,
    webhook_url: Option<String>,
}

impl EnhancerConfigBuilder {
    /// Webhook URL; an empty string leaves the endpoint unconfigured.
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn supported_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.supported_formats = formats
            .into_iter()
            .map(|f| normalise_format(f.as_ref()))
            .filter(|f| !f.is_empty())
            .collect();
        self
    }

    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    pub fn notification_ms(mut self, ms: u64) -> Self {
        self.config.notification_ms = ms;
        self
    }

    pub fn show_diff(mut self, v: bool) -> Self {
        self.config.show_diff = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<EnhancerConfig, EnhancerError> {
        if let Some(raw) = self.webhook_url.take() {
            let raw = raw.trim();
            if !raw.is_empty() {
                let url = Url::parse(raw).map_err(|e| {
                    EnhancerError::InvalidConfig(format!("Invalid webhook URL '{raw}': {e}"))
                })?;
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(EnhancerError::InvalidConfig(format!(
                        "Webhook URL must be http or https, got '{}'",
                        url.scheme()
                    )));
                }
                self.config.webhook_url = Some(url);
            }
        }

        let c = &self.config;
        if c.max_file_size == 0 {
            return Err(EnhancerError::InvalidConfig(
                "Maximum file size must be ≥ 1 byte".into(),
            ));
        }
        if c.request_timeout_ms == 0 {
            return Err(EnhancerError::InvalidConfig(
                "Request timeout must be ≥ 1 ms".into(),
            ));
        }
        if c.supported_formats.is_empty() {
            return Err(EnhancerError::InvalidConfig(
                "At least one supported format is required".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let c = EnhancerConfig::default();
        assert_eq!(c.max_file_size, 2_097_152);
        assert_eq!(c.request_timeout_ms, 30_000);
        assert_eq!(c.notification_ms, 5_000);
        assert!(c.webhook_url.is_none());
        assert!(c.supports_format(".docx"));
        assert!(!c.supports_format(".rtf"));
    }

    #[test]
    fn formats_are_normalised() {
        let c = EnhancerConfig::builder()
            .supported_formats(["TXT", " .Md ", ""])
            .build()
            .unwrap();
        assert_eq!(c.supported_formats, vec![".txt", ".md"]);
        assert!(c.supports_format(".MD"));
        assert!(c.supports_format("txt"));
    }

    #[test]
    fn empty_url_means_unconfigured() {
        let c = EnhancerConfig::builder().webhook_url("  ").build().unwrap();
        assert!(c.webhook_url.is_none());
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(EnhancerConfig::builder().webhook_url("not a url").build().is_err());
        assert!(EnhancerConfig::builder()
            .webhook_url("ftp://example.com/hook")
            .build()
            .is_err());
    }

    #[test]
    fn rejects_zero_limits() {
        assert!(EnhancerConfig::builder().request_timeout_ms(0).build().is_err());
        assert!(EnhancerConfig::builder().max_file_size(0).build().is_err());
        let none: [&str; 0] = [];
        assert!(EnhancerConfig::builder().supported_formats(none).build().is_err());
    }

    #[test]
    fn reads_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_WEBHOOK_URL, "https://hooks.example.com/letter"),
            (ENV_MAX_FILE_SIZE, "1024"),
            (ENV_FORMATS, ".txt,.pdf"),
            (ENV_TIMEOUT_MS, "250"),
            (ENV_DIFF, "off"),
        ]
        .into_iter()
        .collect();
        let c = EnhancerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(
            c.webhook_url.as_ref().map(|u| u.as_str()),
            Some("https://hooks.example.com/letter")
        );
        assert_eq!(c.max_file_size, 1024);
        assert_eq!(c.supported_formats, vec![".txt", ".pdf"]);
        assert_eq!(c.request_timeout(), Duration::from_millis(250));
        assert_eq!(c.notification_ms, 5_000);
        assert!(!c.show_diff);
    }

    #[test]
    fn lookup_rejects_garbage_numbers() {
        let err = EnhancerConfig::from_lookup(|k| {
            (k == ENV_TIMEOUT_MS).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_MS));
    }
}
