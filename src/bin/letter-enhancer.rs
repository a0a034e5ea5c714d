//! CLI binary for letter-enhancer.
//!
//! A thin shim over the library crate: maps flags to `EnhancerConfig`,
//! feeds a file, `--text` or stdin into an `EnhancementSession`, and
//! renders the session's callbacks on the terminal.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use letter_enhancer::{
    ApplyOutcome, EnhancementSession, EnhancerConfig, HttpSubmissionClient, Notification,
    NotificationKind, Presenter,
};
use similar::{Algorithm, ChangeTag, TextDiff};
use std::cell::RefCell;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn badge(kind: NotificationKind) -> String {
    match kind {
        NotificationKind::Success => green("✔"),
        NotificationKind::Error => red("✘"),
        NotificationKind::Warning => yellow("⚠"),
        NotificationKind::Info => cyan("◆"),
    }
}

// ── Line diff ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum DiffLine {
    Same(String),
    Removed(String),
    Added(String),
}

/// Give up on a minimal diff after this long and fall back to a coarser one.
const DIFF_DEADLINE: Duration = Duration::from_millis(500);

/// Myers line diff. Lines are compared without their terminators, so a
/// missing final newline is not reported as a change.
fn line_diff(old: &str, new: &str) -> Vec<DiffLine> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(DIFF_DEADLINE)
        .diff_slices(&a, &b);
    let lines = diff
        .iter_all_changes()
        .map(|change| {
            let line = change.value().to_string();
            match change.tag() {
                ChangeTag::Equal => DiffLine::Same(line),
                ChangeTag::Delete => DiffLine::Removed(line),
                ChangeTag::Insert => DiffLine::Added(line),
            }
        })
        .collect();
    lines
}

fn character_label(count: usize) -> String {
    match count {
        1 => "1 character".to_string(),
        n => format!("{n} characters"),
    }
}

// ── Terminal presenter using indicatif ───────────────────────────────────────

/// Renders session callbacks: spinner while submitting, notifications and
/// diff on stderr, enhanced text on stdout.
struct TerminalPresenter {
    quiet: bool,
    /// Leave stdout to the JSON printer.
    json: bool,
    spinner: RefCell<Option<ProgressBar>>,
}

impl TerminalPresenter {
    fn new(quiet: bool, json: bool) -> Self {
        Self {
            quiet,
            json,
            spinner: RefCell::new(None),
        }
    }
}

impl Presenter for TerminalPresenter {
    fn render_original(&self, text: &str) {
        if !self.quiet && !text.is_empty() {
            eprintln!(
                "{} {}",
                cyan("◆"),
                dim(&character_label(text.chars().count()))
            );
        }
    }

    fn render_enhanced(&self, text: &str) {
        if self.json {
            return;
        }
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        // Broken pipe on stdout is not worth failing the run for.
        let _ = handle.write_all(text.as_bytes());
        if !text.ends_with('\n') {
            let _ = handle.write_all(b"\n");
        }
    }

    fn render_diff(&self, original: &str, enhanced: &str) {
        if self.quiet {
            return;
        }
        eprintln!("{}", bold("Changes:"));
        for line in line_diff(original, enhanced) {
            match line {
                DiffLine::Same(l) => eprintln!("  {}", dim(&l)),
                DiffLine::Removed(l) => eprintln!("{}", red(&format!("- {l}"))),
                DiffLine::Added(l) => eprintln!("{}", green(&format!("+ {l}"))),
            }
        }
    }

    fn file_status(&self, file_name: &str, kind: NotificationKind, message: &str) {
        if self.quiet && kind != NotificationKind::Error {
            return;
        }
        eprintln!("  {} {}  {}", badge(kind), bold(file_name), message);
    }

    fn notify(&self, n: &Notification) {
        if self.quiet && n.kind != NotificationKind::Error {
            return;
        }
        eprintln!("{} {}  {}", badge(n.kind), bold(&n.title), n.message);
    }

    fn set_busy(&self, busy: bool) {
        let mut slot = self.spinner.borrow_mut();
        if !busy {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
            return;
        }
        if self.quiet {
            return;
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Analyzing");
        bar.set_message("Enhancing your letter…");
        bar.enable_steady_tick(Duration::from_millis(80));
        *slot = Some(bar);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Enhance a file, print the result
  letter-enhancer letter.pdf

  # Pasted text
  letter-enhancer --text "Dear hiring team, ..."

  # From stdin, save the result
  cat letter.md | letter-enhancer -o enhanced.txt

  # JSON output (original, enhanced, source)
  letter-enhancer --json letter.docx > letter.json

SUPPORTED FORMATS (default):
  .txt .md    read as UTF-8
  .pdf        text of every page, via pdfium
  .docx       paragraph text

ENVIRONMENT VARIABLES:
  LETTER_ENHANCER_WEBHOOK_URL       Enhancement webhook (required)
  LETTER_ENHANCER_MAX_FILE_SIZE     Largest accepted file in bytes (2097152)
  LETTER_ENHANCER_FORMATS           Comma-separated formats (.txt,.md,.pdf,.docx)
  LETTER_ENHANCER_TIMEOUT_MS        Request timeout (30000)
  LETTER_ENHANCER_NOTIFICATION_MS   Notification display time (5000)
  PDFIUM_LIB_PATH                   Path to an existing libpdfium

WEBHOOK CONTRACT:
  POST {"text": "...", "timestamp": "2024-05-01T09:30:00.123Z"}
  200  {"enhancedText": "{\"improved_text\": \"...\"}"}
"#;

/// Enhance a motivation letter through a webhook.
#[derive(Parser, Debug)]
#[command(
    name = "letter-enhancer",
    version,
    about = "Enhance a motivation letter through a webhook",
    long_about = "Read a motivation letter from a file (.txt, .md, .pdf, .docx), from --text, \
or from stdin; send it to the configured enhancement webhook; print the improved letter and \
a line diff against the original.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Letter file (.txt, .md, .pdf, .docx). Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Letter text, as if pasted.
    #[arg(long, conflicts_with = "input")]
    text: Option<String>,

    /// Enhancement webhook URL.
    #[arg(long, env = "LETTER_ENHANCER_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// Largest accepted file in bytes.
    #[arg(long, env = "LETTER_ENHANCER_MAX_FILE_SIZE", default_value_t = 2 * 1024 * 1024)]
    max_file_size: u64,

    /// Accepted formats, comma-separated.
    #[arg(
        long,
        env = "LETTER_ENHANCER_FORMATS",
        value_delimiter = ',',
        default_value = ".txt,.md,.pdf,.docx"
    )]
    formats: Vec<String>,

    /// Request timeout in milliseconds.
    #[arg(long, env = "LETTER_ENHANCER_TIMEOUT_MS", default_value_t = 30_000)]
    timeout_ms: u64,

    /// How long notifications stay visible, in milliseconds.
    #[arg(long, env = "LETTER_ENHANCER_NOTIFICATION_MS", default_value_t = 5_000)]
    notification_ms: u64,

    /// Do not print the line diff.
    #[arg(long)]
    no_diff: bool,

    /// Also write the enhanced letter to this file.
    #[arg(short, long, env = "LETTER_ENHANCER_OUTPUT")]
    output: Option<PathBuf>,

    /// Print the final letter as JSON instead of plain text.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LETTER_ENHANCER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "LETTER_ENHANCER_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The presenter covers normal feedback; library INFO logs only on -v.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build session ────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let presenter = TerminalPresenter::new(cli.quiet, cli.json);
    let session = EnhancementSession::new(config, HttpSubmissionClient::new(), presenter);

    if !session.check_configuration() {
        anyhow::bail!("No webhook URL: pass --webhook-url or set LETTER_ENHANCER_WEBHOOK_URL");
    }

    // ── Intake ───────────────────────────────────────────────────────────
    if let Some(ref path) = cli.input {
        if let ApplyOutcome::Rejected(e) = session.on_file_path(path).await {
            return Err(e).with_context(|| format!("Could not use {}", path.display()));
        }
    } else if let Some(ref text) = cli.text {
        session.on_paste(text.as_str());
    } else {
        session.on_paste(read_stdin(cli.quiet)?);
    }

    // ── Analyze ──────────────────────────────────────────────────────────
    let letter = session.analyze().await.context("Analysis failed")?;

    if let Some(ref output_path) = cli.output {
        session
            .save_enhanced(output_path)
            .await
            .context("Failed to save enhanced letter")?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&letter).context("Failed to serialise letter")?;
        println!("{json}");
    }

    Ok(())
}

/// Map CLI args to `EnhancerConfig`.
fn build_config(cli: &Cli) -> Result<EnhancerConfig> {
    let mut builder = EnhancerConfig::builder()
        .max_file_size(cli.max_file_size)
        .supported_formats(&cli.formats)
        .request_timeout_ms(cli.timeout_ms)
        .notification_ms(cli.notification_ms)
        .show_diff(!cli.no_diff);

    if let Some(ref url) = cli.webhook_url {
        builder = builder.webhook_url(url.as_str());
    }

    builder.build().context("Invalid configuration")
}

fn read_stdin(quiet: bool) -> Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() && !quiet {
        eprintln!("{}", dim("Paste your letter, then press Ctrl-D:"));
    }
    let mut text = String::new();
    stdin
        .read_to_string(&mut text)
        .context("Failed to read letter from stdin")?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same(s: &str) -> DiffLine {
        DiffLine::Same(s.into())
    }
    fn removed(s: &str) -> DiffLine {
        DiffLine::Removed(s.into())
    }
    fn added(s: &str) -> DiffLine {
        DiffLine::Added(s.into())
    }

    #[test]
    fn diff_marks_changed_lines() {
        let diff = line_diff("Dear team\nI like code\nBye", "Dear team\nI love code\nBye");
        assert_eq!(
            diff,
            vec![
                same("Dear team"),
                removed("I like code"),
                added("I love code"),
                same("Bye"),
            ]
        );
    }

    #[test]
    fn diff_handles_appends_and_empties() {
        assert_eq!(line_diff("", "a"), vec![added("a")]);
        assert_eq!(line_diff("a", ""), vec![removed("a")]);
        assert_eq!(line_diff("a", "a\nb"), vec![same("a"), added("b")]);
    }

    #[test]
    fn diff_of_large_disjoint_texts_is_fast() {
        let old: String = (0..6000).map(|i| format!("old line {i}\n")).collect();
        let new: String = (0..6000).map(|i| format!("new line {i}\n")).collect();
        let start = std::time::Instant::now();
        let diff = line_diff(&old, &new);
        assert_eq!(diff.len(), 12_000);
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "took {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn character_label_pluralises() {
        assert_eq!(character_label(0), "0 characters");
        assert_eq!(character_label(1), "1 character");
        assert_eq!(character_label(2), "2 characters");
    }

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
