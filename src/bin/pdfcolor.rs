//! CLI binary for edgequake-pdfcolor.
//!
//! A thin shim over the library crate: maps CLI flags to `ScanConfig`, draws
//! the scan's events on the terminal and prints the tally.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfcolor::{inspect, ColorScanner, EventSink, ScanConfig, ScanEventSink};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn magenta(s: &str) -> String {
    format!("\x1b[35m{s}\x1b[0m")
}

/// Decorate a library log line for the terminal.
fn decorate(line: &str) -> String {
    if line.ends_with(": Color") {
        format!("  {} {}", magenta("●"), line)
    } else if line.ends_with(": Black & White") {
        format!("  {} {}", green("✓"), line)
    } else {
        format!("{} {}", bold("◆"), bold(line))
    }
}

/// Render a failed run's message for stderr.
fn error_line(message: &str) -> String {
    format!("{} {}", red("✗"), red(message))
}

// ── Terminal sinks ───────────────────────────────────────────────────────────

/// Live percentage bar with the per-page log printed above it.
struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}%  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Scanning");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ScanEventSink for BarSink {
    fn on_progress(&self, percent: u8) {
        self.bar.set_position(percent as u64);
    }

    fn on_log(&self, line: &str) {
        self.bar.println(decorate(line));
    }

    fn on_result(&self, _bw_count: usize, _color_count: usize) {
        self.bar.finish_and_clear();
    }

    fn on_error(&self, message: &str) {
        self.bar.abandon();
        eprintln!("{}", error_line(message));
    }
}

/// Log lines on stderr, no bar.
struct PlainSink;

impl ScanEventSink for PlainSink {
    fn on_log(&self, line: &str) {
        eprintln!("{}", decorate(line));
    }

    fn on_error(&self, message: &str) {
        eprintln!("{}", error_line(message));
    }
}

/// Errors only; used with `--quiet` and `--json`.
struct ErrorSink;

impl ScanEventSink for ErrorSink {
    fn on_error(&self, message: &str) {
        eprintln!("{}", error_line(message));
    }
}

// ── CLI ──────────────────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Count black & white and color pages
  pdfcolor document.pdf

  # Machine-readable report with per-page results
  pdfcolor --json document.pdf > report.json

  # Encrypted document
  pdfcolor --password secret statement.pdf

  # Page count and metadata only
  pdfcolor --inspect-only document.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (otherwise ./ then system paths)
  RUST_LOG                Override the log filter (e.g. edgequake_pdfcolor=debug)
"#;

/// Count black-and-white and color pages in a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdfcolor",
    version,
    about = "Count black-and-white and color pages in a PDF",
    long_about = "Render every page of a PDF and classify it as black-and-white (every pixel \
has equal red, green and blue channels) or color. Useful for estimating print costs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: String,

    /// Rendering DPI for classification (36–600).
    #[arg(long, env = "PDFCOLOR_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(36..=600))]
    dpi: u32,

    /// Cap on rendered width/height in pixels (100–20000).
    #[arg(long, env = "PDFCOLOR_MAX_PIXELS", default_value_t = 5000,
          value_parser = clap::value_parser!(u32).range(100..=20_000))]
    max_pixels: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFCOLOR_PASSWORD")]
    password: Option<String>,

    /// Output the structured report as JSON on stdout.
    #[arg(long, env = "PDFCOLOR_JSON")]
    json: bool,

    /// Disable the progress bar; log lines still go to stderr.
    #[arg(long, env = "PDFCOLOR_NO_PROGRESS")]
    no_progress: bool,

    /// Print page count and metadata only, no classification.
    #[arg(long, env = "PDFCOLOR_INSPECT_ONLY")]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFCOLOR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the result and errors.
    #[arg(short, long, env = "PDFCOLOR_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The bar and the log lines already say what is happening; library INFO
    // logs would only interleave with them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = info.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = info.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", info.page_count);
            println!("PDF Version:  {}", info.pdf_version);
            if let Some(ref p) = info.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = info.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Run scan ─────────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let scanner = ColorScanner::new(config).context("Invalid configuration")?;

    let sink: EventSink = if show_progress {
        BarSink::new() as EventSink
    } else if cli.quiet || cli.json {
        Arc::new(ErrorSink)
    } else {
        Arc::new(PlainSink)
    };

    let handle = scanner
        .start(&cli.input, sink)
        .context("Failed to start scan")?;
    let report = match handle.wait().await {
        Ok(report) => report,
        // The sink has already printed the error.
        Err(_) => std::process::exit(1),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }

    println!("Black & White pages: {}", bold(&report.bw_count.to_string()));
    println!("Color pages:         {}", bold(&report.color_count.to_string()));

    let color_pages = report.color_pages();
    if !color_pages.is_empty() && !cli.quiet {
        let list: Vec<String> = color_pages.iter().map(|p| p.to_string()).collect();
        println!("{}", dim(&format!("Color page numbers: {}", list.join(","))));
    }
    if !cli.quiet {
        eprintln!(
            "{} {} pages in {}ms",
            green("✔"),
            report.total_pages,
            report.duration_ms
        );
    }

    Ok(())
}

/// Map CLI args to `ScanConfig`.
fn build_config(cli: &Cli) -> Result<ScanConfig> {
    let mut builder = ScanConfig::builder()
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }

    builder.build().context("Invalid configuration")
}
