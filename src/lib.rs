//! # edgequake-pdfcolor
//!
//! Classify every page of a PDF as black-and-white or color.
//!
//! ## Why this crate?
//!
//! Print shops and office printers bill color pages at several times the
//! price of monochrome ones, but a PDF does not say which of its pages use
//! color. Colorspace declarations lie (an RGB image of a scanned letter is
//! still gray), so this crate rasterises each page and looks at the pixels: a
//! page is black-and-white exactly when every pixel has `R == G == B`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     validate the path and the %PDF header
//!  ├─ 2. Count     open with pdfium, read the page count
//!  ├─ 3. Render    rasterise page by page (spawn_blocking)
//!  ├─ 4. Classify  exact R = G = B test per page
//!  └─ 5. Report    progress + log events, then the tally
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfcolor::{scan, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = scan("document.pdf", &ScanConfig::default()).await?;
//!     println!("{} black & white, {} color", report.bw_count, report.color_count);
//!     println!("color pages: {:?}", report.color_pages());
//!     Ok(())
//! }
//! ```
//!
//! ## Live events
//!
//! Front-ends that want a progress bar and a running log implement
//! [`ScanEventSink`] and hand it to [`ColorScanner::start`], or consume the
//! same events as a `Stream` via [`scan_stream`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfcolor` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ## PDFium
//!
//! Rendering needs the pdfium shared library at runtime. It is looked up in
//! `PDFIUM_LIB_PATH`, then the working directory, then the system library
//! path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scan;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::PdfColorError;
pub use output::{DocumentInfo, PageClassification, PageTone, ScanReport, ScanTally};
pub use pipeline::classify::{classify, first_color_pixel};
pub use pipeline::render::{PageRenderer, PdfiumRenderer};
pub use progress::{ChannelSink, EventSink, NoopSink, ScanEvent, ScanEventSink};
pub use scan::{inspect, scan, scan_from_bytes, scan_sync, ColorScanner, ScanHandle, ScanState};
pub use stream::{scan_stream, stream_from, ScanEventStream};
