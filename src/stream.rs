//! Streaming API: receive scan events as an async `Stream`.
//!
//! [`scan_stream`] starts a pdfium-backed scan and returns its events as a
//! [`ScanEventStream`] alongside the [`ScanHandle`]. This suits callers that
//! run their own async loop (a TUI, a WebSocket bridge) and would rather
//! `.next().await` than implement [`crate::progress::ScanEventSink`].
//!
//! The stream yields events in emission order and ends right after the
//! terminal `Result` or `Error` event, when the worker drops its sink.

use crate::config::ScanConfig;
use crate::error::PdfColorError;
use crate::progress::{ChannelSink, ScanEvent};
use crate::scan::{ColorScanner, ScanHandle};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;

/// A boxed stream of scan events.
pub type ScanEventStream = Pin<Box<dyn Stream<Item = ScanEvent> + Send>>;

/// Start a scan and stream its events.
///
/// # Returns
/// - `Ok((stream, handle))`: the run has started; failures inside the run
///   arrive as a `ScanEvent::Error` and through `handle.wait()`
/// - `Err(PdfColorError)`: the run could not be started (invalid config,
///   no Tokio runtime)
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdfcolor::{scan_stream, ScanConfig, ScanEvent};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (mut events, handle) = scan_stream("document.pdf", &ScanConfig::default())?;
/// while let Some(event) = events.next().await {
///     if let ScanEvent::Log { line } = event {
///         println!("{line}");
///     }
/// }
/// let report = handle.wait().await?;
/// println!("{} color pages", report.color_count);
/// # Ok(())
/// # }
/// ```
pub fn scan_stream(
    input_str: impl AsRef<str>,
    config: &ScanConfig,
) -> Result<(ScanEventStream, ScanHandle), PdfColorError> {
    let scanner = ColorScanner::new(config.clone())?;
    stream_from(&scanner, input_str.as_ref())
}

/// Start a run on an existing scanner and stream its events.
pub fn stream_from(
    scanner: &ColorScanner,
    input_str: &str,
) -> Result<(ScanEventStream, ScanHandle), PdfColorError> {
    info!("Starting streaming scan: {}", input_str);
    let (sink, rx) = ChannelSink::new();
    let handle = scanner.start(input_str, Arc::new(sink))?;
    let stream: ScanEventStream = Box::pin(UnboundedReceiverStream::new(rx));
    Ok((stream, handle))
}
