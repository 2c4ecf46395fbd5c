//! Event sink for scan progress, log lines and the final outcome.
//!
//! Hand an [`Arc<dyn ScanEventSink>`] to [`crate::scan::ColorScanner::start`]
//! to receive events while the scan runs on its worker thread. A run emits, in
//! this order:
//!
//! 1. a preamble log line with the total page count, then `on_progress(0)`;
//! 2. for each page, in page order, one log line and one progress update;
//! 3. exactly one of `on_result` (success) or `on_error` (failure).
//!
//! Callers that prefer a message loop over callbacks can use [`ChannelSink`],
//! which forwards every event as a [`ScanEvent`] into a Tokio channel.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfcolor::ScanEventSink;
//! use std::sync::atomic::{AtomicU8, Ordering};
//!
//! struct LastPercent(AtomicU8);
//!
//! impl ScanEventSink for LastPercent {
//!     fn on_progress(&self, percent: u8) {
//!         self.0.store(percent, Ordering::SeqCst);
//!     }
//! }
//!
//! let sink = LastPercent(AtomicU8::new(0));
//! sink.on_progress(40);
//! assert_eq!(sink.0.load(Ordering::SeqCst), 40);
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Receives the events of a scan.
///
/// Implementations must be `Send + Sync`: every method is called from the
/// scan's worker thread, not the thread that started the scan. All methods
/// have default no-op implementations so callers only override what they
/// care about.
pub trait ScanEventSink: Send + Sync {
    /// Percentage of pages classified, `0..=100`, never decreasing within a run.
    fn on_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// One human-readable line: the preamble or a per-page result.
    fn on_log(&self, line: &str) {
        let _ = line;
    }

    /// Final tally. Called once, only when the scan succeeds.
    fn on_result(&self, bw_count: usize, color_count: usize) {
        let _ = (bw_count, color_count);
    }

    /// Failure description. Called once, only when the scan fails.
    fn on_error(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op sink for callers that only want the returned report.
pub struct NoopSink;

impl ScanEventSink for NoopSink {}

/// Convenience alias for the sink type the scanner stores.
pub type EventSink = Arc<dyn ScanEventSink>;

/// One scan event as a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    Progress { percent: u8 },
    Log { line: String },
    Result { bw_count: usize, color_count: usize },
    Error { message: String },
}

impl ScanEvent {
    /// `true` for the event that ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanEvent::Result { .. } | ScanEvent::Error { .. })
    }
}

/// Sink that forwards every event into an unbounded Tokio channel.
///
/// Sending never blocks the worker. Events sent after the receiver is
/// dropped are discarded.
pub struct ChannelSink {
    tx: UnboundedSender<ScanEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver its events arrive on.
    pub fn new() -> (Self, UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ScanEvent) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

impl ScanEventSink for ChannelSink {
    fn on_progress(&self, percent: u8) {
        self.send(ScanEvent::Progress { percent });
    }

    fn on_log(&self, line: &str) {
        self.send(ScanEvent::Log {
            line: line.to_string(),
        });
    }

    fn on_result(&self, bw_count: usize, color_count: usize) {
        self.send(ScanEvent::Result {
            bw_count,
            color_count,
        });
    }

    fn on_error(&self, message: &str) {
        self.send(ScanEvent::Error {
            message: message.to_string(),
        });
    }
}
