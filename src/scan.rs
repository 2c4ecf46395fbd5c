//! Scan orchestration and the eager entry points.
//!
//! [`ColorScanner`] drives one run at a time through
//! `Idle → Counting → Classifying → Done | Failed`:
//!
//! 1. validate the input path and ask the renderer for the page count;
//! 2. announce the count, report 0 %;
//! 3. render pages in order, classify each, log it, report progress;
//! 4. report the tally, or a single error if anything failed.
//!
//! The tally lives on the worker's stack, so every run starts from zero and
//! nothing outside the worker can touch it. The only shared state is the
//! [`ScanState`], which guards against overlapping runs on one scanner.
//!
//! [`scan`], [`scan_sync`], [`scan_from_bytes`] and [`inspect`] wrap the
//! scanner for callers that just want the final [`ScanReport`].

use crate::config::ScanConfig;
use crate::error::PdfColorError;
use crate::output::{DocumentInfo, PageClassification, PageTone, ScanReport, ScanTally};
use crate::pipeline::classify::first_color_pixel;
use crate::pipeline::input;
use crate::pipeline::render::{self, PageRenderer, PdfiumRenderer};
use crate::progress::{EventSink, NoopSink, ScanEventSink};
use image::DynamicImage;
use serde::Serialize;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle of a scanner's current (or most recent) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// No run has been started yet.
    #[default]
    Idle,
    /// Validating the input and counting pages.
    Counting,
    /// Rendering and classifying pages.
    Classifying,
    /// Last run succeeded.
    Done,
    /// Last run failed.
    Failed,
}

impl ScanState {
    /// `true` while a run is in progress.
    pub fn is_running(self) -> bool {
        matches!(self, ScanState::Counting | ScanState::Classifying)
    }
}

/// Classifies every page of a PDF and reports through a [`ScanEventSink`].
///
/// Cloning is cheap and clones share the run state, so a clone cannot be
/// used to start a second concurrent run. Use separate scanners for that.
#[derive(Clone)]
pub struct ColorScanner {
    config: ScanConfig,
    renderer: Arc<dyn PageRenderer>,
    state: Arc<Mutex<ScanState>>,
}

impl ColorScanner {
    /// Scanner backed by pdfium.
    pub fn new(config: ScanConfig) -> Result<Self, PdfColorError> {
        let renderer = Arc::new(PdfiumRenderer::new(&config));
        Self::with_renderer(config, renderer)
    }

    /// Scanner backed by a custom renderer.
    pub fn with_renderer(
        config: ScanConfig,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self, PdfColorError> {
        config.validate()?;
        Ok(Self {
            config,
            renderer,
            state: Arc::new(Mutex::new(ScanState::Idle)),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn state(&self) -> ScanState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Start a run on Tokio's blocking pool and return immediately.
    ///
    /// Every outcome is delivered to `sink`; the returned [`ScanHandle`] only
    /// lets the caller wait for the run to end. Fails synchronously, without
    /// emitting any event, when called outside a Tokio runtime or while this
    /// scanner is already running.
    pub fn start(
        &self,
        input_str: impl AsRef<str>,
        sink: EventSink,
    ) -> Result<ScanHandle, PdfColorError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PdfColorError::Internal(format!("No Tokio runtime: {e}")))?;
        self.begin()?;

        let worker = self.clone();
        let input_str = input_str.as_ref().to_string();
        let join = runtime.spawn_blocking(move || worker.execute(&input_str, sink.as_ref()));

        Ok(ScanHandle { join })
    }

    /// Run a scan to completion on the calling thread.
    ///
    /// Blocks for the whole run. Emits exactly the same events as
    /// [`ColorScanner::start`].
    pub fn run(
        &self,
        input_str: &str,
        sink: &dyn ScanEventSink,
    ) -> Result<ScanReport, PdfColorError> {
        self.begin()?;
        self.execute(input_str, sink)
    }

    fn begin(&self) -> Result<(), PdfColorError> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if state.is_running() {
            return Err(PdfColorError::ScanInProgress);
        }
        *state = ScanState::Counting;
        Ok(())
    }

    fn set_state(&self, next: ScanState) {
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = next;
    }

    /// Worker body: run the scan, settle the state, emit the terminal event.
    fn execute(
        &self,
        input_str: &str,
        sink: &dyn ScanEventSink,
    ) -> Result<ScanReport, PdfColorError> {
        let started = Instant::now();
        info!("Starting scan: {}", input_str);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.scan_pages(input_str, sink, started)
        }))
        .unwrap_or_else(|payload| {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(PdfColorError::Internal(format!("Scan worker panicked: {detail}")))
        });

        // The state settles before the terminal event so a sink may start
        // the next run from inside `on_result` / `on_error`.
        match &outcome {
            Ok(report) => {
                self.set_state(ScanState::Done);
                info!(
                    "Scan complete: {} black & white, {} color, {}ms",
                    report.bw_count, report.color_count, report.duration_ms
                );
                sink.on_result(report.bw_count, report.color_count);
            }
            Err(e) => {
                self.set_state(ScanState::Failed);
                warn!("Scan failed: {}", e);
                sink.on_error(&e.to_string());
            }
        }

        outcome
    }

    fn scan_pages(
        &self,
        input_str: &str,
        sink: &dyn ScanEventSink,
        started: Instant,
    ) -> Result<ScanReport, PdfColorError> {
        // ── Counting ─────────────────────────────────────────────────────
        let pdf_path = input::resolve_local(input_str)?;
        let total_pages = self.renderer.page_count(&pdf_path)?;

        sink.on_log(&format!("Total pages found: {total_pages}, processing started"));
        sink.on_progress(0);

        let mut tally = ScanTally::default();
        let mut pages: Vec<PageClassification> = Vec::with_capacity(total_pages);

        if total_pages == 0 {
            sink.on_progress(100);
            return Ok(ScanReport {
                total_pages,
                bw_count: 0,
                color_count: 0,
                pages,
                duration_ms: started.elapsed().as_millis() as u64,
            });
        }

        // ── Classifying ──────────────────────────────────────────────────
        self.set_state(ScanState::Classifying);
        let rendered = self.renderer.render_pages(
            &pdf_path,
            self.config.dpi,
            &mut |page_num: usize, image: DynamicImage| {
                if page_num > total_pages {
                    return Err(PdfColorError::PageCountMismatch {
                        counted: total_pages,
                        rendered: page_num,
                    });
                }
                if page_num != pages.len() + 1 {
                    return Err(PdfColorError::Internal(format!(
                        "Renderer produced page {page_num}, expected page {}",
                        pages.len() + 1
                    )));
                }

                let tone = match first_color_pixel(&image) {
                    Some((x, y)) => {
                        debug!("Page {}: first color pixel at ({}, {})", page_num, x, y);
                        PageTone::Color
                    }
                    None => PageTone::BlackAndWhite,
                };
                drop(image);

                tally.record(tone);
                let page = PageClassification { page_num, tone };
                sink.on_log(&page.log_line());
                sink.on_progress(progress_percent(page_num, total_pages));
                pages.push(page);
                Ok(())
            },
        )?;

        if rendered != total_pages || tally.total() != total_pages {
            return Err(PdfColorError::PageCountMismatch {
                counted: total_pages,
                rendered,
            });
        }

        Ok(ScanReport {
            total_pages,
            bw_count: tally.bw_count,
            color_count: tally.color_count,
            pages,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// `floor(page_num / total_pages * 100)`, in integer arithmetic.
///
/// `total_pages` must be non-zero.
pub fn progress_percent(page_num: usize, total_pages: usize) -> u8 {
    (page_num.saturating_mul(100) / total_pages).min(100) as u8
}

/// Handle to a run started with [`ColorScanner::start`].
pub struct ScanHandle {
    join: JoinHandle<Result<ScanReport, PdfColorError>>,
}

impl ScanHandle {
    /// Wait for the run to end and return its outcome.
    ///
    /// The sink has already received the matching result or error event.
    pub async fn wait(self) -> Result<ScanReport, PdfColorError> {
        self.join
            .await
            .map_err(|e| PdfColorError::Internal(format!("Scan task failed: {}", e)))?
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Classify every page of a PDF with pdfium and return the report.
///
/// This is the primary entry point for the library when no live events are
/// needed.
pub async fn scan(
    input_str: impl AsRef<str>,
    config: &ScanConfig,
) -> Result<ScanReport, PdfColorError> {
    ColorScanner::new(config.clone())?
        .start(input_str, Arc::new(NoopSink))?
        .wait()
        .await
}

/// Blocking counterpart of [`scan`]; needs no Tokio runtime.
pub fn scan_sync(
    input_str: impl AsRef<str>,
    config: &ScanConfig,
) -> Result<ScanReport, PdfColorError> {
    ColorScanner::new(config.clone())?.run(input_str.as_ref(), &NoopSink)
}

/// Scan PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed when the
/// scan finishes.
pub async fn scan_from_bytes(
    bytes: &[u8],
    config: &ScanConfig,
) -> Result<ScanReport, PdfColorError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| PdfColorError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| PdfColorError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` lives until the scan has finished reading it.
    scan(&path, config).await
}

/// Read page count and metadata without classifying anything.
pub async fn inspect(
    input_str: impl AsRef<str>,
    password: Option<&str>,
) -> Result<DocumentInfo, PdfColorError> {
    let pdf_path = input::resolve_local(input_str.as_ref())?;
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || render::extract_info(&pdf_path, pwd.as_deref()))
        .await
        .map_err(|e| PdfColorError::Internal(format!("Metadata task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ChannelSink, ScanEvent};
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use std::path::Path;
    use std::sync::Barrier;

    // ── Test doubles ─────────────────────────────────────────────────────

    /// In-memory renderer: hands out pre-built page images.
    struct FakeRenderer {
        pages: Vec<DynamicImage>,
        counted: Option<usize>,
        fail_at: Option<usize>,
        panic_on_count: bool,
        gate: Mutex<Option<Arc<Barrier>>>,
    }

    impl FakeRenderer {
        fn new(pages: Vec<DynamicImage>) -> Self {
            Self {
                pages,
                counted: None,
                fail_at: None,
                panic_on_count: false,
                gate: Mutex::new(None),
            }
        }

        fn counting(mut self, n: usize) -> Self {
            self.counted = Some(n);
            self
        }

        fn failing_at(mut self, page: usize) -> Self {
            self.fail_at = Some(page);
            self
        }

        fn gated(self, gate: Arc<Barrier>) -> Self {
            *self.gate.lock().unwrap() = Some(gate);
            self
        }
    }

    impl PageRenderer for FakeRenderer {
        fn page_count(&self, _path: &Path) -> Result<usize, PdfColorError> {
            if self.panic_on_count {
                panic!("renderer exploded");
            }
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                gate.wait();
            }
            Ok(self.counted.unwrap_or(self.pages.len()))
        }

        fn render_pages(
            &self,
            _path: &Path,
            _dpi: u32,
            on_page: &mut dyn FnMut(usize, DynamicImage) -> Result<(), PdfColorError>,
        ) -> Result<usize, PdfColorError> {
            let mut rendered = 0;
            for (idx, page) in self.pages.iter().enumerate() {
                if self.fail_at == Some(idx + 1) {
                    return Err(PdfColorError::RasterisationFailed {
                        page: idx + 1,
                        detail: "synthetic failure".into(),
                    });
                }
                on_page(idx + 1, page.clone())?;
                rendered += 1;
            }
            Ok(rendered)
        }
    }

    /// Records every event in arrival order.
    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ScanEvent>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<ScanEvent> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, ev: ScanEvent) {
            self.events.lock().unwrap().push(ev);
        }
    }

    impl ScanEventSink for RecordingSink {
        fn on_progress(&self, percent: u8) {
            self.push(ScanEvent::Progress { percent });
        }
        fn on_log(&self, line: &str) {
            self.push(ScanEvent::Log { line: line.into() });
        }
        fn on_result(&self, bw_count: usize, color_count: usize) {
            self.push(ScanEvent::Result {
                bw_count,
                color_count,
            });
        }
        fn on_error(&self, message: &str) {
            self.push(ScanEvent::Error {
                message: message.into(),
            });
        }
    }

    fn gray() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([90, 90, 90])))
    }

    fn color() -> DynamicImage {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([90, 90, 90]));
        img.put_pixel(5, 5, Rgb([200, 30, 30]));
        DynamicImage::ImageRgb8(img)
    }

    fn luma() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([10])))
    }

    fn fake_pdf() -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n%fake body\n").unwrap();
        f
    }

    fn scanner(renderer: FakeRenderer) -> ColorScanner {
        ColorScanner::with_renderer(ScanConfig::default(), Arc::new(renderer)).unwrap()
    }

    fn log(line: &str) -> ScanEvent {
        ScanEvent::Log { line: line.into() }
    }

    fn progress(percent: u8) -> ScanEvent {
        ScanEvent::Progress { percent }
    }

    fn count_terminal(events: &[ScanEvent]) -> (usize, usize) {
        let results = events
            .iter()
            .filter(|e| matches!(e, ScanEvent::Result { .. }))
            .count();
        let errors = events
            .iter()
            .filter(|e| matches!(e, ScanEvent::Error { .. }))
            .count();
        (results, errors)
    }

    // ── Event sequencing ─────────────────────────────────────────────────

    #[test]
    fn gray_color_gray_document_emits_expected_sequence() {
        let pdf = fake_pdf();
        let s = scanner(FakeRenderer::new(vec![gray(), color(), gray()]));
        let sink = RecordingSink::default();

        let report = s.run(pdf.path().to_str().unwrap(), &sink).unwrap();

        assert_eq!(
            sink.events(),
            vec![
                log("Total pages found: 3, processing started"),
                progress(0),
                log("Page 1: Black & White"),
                progress(33),
                log("Page 2: Color"),
                progress(66),
                log("Page 3: Black & White"),
                progress(100),
                ScanEvent::Result {
                    bw_count: 2,
                    color_count: 1
                },
            ]
        );
        assert_eq!(report.total_pages, 3);
        assert_eq!(report.bw_count, 2);
        assert_eq!(report.color_count, 1);
        assert_eq!(report.color_pages(), vec![2]);
        assert_eq!(s.state(), ScanState::Done);
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_100() {
        let pdf = fake_pdf();
        let pages = (0..7)
            .map(|i| if i % 3 == 0 { color() } else { luma() })
            .collect();
        let s = scanner(FakeRenderer::new(pages));
        let sink = RecordingSink::default();

        let report = s.run(pdf.path().to_str().unwrap(), &sink).unwrap();

        let percents: Vec<u8> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ScanEvent::Progress { percent } => Some(percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents.len(), 8);
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
        assert_eq!(percents.first(), Some(&0));
        assert_eq!(percents.last(), Some(&100));
        assert_eq!(report.bw_count + report.color_count, 7);
        assert_eq!(report.color_count, 3);
    }

    #[test]
    fn render_failure_emits_one_error_and_no_result() {
        let pdf = fake_pdf();
        let s = scanner(FakeRenderer::new(vec![gray(), color(), gray()]).failing_at(2));
        let sink = RecordingSink::default();

        let err = s.run(pdf.path().to_str().unwrap(), &sink).unwrap_err();
        assert!(matches!(err, PdfColorError::RasterisationFailed { page: 2, .. }));

        let events = sink.events();
        assert_eq!(count_terminal(&events), (0, 1));
        assert_eq!(
            events.last(),
            Some(&ScanEvent::Error {
                message: err.to_string()
            })
        );
        // Page 1 was reported before the failure; nothing after it.
        assert!(events.contains(&log("Page 1: Black & White")));
        assert!(!events
            .iter()
            .any(|e| matches!(e, ScanEvent::Log { line } if line.starts_with("Page 2"))));
        assert_eq!(s.state(), ScanState::Failed);
    }

    #[test]
    fn missing_file_emits_single_error_only() {
        let s = scanner(FakeRenderer::new(vec![gray()]));
        let sink = RecordingSink::default();

        let err = s.run("/no/such/document.pdf", &sink).unwrap_err();
        assert!(matches!(err, PdfColorError::FileNotFound { .. }));
        assert_eq!(
            sink.events(),
            vec![ScanEvent::Error {
                message: err.to_string()
            }]
        );
    }

    #[test]
    fn non_pdf_input_is_a_render_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x03\x04 definitely a zip").unwrap();
        let s = scanner(FakeRenderer::new(vec![gray()]));
        let sink = RecordingSink::default();

        let err = s.run(f.path().to_str().unwrap(), &sink).unwrap_err();
        assert!(err.is_render_error());
        assert_eq!(count_terminal(&sink.events()), (0, 1));
    }

    #[test]
    fn zero_page_document_short_circuits_to_done() {
        let pdf = fake_pdf();
        let s = scanner(FakeRenderer::new(vec![]));
        let sink = RecordingSink::default();

        let report = s.run(pdf.path().to_str().unwrap(), &sink).unwrap();

        assert_eq!(
            sink.events(),
            vec![
                log("Total pages found: 0, processing started"),
                progress(0),
                progress(100),
                ScanEvent::Result {
                    bw_count: 0,
                    color_count: 0
                },
            ]
        );
        assert_eq!(report.total_pages, 0);
        assert!(report.pages.is_empty());
        assert_eq!(s.state(), ScanState::Done);
    }

    #[test]
    fn extra_rendered_page_is_a_count_mismatch() {
        let pdf = fake_pdf();
        let s = scanner(FakeRenderer::new(vec![gray(), gray(), gray()]).counting(2));
        let sink = RecordingSink::default();

        let err = s.run(pdf.path().to_str().unwrap(), &sink).unwrap_err();
        assert!(matches!(
            err,
            PdfColorError::PageCountMismatch {
                counted: 2,
                rendered: 3
            }
        ));
        // Progress never overshoots 100 before the failure.
        assert!(!sink
            .events()
            .iter()
            .any(|e| matches!(e, ScanEvent::Progress { percent } if *percent > 100)));
    }

    #[test]
    fn missing_rendered_page_is_a_count_mismatch() {
        let pdf = fake_pdf();
        let s = scanner(FakeRenderer::new(vec![color(), gray()]).counting(3));
        let sink = RecordingSink::default();

        let err = s.run(pdf.path().to_str().unwrap(), &sink).unwrap_err();
        assert!(matches!(
            err,
            PdfColorError::PageCountMismatch {
                counted: 3,
                rendered: 2
            }
        ));
        assert_eq!(count_terminal(&sink.events()), (0, 1));
    }

    #[test]
    fn renderer_panic_becomes_error_event() {
        let pdf = fake_pdf();
        let mut renderer = FakeRenderer::new(vec![gray()]);
        renderer.panic_on_count = true;
        let s = scanner(renderer);
        let sink = RecordingSink::default();

        let err = s.run(pdf.path().to_str().unwrap(), &sink).unwrap_err();
        assert!(err.to_string().contains("renderer exploded"), "got: {err}");
        assert_eq!(count_terminal(&sink.events()), (0, 1));
        assert_eq!(s.state(), ScanState::Failed);
    }

    /// Renderer that hands out page 2 before page 1.
    struct OutOfOrder;

    impl PageRenderer for OutOfOrder {
        fn page_count(&self, _path: &Path) -> Result<usize, PdfColorError> {
            Ok(2)
        }

        fn render_pages(
            &self,
            _path: &Path,
            _dpi: u32,
            on_page: &mut dyn FnMut(usize, DynamicImage) -> Result<(), PdfColorError>,
        ) -> Result<usize, PdfColorError> {
            on_page(2, color())?;
            on_page(1, gray())?;
            Ok(2)
        }
    }

    #[test]
    fn out_of_order_pages_fail_the_run() {
        let pdf = fake_pdf();
        let s = ColorScanner::with_renderer(ScanConfig::default(), Arc::new(OutOfOrder)).unwrap();
        let sink = RecordingSink::default();

        let err = s.run(pdf.path().to_str().unwrap(), &sink).unwrap_err();
        assert!(matches!(err, PdfColorError::Internal(_)), "got: {err:?}");
        assert!(err.to_string().contains("expected page 1"), "got: {err}");

        let events = sink.events();
        assert_eq!(count_terminal(&events), (0, 1));
        // Nothing was classified before the bad page arrived.
        assert!(!events
            .iter()
            .any(|e| matches!(e, ScanEvent::Log { line } if line.starts_with("Page "))));
        assert_eq!(s.state(), ScanState::Failed);
    }

    // ── Run lifecycle ────────────────────────────────────────────────────

    #[test]
    fn each_run_starts_with_a_fresh_tally() {
        let pdf = fake_pdf();
        let path = pdf.path().to_str().unwrap();
        let s = scanner(FakeRenderer::new(vec![color(), gray()]));

        assert!(s.run("/no/such/file.pdf", &NoopSink).is_err());
        assert_eq!(s.state(), ScanState::Failed);

        let first = s.run(path, &NoopSink).unwrap();
        let second = s.run(path, &NoopSink).unwrap();
        assert_eq!((first.bw_count, first.color_count), (1, 1));
        assert_eq!((second.bw_count, second.color_count), (1, 1));
    }

    #[test]
    fn new_scanner_is_idle() {
        let s = scanner(FakeRenderer::new(vec![]));
        assert_eq!(s.state(), ScanState::Idle);
        assert!(!s.state().is_running());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ScanConfig {
            dpi: 5,
            ..ScanConfig::default()
        };
        let result = ColorScanner::with_renderer(config, Arc::new(FakeRenderer::new(vec![])));
        assert!(matches!(result, Err(PdfColorError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn start_delivers_events_through_channel() {
        let pdf = fake_pdf();
        let s = scanner(FakeRenderer::new(vec![gray(), color()]));
        let (sink, mut rx) = ChannelSink::new();

        let handle = s.start(pdf.path().to_str().unwrap(), Arc::new(sink)).unwrap();
        let report = handle.wait().await.unwrap();

        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        assert_eq!(events.len(), 7);
        assert_eq!(
            events.last(),
            Some(&ScanEvent::Result {
                bw_count: 1,
                color_count: 1
            })
        );
        assert_eq!(report.pages.len(), 2);
        assert_eq!(s.state(), ScanState::Done);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn second_start_while_running_is_rejected() {
        let pdf = fake_pdf();
        let path = pdf.path().to_str().unwrap().to_string();
        let gate = Arc::new(Barrier::new(2));
        let s = scanner(FakeRenderer::new(vec![gray(), gray()]).gated(Arc::clone(&gate)));

        let first = s.start(&path, Arc::new(NoopSink)).unwrap();
        assert!(s.state().is_running());

        let sink = Arc::new(RecordingSink::default());
        let err = s
            .start(&path, Arc::clone(&sink) as EventSink)
            .err()
            .expect("second start must be rejected");
        assert!(matches!(err, PdfColorError::ScanInProgress));
        assert!(sink.events().is_empty(), "rejected start must not emit events");

        // A clone shares the run state.
        assert!(matches!(
            s.clone().start(&path, Arc::new(NoopSink)),
            Err(PdfColorError::ScanInProgress)
        ));

        tokio::task::spawn_blocking(move || {
            gate.wait();
        })
        .await
        .unwrap();

        let report = first.wait().await.unwrap();
        assert_eq!(report.bw_count, 2);
        assert_eq!(s.state(), ScanState::Done);

        // Terminal state accepts a new run.
        let again = s
            .start(&path, Arc::new(NoopSink))
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert_eq!(again.bw_count, 2);
    }

    #[test]
    fn start_outside_runtime_fails_without_changing_state() {
        let s = scanner(FakeRenderer::new(vec![gray()]));
        let err = s.start("whatever.pdf", Arc::new(NoopSink)).err().unwrap();
        assert!(matches!(err, PdfColorError::Internal(_)));
        assert_eq!(s.state(), ScanState::Idle);
    }

    // ── Progress math ────────────────────────────────────────────────────

    #[test]
    fn progress_percent_floors() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 1), 100);
        assert_eq!(progress_percent(1, 200), 0);
        assert_eq!(progress_percent(199, 200), 99);
    }

    #[test]
    fn progress_percent_never_exceeds_100() {
        assert_eq!(progress_percent(5, 3), 100);
    }
}
