//! Result types produced by a scan.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a rendered page carries color information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageTone {
    /// Every pixel has equal red, green and blue channels.
    BlackAndWhite,
    /// At least one pixel has unequal channels.
    Color,
}

impl fmt::Display for PageTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageTone::BlackAndWhite => f.write_str("Black & White"),
            PageTone::Color => f.write_str("Color"),
        }
    }
}

/// Classification of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageClassification {
    /// 1-indexed page number.
    pub page_num: usize,
    pub tone: PageTone,
}

impl PageClassification {
    /// The per-page log line emitted to the sink, e.g. `"Page 2: Color"`.
    pub fn log_line(&self) -> String {
        format!("Page {}: {}", self.page_num, self.tone)
    }
}

/// Running counters for a single scan.
///
/// Created zeroed at the start of every run and owned by that run's worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTally {
    pub bw_count: usize,
    pub color_count: usize,
}

impl ScanTally {
    /// Count one classified page.
    pub fn record(&mut self, tone: PageTone) {
        match tone {
            PageTone::BlackAndWhite => self.bw_count += 1,
            PageTone::Color => self.color_count += 1,
        }
    }

    /// Pages counted so far.
    pub fn total(&self) -> usize {
        self.bw_count + self.color_count
    }
}

/// Outcome of a successful scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Page count reported by the counting pass.
    pub total_pages: usize,
    pub bw_count: usize,
    pub color_count: usize,
    /// Per-page results in page order.
    pub pages: Vec<PageClassification>,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
}

impl ScanReport {
    /// Page numbers that need color printing.
    pub fn color_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|p| p.tone == PageTone::Color)
            .map(|p| p.page_num)
            .collect()
    }
}

/// Document-level information read without rendering any page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub pdf_version: String,
}
