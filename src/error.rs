//! Error type for the edgequake-pdfcolor library.
//!
//! A scan either classifies every page or fails as a whole, so there is one
//! fatal error type, [`PdfColorError`]. Inside a run the orchestrator turns it
//! into a single error event for the sink; the same value is also returned to
//! whoever awaits the run.
//!
//! The variants fall into the groups below. Everything that stops a document
//! from being opened or rasterised counts as a render error
//! ([`PdfColorError::is_render_error`]).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdfcolor library.
#[derive(Debug, Error)]
pub enum PdfColorError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error(
        "File is not a valid PDF: '{path}'\nFirst bytes: {:?}",
        String::from_utf8_lossy(.magic)
    )]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    // ── Render errors ─────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error(
        "PDF '{path}' is encrypted and requires a password.\n\
Provide it with --password <PASSWORD>."
    )]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The counting pass and the rendering pass disagree on the page count.
    #[error("Page count changed between passes: counted {counted}, rendered {rendered}")]
    PageCountMismatch { counted: usize, rendered: usize },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place libpdfium next to the\n\
working directory, or install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Run errors ────────────────────────────────────────────────────────
    /// `start` was called while the same scanner was still busy.
    #[error("A scan is already in progress on this scanner")]
    ScanInProgress,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdfColorError {
    /// `true` when the document could not be opened, parsed or rasterised.
    pub fn is_render_error(&self) -> bool {
        matches!(
            self,
            PdfColorError::FileNotFound { .. }
                | PdfColorError::PermissionDenied { .. }
                | PdfColorError::NotAPdf { .. }
                | PdfColorError::CorruptPdf { .. }
                | PdfColorError::PasswordRequired { .. }
                | PdfColorError::WrongPassword { .. }
                | PdfColorError::RasterisationFailed { .. }
                | PdfColorError::PageCountMismatch { .. }
                | PdfColorError::PdfiumBindingFailed(_)
        )
    }
}
