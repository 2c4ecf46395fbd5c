//! PDF rasterisation via pdfium, behind the [`PageRenderer`] seam.
//!
//! ## Two passes
//!
//! The orchestrator first asks for the page count so it can compute progress
//! percentages, then asks for the rendered pages. pdfium knows the page count
//! as soon as the document is parsed, so [`PdfiumRenderer::page_count`] never
//! rasterises anything; only the second pass pays for pixels.
//!
//! ## Blocking
//!
//! Every method here blocks. pdfium is a C++ library with internal global
//! state and must not be driven from async worker threads; callers run these
//! on `tokio::task::spawn_blocking`.

use crate::config::ScanConfig;
use crate::error::PdfColorError;
use crate::output::DocumentInfo;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// PostScript points per inch; PDF page sizes are expressed in points.
const POINTS_PER_INCH: f32 = 72.0;

/// Produces the raster pages of a document.
///
/// Both methods must agree on the page count for the same document.
pub trait PageRenderer: Send + Sync {
    /// Number of pages in the document at `path`.
    fn page_count(&self, path: &Path) -> Result<usize, PdfColorError>;

    /// Render every page at `dpi`, in order from page 1, handing each image to
    /// `on_page` together with its 1-indexed page number.
    ///
    /// Stops at the first error, including one returned by `on_page`, and
    /// returns it unchanged. On success returns the number of pages rendered.
    fn render_pages(
        &self,
        path: &Path,
        dpi: u32,
        on_page: &mut dyn FnMut(usize, DynamicImage) -> Result<(), PdfColorError>,
    ) -> Result<usize, PdfColorError>;
}

/// [`PageRenderer`] backed by the pdfium shared library.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    max_rendered_pixels: u32,
    password: Option<String>,
}

impl PdfiumRenderer {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            max_rendered_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
        }
    }

    /// The pixel cap as the `i32` pdfium-render expects.
    fn pixel_cap(&self) -> Result<i32, PdfColorError> {
        i32::try_from(self.max_rendered_pixels).map_err(|_| {
            PdfColorError::InvalidConfig(format!(
                "max_rendered_pixels out of range: {}",
                self.max_rendered_pixels
            ))
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn page_count(&self, path: &Path) -> Result<usize, PdfColorError> {
        let pdfium = bind_pdfium()?;
        let document = load_document(&pdfium, path, self.password.as_deref())?;
        let total = document.pages().len() as usize;
        info!("PDF loaded: {} pages", total);
        Ok(total)
    }

    fn render_pages(
        &self,
        path: &Path,
        dpi: u32,
        on_page: &mut dyn FnMut(usize, DynamicImage) -> Result<(), PdfColorError>,
    ) -> Result<usize, PdfColorError> {
        let max_px = self.pixel_cap()?;
        let pdfium = bind_pdfium()?;
        let document = load_document(&pdfium, path, self.password.as_deref())?;

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(dpi as f32 / POINTS_PER_INCH)
            .set_maximum_width(max_px)
            .set_maximum_height(max_px);

        let mut rendered = 0;
        for (idx, page) in document.pages().iter().enumerate() {
            let page_num = idx + 1;
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                PdfColorError::RasterisationFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px @ {} dpi",
                page_num,
                image.width(),
                image.height(),
                dpi
            );

            on_page(page_num, image)?;
            rendered += 1;
        }

        Ok(rendered)
    }
}

/// Read document metadata without rendering pages.
pub fn extract_info(path: &Path, password: Option<&str>) -> Result<DocumentInfo, PdfColorError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, path, password)?;

    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentInfo {
        page_count: document.pages().len() as usize,
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        pdf_version: format!("{:?}", document.version()),
    })
}

/// Bind to pdfium: `PDFIUM_LIB_PATH` first, then a library in the working
/// directory, then the system library.
pub fn bind_pdfium() -> Result<Pdfium, PdfColorError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(lib_path) if !lib_path.is_empty() => Pdfium::bind_to_library(&lib_path)
            .map_err(|e| PdfColorError::PdfiumBindingFailed(format!("{lib_path}: {e:?}")))?,
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| PdfColorError::PdfiumBindingFailed(format!("{e:?}")))?,
    };
    Ok(Pdfium::new(bindings))
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, PdfColorError> {
    pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_load_error(&e, pdf_path, password.is_some()))
}

/// Translate a pdfium load failure into the crate's error taxonomy.
fn map_load_error(e: &PdfiumError, pdf_path: &Path, has_password: bool) -> PdfColorError {
    let path = pdf_path.to_path_buf();
    match e {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            if has_password {
                PdfColorError::WrongPassword { path }
            } else {
                PdfColorError::PasswordRequired { path }
            }
        }
        other => PdfColorError::CorruptPdf {
            path,
            detail: format!("{:?}", other),
        },
    }
}
