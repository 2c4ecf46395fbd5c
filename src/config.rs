//! Configuration types for page color scanning.
//!
//! All scan behaviour is controlled through [`ScanConfig`], built via its
//! [`ScanConfigBuilder`]. The classifier is an exact test, so the knobs only
//! cover how pages are rasterised and how encrypted documents are opened.

use crate::error::PdfColorError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest accepted rendering DPI.
pub const MIN_DPI: u32 = 36;
/// Highest accepted rendering DPI.
pub const MAX_DPI: u32 = 600;
/// Smallest accepted pixel cap.
pub const MIN_RENDERED_PIXELS: u32 = 100;
/// Largest accepted pixel cap; one RGBA page at this size is already 1.6 GB.
pub const MAX_RENDERED_PIXELS: u32 = 20_000;

/// Configuration for a page color scan.
///
/// Built via [`ScanConfig::builder()`] or using [`ScanConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdfcolor::ScanConfig;
///
/// let config = ScanConfig::builder()
///     .dpi(100)
///     .max_rendered_pixels(3000)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 100);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Rendering DPI for the classification pass. Range: 36–600. Default: 150.
    ///
    /// Colored strokes thinner than a pixel can vanish into anti-aliased gray
    /// at very low DPI, so this should not go much below 100 for documents
    /// with fine colored linework.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels.
    /// Range: 100–20000. Default: 5000.
    ///
    /// Caps memory on oversized pages (posters, engineering drawings). The
    /// other dimension is scaled proportionally.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    #[serde(skip)]
    pub password: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 5000,
            password: None,
        }
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ScanConfig {
    /// Create a new builder for `ScanConfig`.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check the invariants [`ScanConfigBuilder::build`] enforces.
    ///
    /// Fields are public, so configs assembled by hand are re-checked before
    /// a scanner accepts them.
    pub fn validate(&self) -> Result<(), PdfColorError> {
        if self.dpi < MIN_DPI || self.dpi > MAX_DPI {
            return Err(PdfColorError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                self.dpi
            )));
        }
        if self.max_rendered_pixels < MIN_RENDERED_PIXELS
            || self.max_rendered_pixels > MAX_RENDERED_PIXELS
        {
            return Err(PdfColorError::InvalidConfig(format!(
                "max_rendered_pixels must be {MIN_RENDERED_PIXELS}–{MAX_RENDERED_PIXELS}, got {}",
                self.max_rendered_pixels
            )));
        }
        Ok(())
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.clamp(MIN_RENDERED_PIXELS, MAX_RENDERED_PIXELS);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScanConfig, PdfColorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
