//! Core document types
//!
//! Geometry in two coordinate spaces plus the image values the core produces.
//! PDF-space is the page's native point space (72 units per inch, origin at the
//! top-left corner of the page as the renderer reports it). Render-space is the
//! pixel grid of a page rasterized at some DPI.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{DocumentError, DocumentResult};

/// PDF points per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Default render resolution
pub const DEFAULT_DPI: f64 = 300.0;

/// How far into the buffer the `%PDF` header may start
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
}

impl DocumentFormat {
    /// Detect format from magic bytes
    ///
    /// Readers tolerate leading garbage before the header, so the marker is
    /// searched for in the first kilobyte rather than only at offset zero.
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
        if window.windows(4).any(|w| w == b"%PDF") {
            return Some(Self::Pdf);
        }

        None
    }

    /// MIME type handed to the rendering engine
    pub fn mime(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
        }
    }
}

/// Ratio between render-space pixels and PDF-space points
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Create a scale factor, rejecting zero, negative and non-finite values
    pub fn new(value: f64) -> DocumentResult<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(DocumentError::InvalidScale(value))
        }
    }

    /// Scale factor for rasterizing at `dpi` given the point base
    pub fn from_dpi(dpi: f64, points_per_inch: f64) -> DocumentResult<Self> {
        if !(points_per_inch.is_finite() && points_per_inch > 0.0) {
            return Err(DocumentError::InvalidScale(points_per_inch));
        }
        Self::new(dpi / points_per_inch)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// DPI this factor corresponds to at the given point base
    pub fn dpi(&self, points_per_inch: f64) -> f64 {
        self.0 * points_per_inch
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(DEFAULT_DPI / POINTS_PER_INCH)
    }
}

/// Rectangle in render-space pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RenderRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Rectangle in PDF-space points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PdfRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

impl fmt::Display for PdfRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{x={:.2}, y={:.2}, width={:.2}, height={:.2}}}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Page size in PDF-space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    /// 0-based page index
    pub index: usize,
    pub width_pt: f64,
    pub height_pt: f64,
}

impl PageGeometry {
    /// Slack for rectangles that were converted from render-space and picked
    /// up floating-point noise on the far edge.
    const EDGE_TOLERANCE: f64 = 1e-6;

    pub fn new(index: usize, width_pt: f64, height_pt: f64) -> Self {
        Self {
            index,
            width_pt,
            height_pt,
        }
    }

    /// Whether `rect` is a non-empty rectangle fully inside this page
    pub fn contains(&self, rect: &PdfRect) -> bool {
        if !rect.is_finite() || rect.width <= 0.0 || rect.height <= 0.0 {
            return false;
        }
        let slack_x = Self::EDGE_TOLERANCE * self.width_pt.max(1.0);
        let slack_y = Self::EDGE_TOLERANCE * self.height_pt.max(1.0);

        rect.x >= 0.0
            && rect.y >= 0.0
            && rect.right() <= self.width_pt + slack_x
            && rect.bottom() <= self.height_pt + slack_y
    }

    /// Rectangle covering the whole page
    pub fn full_rect(&self) -> PdfRect {
        PdfRect::new(0.0, 0.0, self.width_pt, self.height_pt)
    }
}

/// Output image container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
}

/// Opaque RGB pixels straight out of the rasterizer, 3 bytes per pixel, no padding
#[derive(Debug, Clone)]
pub struct RgbPixels {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Encoded raster image
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
}

impl RasterImage {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Embedded image as handed back by an engine, already in its native encoding
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// Engine object reference (xref) the image was found under
    pub xref: u32,
    /// Source codec extension (`jpeg`, `jpx`, `png`, ...)
    pub ext: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Embedded image extracted from one page, with its artifact name
#[derive(Debug, Clone)]
pub struct EmbeddedImageRecord {
    pub page_index: usize,
    /// 0-based position among the page's distinct image references
    pub ordinal_on_page: usize,
    pub format: String,
    pub name: String,
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl EmbeddedImageRecord {
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}
