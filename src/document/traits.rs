//! Document traits
//!
//! Capability interface over the external rendering engine. The core only
//! talks to these traits, so an alternate engine can be dropped in without
//! touching rasterization, region or batch logic.

use super::error::Result;
use super::types::{EmbeddedImage, PageGeometry, PdfRect, RgbPixels, ScaleFactor};

/// Factory for engine documents
///
/// Shared across requests, so it must be `Send + Sync`. The documents it
/// opens are not: each one lives inside a single blocking task.
pub trait PdfEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &'static str;

    /// Open a byte buffer as a paged document
    fn open(&self, data: &[u8]) -> Result<Box<dyn EngineDocument>>;
}

/// One opened document inside the engine
pub trait EngineDocument {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Page size in points
    fn page_geometry(&self, index: usize) -> Result<PageGeometry>;

    /// Render a page, or the `clip` sub-rectangle of it, to opaque RGB
    fn rasterize(
        &self,
        index: usize,
        scale: ScaleFactor,
        clip: Option<&PdfRect>,
    ) -> Result<RgbPixels>;

    /// Distinct embedded images of a page, in encounter order
    ///
    /// The outer error means the page could not be walked at all; inner
    /// errors are individual images that failed to decode.
    fn embedded_images(&self, index: usize) -> Result<Vec<Result<EmbeddedImage>>>;

    /// Release native resources
    fn close(&mut self);
}
