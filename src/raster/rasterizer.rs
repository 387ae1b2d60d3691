//! Page rasterizer
//!
//! Renders whole pages or PDF-space clips and encodes them as PNG.

use std::io::Cursor;

use image::RgbImage;

use crate::document::{
    Document, DocumentError, DocumentResult, ImageFormat, PdfRect, RasterImage, RgbPixels,
    ScaleFactor,
};

use super::naming;
use super::RasterConfig;

/// Encode an RGB buffer as PNG
pub fn encode_png(pixels: RgbPixels) -> DocumentResult<RasterImage> {
    let (width, height) = (pixels.width, pixels.height);
    let img = RgbImage::from_raw(width, height, pixels.data)
        .ok_or_else(|| DocumentError::RenderError("Failed to create image buffer".into()))?;

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;

    Ok(RasterImage {
        bytes,
        format: ImageFormat::Png,
        width_px: width,
        height_px: height,
    })
}

/// Render page `page_index` at `scale`, optionally clipped to `clip`
pub fn render_page(
    doc: &Document,
    page_index: usize,
    scale: ScaleFactor,
    clip: Option<&PdfRect>,
) -> DocumentResult<RasterImage> {
    let pixels = doc.rasterize(page_index, scale, clip)?;
    encode_png(pixels)
}

/// One rendered page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page_index: usize,
    pub name: String,
    pub image: RasterImage,
    pub dpi: f64,
}

impl RenderedPage {
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }

    pub fn page_key(&self) -> String {
        naming::page_key(self.page_number())
    }
}

/// Every page of a document, in order
#[derive(Debug, Clone, Default)]
pub struct PageRenderSet {
    pub pages: Vec<RenderedPage>,
}

impl PageRenderSet {
    pub fn pages_rendered(&self) -> usize {
        self.pages.len()
    }
}

/// Render every page at `config.dpi`
///
/// A failing page aborts the whole call.
pub fn render_document(
    doc: &Document,
    config: &RasterConfig,
    prefix: &str,
) -> DocumentResult<PageRenderSet> {
    let scale = config.page_scale()?;
    let page_count = doc.page_count()?;
    let mut pages = Vec::with_capacity(page_count);

    for page_index in 0..page_count {
        let image = render_page(doc, page_index, scale, None)?;
        tracing::debug!(
            "Rendered page {}/{}: {}x{} px, {} bytes",
            page_index + 1,
            page_count,
            image.width_px,
            image.height_px,
            image.size_bytes()
        );
        pages.push(RenderedPage {
            page_index,
            name: naming::page_image_name(prefix, page_index + 1),
            image,
            dpi: config.dpi,
        });
    }

    Ok(PageRenderSet { pages })
}
