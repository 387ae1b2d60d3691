//! Coordinate transform between render-space and PDF-space
//!
//! Both directions are a uniform scale; the origin is shared. Validation of
//! the scale factor happens once, when the [`ScaleFactor`] is built.

use super::types::{PdfRect, RenderRect, ScaleFactor};

/// Map a render-space rectangle to PDF-space (divide by the scale)
pub fn to_pdf_space(rect: &RenderRect, scale: ScaleFactor) -> PdfRect {
    let s = scale.value();
    PdfRect::new(rect.x / s, rect.y / s, rect.width / s, rect.height / s)
}

/// Map a PDF-space rectangle to render-space (multiply by the scale)
pub fn to_render_space(rect: &PdfRect, scale: ScaleFactor) -> RenderRect {
    let s = scale.value();
    RenderRect::new(rect.x * s, rect.y * s, rect.width * s, rect.height * s)
}

/// Pixel extent of a length in points at the given scale
pub fn pixel_extent(points: f64, scale: ScaleFactor) -> u32 {
    let px = (points * scale.value()).round();
    if px <= 0.0 {
        0
    } else if px >= u32::MAX as f64 {
        u32::MAX
    } else {
        px as u32
    }
}

/// Integer pixel rectangle inside a rendered page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Pixel rectangle covered by `clip` on a page rendered at `scale`
    ///
    /// The origin and size are rounded independently so the output is
    /// `round(width * scale)` by `round(height * scale)`, then clamped to the
    /// rendered bitmap. Returns `None` when nothing is left after clamping.
    pub fn from_clip(
        clip: &PdfRect,
        scale: ScaleFactor,
        bitmap_width: u32,
        bitmap_height: u32,
    ) -> Option<Self> {
        let x = pixel_extent(clip.x, scale).min(bitmap_width);
        let y = pixel_extent(clip.y, scale).min(bitmap_height);
        let width = pixel_extent(clip.width, scale).min(bitmap_width - x);
        let height = pixel_extent(clip.height, scale).min(bitmap_height - y);

        if width == 0 || height == 0 {
            return None;
        }

        Some(Self {
            x,
            y,
            width,
            height,
        })
    }
}
