//! Single-region extraction

use crate::document::transform::pixel_extent;
use crate::document::{
    Document, DocumentError, DocumentResult, PdfRect, PixelRect, RasterImage, ScaleFactor,
};

use super::naming;
use super::rasterizer::render_page;

/// A cropped and re-rendered page region
#[derive(Debug, Clone)]
pub struct RegionImage {
    pub page_index: usize,
    pub rect: PdfRect,
    pub name: String,
    pub image: RasterImage,
}

impl RegionImage {
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }
}

/// Render `rect` (PDF space) of page `page_index` at `scale`
///
/// Fails with `PageIndex` for an unknown page, `OutOfBounds` when the
/// rectangle is not fully inside the page and `EmptyRegion` when it would
/// come out zero pixels wide or tall at `scale`.
pub fn extract_region(
    doc: &Document,
    page_index: usize,
    rect: &PdfRect,
    scale: ScaleFactor,
    prefix: &str,
) -> DocumentResult<RegionImage> {
    let page = doc.page_geometry(page_index)?;
    if !page.contains(rect) {
        return Err(DocumentError::OutOfBounds {
            page_index,
            rect: *rect,
            page_width: page.width_pt,
            page_height: page.height_pt,
        });
    }

    let page_px = (
        pixel_extent(page.width_pt, scale),
        pixel_extent(page.height_pt, scale),
    );
    if PixelRect::from_clip(rect, scale, page_px.0, page_px.1).is_none() {
        return Err(DocumentError::EmptyRegion {
            page_index,
            rect: *rect,
        });
    }

    let image = render_page(doc, page_index, scale, Some(rect))?;

    Ok(RegionImage {
        page_index,
        rect: *rect,
        name: naming::region_image_name(prefix, page_index + 1, rect),
        image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::POINTS_PER_INCH;
    use crate::test_support::FakeEngine;

    fn open(engine: &FakeEngine) -> Document {
        Document::open(engine, FakeEngine::BYTES).unwrap()
    }

    #[test]
    fn test_full_page_is_valid() {
        let engine = FakeEngine::letter(1);
        let doc = open(&engine);
        let full = doc.page_geometry(0).unwrap().full_rect();

        let region = extract_region(&doc, 0, &full, ScaleFactor::default(), "scan").unwrap();
        assert_eq!((region.image.width_px, region.image.height_px), (2550, 3300));
        assert_eq!(region.name, "scan_p1_selecao_0_0.png");
    }

    #[test]
    fn test_negative_origin_is_out_of_bounds() {
        let engine = FakeEngine::letter(1);
        let doc = open(&engine);
        let rect = PdfRect::new(-1.0, 0.0, 10.0, 10.0);

        let err = extract_region(&doc, 0, &rect, ScaleFactor::default(), "scan").unwrap_err();
        match err {
            DocumentError::OutOfBounds {
                page_width,
                page_height,
                ..
            } => {
                assert_eq!((page_width, page_height), (612.0, 792.0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(engine.rendered(), 0);
    }

    #[test]
    fn test_overflowing_rect_is_out_of_bounds() {
        let engine = FakeEngine::letter(1);
        let doc = open(&engine);
        let rect = PdfRect::new(600.0, 700.0, 20.0, 20.0);

        let err = extract_region(&doc, 0, &rect, ScaleFactor::default(), "scan").unwrap_err();
        assert!(matches!(err, DocumentError::OutOfBounds { page_index: 0, .. }));
        assert!(err.to_string().contains("612"));
    }

    #[test]
    fn test_sub_pixel_rect_is_client_error() {
        let engine = FakeEngine::letter(1);
        let doc = open(&engine);
        let rect = PdfRect::new(100.0, 100.0, 0.1, 50.0);

        let err = extract_region(&doc, 0, &rect, ScaleFactor::default(), "scan").unwrap_err();
        assert!(matches!(err, DocumentError::EmptyRegion { page_index: 0, .. }));
        assert!(err.is_client_error());
        assert_eq!(engine.rendered(), 0);
    }

    #[test]
    fn test_unknown_page() {
        let engine = FakeEngine::letter(2);
        let doc = open(&engine);
        let rect = PdfRect::new(0.0, 0.0, 10.0, 10.0);

        let err = extract_region(&doc, 5, &rect, ScaleFactor::default(), "scan").unwrap_err();
        assert!(matches!(err, DocumentError::PageIndex { index: 5, page_count: 2 }));
    }

    #[test]
    fn test_inch_square_at_300_dpi() {
        let engine = FakeEngine::letter(1);
        let doc = open(&engine);
        let rect = PdfRect::new(72.0, 72.0, 144.0, 144.0);
        let scale = ScaleFactor::from_dpi(300.0, POINTS_PER_INCH).unwrap();

        let region = extract_region(&doc, 0, &rect, scale, "scan").unwrap();
        assert!((region.image.width_px as i64 - 600).abs() <= 1);
        assert!((region.image.height_px as i64 - 600).abs() <= 1);
        assert_eq!(region.name, "scan_p1_selecao_72_72.png");
        assert_eq!(region.page_number(), 1);
    }
}
