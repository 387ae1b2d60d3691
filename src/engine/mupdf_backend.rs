//! MuPDF-backed engine
//!
//! MuPDF documents are not thread-safe and not `Send`, so an
//! [`MupdfDocument`] is created, used and dropped inside one blocking task.
//! The factory itself holds no state and is shared freely.
//!
//! Embedded image streams are read with lopdf from the same bytes; MuPDF
//! only ever sees the buffer for layout and rasterization.

use std::cell::OnceCell;

use lopdf::Document as ObjectTree;
use mupdf::{Colorspace, Device, Document as MuDocument, IRect, Matrix, Pixmap};

use crate::document::transform::pixel_extent;
use crate::document::{
    DocumentError, DocumentFormat, DocumentResult, EmbeddedImage, EngineDocument, PageGeometry,
    PdfEngine, PdfRect, PixelRect, RgbPixels, ScaleFactor,
};

use super::pixmap::pixmap_to_rgb;
use super::xobject;

/// Production engine
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfEngine;

impl MupdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for MupdfEngine {
    fn name(&self) -> &'static str {
        "mupdf"
    }

    fn open(&self, data: &[u8]) -> DocumentResult<Box<dyn EngineDocument>> {
        let doc = MuDocument::from_bytes(data, DocumentFormat::Pdf.mime())
            .map_err(|e| DocumentError::DocumentOpen(e.to_string()))?;
        let page_count = doc
            .page_count()
            .map_err(|e| DocumentError::DocumentOpen(e.to_string()))?;
        let page_count = usize::try_from(page_count).map_err(|_| {
            DocumentError::DocumentOpen(format!("invalid page count {}", page_count))
        })?;

        Ok(Box::new(MupdfDocument {
            doc: Some(doc),
            source: data.to_vec(),
            objects: OnceCell::new(),
            page_count,
        }))
    }
}

/// One opened MuPDF document plus a lazily parsed object tree
pub struct MupdfDocument {
    doc: Option<MuDocument>,
    source: Vec<u8>,
    objects: OnceCell<ObjectTree>,
    page_count: usize,
}

impl MupdfDocument {
    fn doc(&self) -> DocumentResult<&MuDocument> {
        self.doc.as_ref().ok_or(DocumentError::UseAfterClose)
    }

    fn load_page(&self, index: usize) -> DocumentResult<mupdf::Page> {
        let page_num = i32::try_from(index).map_err(|_| DocumentError::PageIndex {
            index,
            page_count: self.page_count,
        })?;
        Ok(self.doc()?.load_page(page_num)?)
    }

    fn objects(&self) -> DocumentResult<&ObjectTree> {
        self.doc()?;
        if let Some(tree) = self.objects.get() {
            return Ok(tree);
        }
        let parsed = ObjectTree::load_mem(&self.source)?;
        Ok(self.objects.get_or_init(|| parsed))
    }
}

impl EngineDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_geometry(&self, index: usize) -> DocumentResult<PageGeometry> {
        let bounds = self.load_page(index)?.bounds()?;
        Ok(PageGeometry::new(
            index,
            f64::from(bounds.x1 - bounds.x0),
            f64::from(bounds.y1 - bounds.y0),
        ))
    }

    fn rasterize(
        &self,
        index: usize,
        scale: ScaleFactor,
        clip: Option<&PdfRect>,
    ) -> DocumentResult<RgbPixels> {
        let page = self.load_page(index)?;

        let factor = scale.value() as f32;
        let matrix = Matrix::new_scale(factor, factor);
        let colorspace = Colorspace::device_rgb();

        let pixmap = match clip {
            None => page.to_pixmap(&matrix, &colorspace, false, true)?,
            Some(rect) => render_clip(&page, &matrix, &colorspace, rect, scale)?,
        };
        let pixels = pixmap_to_rgb(&pixmap)?;

        tracing::debug!(
            "Rasterized page {} at scale {:.4}{}: {}x{} px",
            index,
            scale.value(),
            if clip.is_some() { " (clip)" } else { "" },
            pixels.width,
            pixels.height
        );

        Ok(pixels)
    }

    fn embedded_images(&self, index: usize) -> DocumentResult<Vec<DocumentResult<EmbeddedImage>>> {
        xobject::page_images(self.objects()?, index)
    }

    fn close(&mut self) {
        self.doc.take();
        self.objects.take();
    }
}

/// Draw only the pixels of `clip` into a pixmap sized to it
///
/// The pixmap sits at the clip's device-space origin, so the page is run
/// with the plain scale matrix and everything outside is discarded by the
/// draw device.
fn render_clip(
    page: &mupdf::Page,
    matrix: &Matrix,
    colorspace: &Colorspace,
    clip: &PdfRect,
    scale: ScaleFactor,
) -> DocumentResult<Pixmap> {
    let bounds = page.bounds()?;
    let page_w = pixel_extent(f64::from(bounds.x1 - bounds.x0), scale);
    let page_h = pixel_extent(f64::from(bounds.y1 - bounds.y0), scale);
    let px = PixelRect::from_clip(clip, scale, page_w, page_h).ok_or_else(|| {
        DocumentError::RenderError(format!("clip {} covers no pixels at this scale", clip))
    })?;

    let origin_x = (f64::from(bounds.x0) * scale.value()).round();
    let origin_y = (f64::from(bounds.y0) * scale.value()).round();
    let area = device_rect(origin_x, origin_y, &px)?;

    let mut pixmap = Pixmap::new_with_rect(colorspace, area, false)?;
    pixmap.clear_with(255)?;
    {
        // Dropping the device closes it and flushes pending drawing
        let device = Device::from_pixmap(&pixmap)?;
        page.run(&device, matrix)?;
    }
    Ok(pixmap)
}

fn device_rect(origin_x: f64, origin_y: f64, px: &PixelRect) -> DocumentResult<IRect> {
    let to_i32 = |v: f64| {
        if v.is_finite() && v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX) {
            Ok(v as i32)
        } else {
            Err(DocumentError::RenderError("clip exceeds device space".into()))
        }
    };
    let x0 = to_i32(origin_x + f64::from(px.x))?;
    let y0 = to_i32(origin_y + f64::from(px.y))?;
    Ok(IRect {
        x0,
        y0,
        x1: to_i32(f64::from(x0) + f64::from(px.width))?,
        y1: to_i32(f64::from(y0) + f64::from(px.height))?,
    })
}
