//! Guarded document handle
//!
//! Wraps an engine document so that its native resources are released
//! exactly once on every exit path: explicit [`Document::close`], early `?`
//! returns, panics unwinding through the owner, or plain drop.

use super::error::{DocumentError, Result};
use super::traits::{EngineDocument, PdfEngine};
use super::types::{
    DocumentFormat, EmbeddedImage, PageGeometry, PdfRect, RgbPixels, ScaleFactor,
};

/// Opened document with cached page geometry
pub struct Document {
    inner: Option<Box<dyn EngineDocument>>,
    pages: Vec<PageGeometry>,
}

impl Document {
    /// Open `data` through `engine`
    ///
    /// Fails with [`DocumentError::DocumentOpen`] for empty input, a buffer
    /// without a PDF header, or anything the engine refuses to load.
    pub fn open(engine: &dyn PdfEngine, data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(DocumentError::DocumentOpen("document is empty".into()));
        }
        if DocumentFormat::from_magic_bytes(data).is_none() {
            return Err(DocumentError::DocumentOpen(
                "not a recognized PDF document".into(),
            ));
        }

        let inner = engine.open(data).map_err(|e| {
            tracing::warn!("{} refused document ({} bytes): {}", engine.name(), data.len(), e);
            DocumentError::DocumentOpen("document is damaged or not a readable PDF".into())
        })?;

        // From here on the guard owns the engine document, so a failure while
        // reading geometry still releases it.
        let mut doc = Self {
            inner: Some(inner),
            pages: Vec::new(),
        };

        let page_count = doc.engine()?.page_count();
        doc.pages.reserve(page_count);
        for index in 0..page_count {
            let geometry = doc.engine()?.page_geometry(index).map_err(|e| {
                tracing::warn!("Page {} geometry unreadable: {}", index + 1, e);
                DocumentError::DocumentOpen(format!("page {} has no readable size", index + 1))
            })?;
            doc.pages.push(geometry);
        }

        tracing::debug!(
            "Opened document via {} ({} bytes, {} pages)",
            engine.name(),
            data.len(),
            page_count
        );

        Ok(doc)
    }

    /// Open, run `f`, and close regardless of the outcome
    pub fn with_open<F, R>(engine: &dyn PdfEngine, data: &[u8], f: F) -> Result<R>
    where
        F: FnOnce(&Document) -> Result<R>,
    {
        let mut doc = Self::open(engine, data)?;
        let result = f(&doc);
        doc.close();
        result
    }

    fn engine(&self) -> Result<&dyn EngineDocument> {
        self.inner.as_deref().ok_or(DocumentError::UseAfterClose)
    }

    /// Number of pages
    pub fn page_count(&self) -> Result<usize> {
        self.engine()?;
        Ok(self.pages.len())
    }

    /// Geometry of page `index`
    pub fn page_geometry(&self, index: usize) -> Result<PageGeometry> {
        self.engine()?;
        self.pages
            .get(index)
            .copied()
            .ok_or(DocumentError::PageIndex {
                index,
                page_count: self.pages.len(),
            })
    }

    /// Rasterize page `index` (or a clip of it) to RGB pixels
    pub fn rasterize(
        &self,
        index: usize,
        scale: ScaleFactor,
        clip: Option<&PdfRect>,
    ) -> Result<RgbPixels> {
        let engine = self.engine()?;
        self.page_geometry(index)?;
        engine.rasterize(index, scale, clip)
    }

    /// Embedded images of page `index`
    pub fn embedded_images(&self, index: usize) -> Result<Vec<Result<EmbeddedImage>>> {
        let engine = self.engine()?;
        self.page_geometry(index)?;
        engine.embedded_images(index)
    }

    /// Release the engine document; later calls fail with `UseAfterClose`
    pub fn close(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            inner.close();
            tracing::debug!("Closed document ({} pages)", self.pages.len());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.close();
    }
}
