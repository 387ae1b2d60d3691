//! Embedded image extraction
//!
//! Pulls already-encoded image streams out of each page without
//! re-rendering. Pages with no images still get an (empty) entry.

use serde::Serialize;

use crate::document::{Document, DocumentError, DocumentResult, EmbeddedImageRecord};

use super::naming;

/// Images found on one page
#[derive(Debug, Clone)]
pub struct EmbeddedPage {
    pub page_index: usize,
    pub images: Vec<EmbeddedImageRecord>,
}

impl EmbeddedPage {
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }

    pub fn page_key(&self) -> String {
        naming::page_key(self.page_number())
    }
}

/// An image that was found but could not be decoded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedFailure {
    pub page_index: usize,
    pub ordinal: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct EmbeddedExtraction {
    pub pages: Vec<EmbeddedPage>,
    pub failures: Vec<EmbeddedFailure>,
}

impl EmbeddedExtraction {
    pub fn total_images(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }
}

/// Extract every embedded image of `doc`
///
/// A single undecodable image is recorded in `failures` and keeps its
/// ordinal slot; a page whose resources cannot be walked fails the call.
pub fn extract_embedded_images(doc: &Document, prefix: &str) -> DocumentResult<EmbeddedExtraction> {
    let page_count = doc.page_count()?;
    if page_count == 0 {
        return Err(DocumentError::EmptyDocument(
            "document has no pages".into(),
        ));
    }

    let mut extraction = EmbeddedExtraction::default();

    for page_index in 0..page_count {
        let found = doc.embedded_images(page_index).map_err(|e| match e {
            DocumentError::ExtractionError(msg) => DocumentError::ExtractionError(format!(
                "page {}: {}",
                page_index + 1,
                msg
            )),
            other => DocumentError::ExtractionError(format!(
                "page {}: {}",
                page_index + 1,
                other
            )),
        })?;

        let mut images = Vec::with_capacity(found.len());
        for (ordinal, result) in found.into_iter().enumerate() {
            match result {
                Ok(image) => {
                    tracing::debug!(
                        "Page {} image {}: xref {}, {}x{} {}",
                        page_index + 1,
                        ordinal,
                        image.xref,
                        image.width,
                        image.height,
                        image.ext
                    );
                    images.push(EmbeddedImageRecord {
                        page_index,
                        ordinal_on_page: ordinal,
                        name: naming::embedded_image_name(
                            prefix,
                            page_index + 1,
                            ordinal,
                            &image.ext,
                        ),
                        format: image.ext,
                        bytes: image.bytes,
                        width_px: image.width,
                        height_px: image.height,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping image {} on page {}: {}",
                        ordinal,
                        page_index + 1,
                        e
                    );
                    extraction.failures.push(EmbeddedFailure {
                        page_index,
                        ordinal,
                        message: e.public_message(),
                    });
                }
            }
        }

        tracing::debug!("Page {}: {} embedded images", page_index + 1, images.len());
        extraction.pages.push(EmbeddedPage { page_index, images });
    }

    Ok(extraction)
}
