//! Document error types
//!
//! Every failure the core can surface, from opening the byte buffer to
//! cropping a single region.

use std::time::Duration;

use thiserror::Error;

use super::types::PdfRect;

/// Unified document error type
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Input bytes are empty, truncated or not a PDF
    #[error("Failed to open document: {0}")]
    DocumentOpen(String),

    /// Page index outside `[0, page_count)`
    #[error("Page index {index} out of range (document has {page_count} pages)")]
    PageIndex { index: usize, page_count: usize },

    /// Rectangle not contained in the page
    #[error(
        "Region {rect} exceeds page {page_index} bounds (page is {page_width:.2} x {page_height:.2} pt)"
    )]
    OutOfBounds {
        page_index: usize,
        rect: PdfRect,
        page_width: f64,
        page_height: f64,
    },

    /// Rectangle inside the page but too small to cover a single pixel
    #[error("Region {rect} on page {page_index} covers no pixels at this resolution")]
    EmptyRegion { page_index: usize, rect: PdfRect },

    /// Scale factor not strictly positive
    #[error("Invalid scale factor: {0}")]
    InvalidScale(f64),

    /// Underlying rasterization failure
    #[error("Render error: {0}")]
    RenderError(String),

    /// Embedded image enumeration or decode failure
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// Document has no pages
    #[error("Document is empty: {0}")]
    EmptyDocument(String),

    /// Selection list is empty or not a list
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// Operation on a handle after `close()`
    #[error("Document used after close")]
    UseAfterClose,

    /// Image encoding error
    #[error("Image error: {0}")]
    ImageError(String),

    /// Timeout error
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl DocumentError {
    /// Stable machine-readable kind, used in per-item results and HTTP bodies
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentError::DocumentOpen(_) => "document_open",
            DocumentError::PageIndex { .. } => "page_index",
            DocumentError::OutOfBounds { .. } => "out_of_bounds",
            DocumentError::EmptyRegion { .. } => "empty_region",
            DocumentError::InvalidScale(_) => "invalid_scale",
            DocumentError::RenderError(_) => "render_error",
            DocumentError::ExtractionError(_) => "extraction_error",
            DocumentError::EmptyDocument(_) => "empty_document",
            DocumentError::InvalidBatch(_) => "invalid_batch",
            DocumentError::UseAfterClose => "use_after_close",
            DocumentError::ImageError(_) => "image_error",
            DocumentError::Timeout(_) => "timeout",
        }
    }

    /// Whether the failure was caused by the caller's input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocumentError::DocumentOpen(_)
                | DocumentError::PageIndex { .. }
                | DocumentError::OutOfBounds { .. }
                | DocumentError::EmptyRegion { .. }
                | DocumentError::InvalidScale(_)
                | DocumentError::EmptyDocument(_)
                | DocumentError::InvalidBatch(_)
        )
    }

    /// Message safe to hand back to a caller
    ///
    /// Client errors describe the caller's input and are returned as is.
    /// Server-side failures carry engine text, so only a summary goes out;
    /// the detail belongs in the logs.
    pub fn public_message(&self) -> String {
        match self {
            DocumentError::RenderError(_) => "Page could not be rendered".to_string(),
            DocumentError::ExtractionError(_) => "Embedded image could not be decoded".to_string(),
            DocumentError::ImageError(_) => "Image could not be encoded".to_string(),
            DocumentError::UseAfterClose => "Document is no longer available".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Alias used by the pipeline modules
pub type DocumentResult<T> = Result<T>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::RenderError(err.to_string())
    }
}

impl From<lopdf::Error> for DocumentError {
    fn from(err: lopdf::Error) -> Self {
        DocumentError::ExtractionError(err.to_string())
    }
}

impl From<image::ImageError> for DocumentError {
    fn from(err: image::ImageError) -> Self {
        DocumentError::ImageError(err.to_string())
    }
}
