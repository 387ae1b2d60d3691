//! Document abstraction
//!
//! Engine-agnostic handle, geometry and coordinate transform.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Document (handle.rs)                    │
//! │   open → page_count / page_geometry / rasterize → close │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │        PdfEngine / EngineDocument (traits.rs)        │
//!   │   MupdfEngine in production, FakeEngine in tests     │
//!   └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use pagecut_server::document::{Document, ScaleFactor};
//! use pagecut_server::engine::MupdfEngine;
//!
//! let pixels = Document::with_open(&MupdfEngine::new(), &bytes, |doc| {
//!     doc.rasterize(0, ScaleFactor::default(), None)
//! })?;
//! ```

mod error;
mod handle;
mod traits;
pub mod transform;
mod types;

pub use error::{DocumentError, DocumentResult, Result};
pub use handle::Document;
pub use traits::{EngineDocument, PdfEngine};
pub use transform::{to_pdf_space, to_render_space, PixelRect};
pub use types::{
    DocumentFormat, EmbeddedImage, EmbeddedImageRecord, ImageFormat, PageGeometry, PdfRect,
    RasterImage, RenderRect, RgbPixels, ScaleFactor, DEFAULT_DPI, POINTS_PER_INCH,
};
