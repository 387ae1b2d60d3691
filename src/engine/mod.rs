//! PDF engine implementations
//!
//! MuPDF does layout and rasterization; lopdf reads image XObjects.

mod mupdf_backend;
mod pixmap;
mod xobject;

pub use mupdf_backend::{MupdfDocument, MupdfEngine};
