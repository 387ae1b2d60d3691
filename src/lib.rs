//! PageCut Server Library
//!
//! Rasterizes PDF pages, extracts embedded images and crops render-space
//! selections back out of the page at full quality.
//!
//! # Modules
//!
//! - `document`: Engine-agnostic document handle, geometry and transforms
//! - `engine`: MuPDF-backed engine
//! - `raster`: Page, embedded image and region pipelines
//! - `routes`: HTTP surface

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod raster;
pub mod routes;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use engine::MupdfEngine;
pub use state::AppState;
