//! Rasterization pipelines
//!
//! Everything here operates on an opened [`Document`](crate::document::Document)
//! and is engine-agnostic:
//!
//! - `rasterizer` - full-page render and PNG encoding
//! - `embedded` - embedded image extraction
//! - `region` - single validated region crop
//! - `batch` - ordered selection lists with per-item failures
//! - `artifacts` - optional copies of every produced image on disk

mod artifacts;
mod batch;
mod embedded;
pub mod naming;
mod rasterizer;
mod region;

pub use artifacts::ArtifactWriter;
pub use batch::{extract_regions, parse_selections, RegionResult, RegionSelection, SelectionInput};
pub use embedded::{extract_embedded_images, EmbeddedExtraction, EmbeddedFailure, EmbeddedPage};
pub use rasterizer::{encode_png, render_document, render_page, PageRenderSet, RenderedPage};
pub use region::{extract_region, RegionImage};

use crate::document::{DocumentResult, ScaleFactor, DEFAULT_DPI, POINTS_PER_INCH};

/// Resolution settings passed explicitly into every pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterConfig {
    /// DPI for full-page renders; selections are expressed in this space
    pub dpi: f64,
    /// DPI at which selected regions are re-rendered
    pub region_dpi: f64,
    pub points_per_inch: f64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            region_dpi: DEFAULT_DPI,
            points_per_inch: POINTS_PER_INCH,
        }
    }
}

impl RasterConfig {
    /// Same settings with a different page DPI
    pub fn with_dpi(self, dpi: f64) -> Self {
        Self { dpi, ..self }
    }

    pub fn page_scale(&self) -> DocumentResult<ScaleFactor> {
        ScaleFactor::from_dpi(self.dpi, self.points_per_inch)
    }

    pub fn region_scale(&self) -> DocumentResult<ScaleFactor> {
        ScaleFactor::from_dpi(self.region_dpi, self.points_per_inch)
    }
}
