//! Region extraction endpoint
//!
//! Selections are render-space rectangles on the page images the caller
//! was given, so they are converted at the DPI those images were rendered
//! at: the request's `dpi`, else the session's render DPI, else the
//! configured page DPI. The response has one entry per selection, in input
//! order, whether it worked or not.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Document, ImageFormat};
use crate::error::Result;
use crate::raster::{extract_regions, naming, parse_selections, RegionResult};
use crate::state::AppState;

use super::common::{encode_data, run_blocking, DocumentSource, Status};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRegionsRequest {
    #[serde(flatten)]
    pub source: DocumentSource,
    #[serde(default)]
    pub selections: Value,
    /// DPI the selections were drawn at
    pub dpi: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionEntry {
    pub status: Status,
    pub selection_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_px: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_px: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RegionEntry {
    fn new(result: &RegionResult) -> Self {
        Self {
            status: Status::Error,
            selection_index: result.selection_index,
            page_index: result.page_index,
            page_number: result.page_number(),
            name: None,
            format: None,
            size_bytes: None,
            data: None,
            width_px: None,
            height_px: None,
            saved_to: None,
            error: None,
            message: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRegionsResponse {
    pub status: Status,
    pub total_selections: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<RegionEntry>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/regions", post(extract))
}

async fn extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractRegionsRequest>,
) -> Result<Json<ExtractRegionsResponse>> {
    let selections = parse_selections(&request.selections)?;
    let stored = request.source.resolve(&state)?;
    let prefix = naming::file_prefix(&stored.file_name);
    let selection_dpi = request
        .dpi
        .or(stored.render_dpi)
        .unwrap_or(state.config().raster.dpi);
    let config = state.config().raster.with_dpi(selection_dpi);
    config.page_scale()?;
    let engine = state.engine();
    let artifacts = state.artifacts().cloned();

    let results = run_blocking(&state, move || {
        let results = Document::with_open(engine.as_ref(), &stored.bytes, |doc| {
            extract_regions(doc, &selections, &config, &prefix)
        })?;

        let entries = results
            .iter()
            .map(|result| {
                let mut entry = RegionEntry::new(result);
                match &result.outcome {
                    Ok(region) => {
                        entry.status = Status::Success;
                        entry.saved_to = artifacts
                            .as_ref()
                            .and_then(|w| w.save(&region.name, &region.image.bytes))
                            .map(|p| p.display().to_string());
                        entry.name = Some(region.name.clone());
                        entry.format = Some(region.image.format);
                        entry.size_bytes = Some(region.image.size_bytes());
                        entry.data = Some(encode_data(&region.image.bytes));
                        entry.width_px = Some(region.image.width_px);
                        entry.height_px = Some(region.image.height_px);
                    }
                    Err(e) => {
                        entry.error = Some(e.kind());
                        entry.message = Some(e.public_message());
                    }
                }
                entry
            })
            .collect::<Vec<_>>();
        Ok(entries)
    })
    .await?;

    let total_selections = results.len();
    let succeeded = results
        .iter()
        .filter(|r| matches!(r.status, Status::Success))
        .count();
    let failed = total_selections - succeeded;
    tracing::info!(
        "Extracted {}/{} regions ({} failed)",
        succeeded,
        total_selections,
        failed
    );

    let status = match (succeeded, failed) {
        (_, 0) => Status::Success,
        (0, _) => Status::Error,
        _ => Status::Partial,
    };

    Ok(Json(ExtractRegionsResponse {
        status,
        total_selections,
        succeeded,
        failed,
        results,
    }))
}
