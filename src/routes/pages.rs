//! Full-page render endpoint
//!
//! Renders every page of an uploaded PDF and opens a session so later
//! region and embedded-image requests can reuse the document.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{Document, ImageFormat};
use crate::error::Result;
use crate::raster::{naming, render_document};
use crate::session::StoredDocument;
use crate::state::AppState;

use super::common::{decode_data, encode_data, run_blocking, PageMap, Status};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPagesRequest {
    pub file_name: String,
    pub data: String,
    /// Overrides the configured page DPI
    pub dpi: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageImageEntry {
    pub name: String,
    pub format: ImageFormat,
    pub size_bytes: usize,
    pub data: String,
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPagesResponse {
    pub status: Status,
    pub message: String,
    pub session_id: Uuid,
    pub pages_rendered: usize,
    pub pages: PageMap<PageImageEntry>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/pages", post(render_pages))
}

async fn render_pages(
    State(state): State<AppState>,
    Json(request): Json<RenderPagesRequest>,
) -> Result<Json<RenderPagesResponse>> {
    let config = match request.dpi {
        Some(dpi) => state.config().raster.with_dpi(dpi),
        None => state.config().raster,
    };
    // Fail fast on a bad DPI before decoding anything
    config.page_scale()?;

    let bytes = decode_data(&request.data)?;
    let stored = StoredDocument::rendered(request.file_name, bytes, config.dpi);
    let prefix = naming::file_prefix(&stored.file_name);
    let engine = state.engine();
    let artifacts = state.artifacts().cloned();
    let job_doc = Arc::clone(&stored);

    let pages = run_blocking(&state, move || {
        let set = Document::with_open(engine.as_ref(), &job_doc.bytes, |doc| {
            render_document(doc, &config, &prefix)
        })?;

        let pages = set
            .pages
            .into_iter()
            .map(|page| {
                let saved_to = artifacts
                    .as_ref()
                    .and_then(|w| w.save(&page.name, &page.image.bytes))
                    .map(|p| p.display().to_string());
                let key = page.page_key();
                let entry = PageImageEntry {
                    size_bytes: page.image.size_bytes(),
                    data: encode_data(&page.image.bytes),
                    format: page.image.format,
                    width_px: page.image.width_px,
                    height_px: page.image.height_px,
                    dpi: page.dpi,
                    name: page.name,
                    saved_to,
                };
                (key, vec![entry])
            })
            .collect::<Vec<_>>();
        Ok(pages)
    })
    .await?;

    let session_id = state.sessions().insert(stored);
    let pages_rendered = pages.len();
    tracing::info!(
        "Rendered {} pages at {} dpi (session {})",
        pages_rendered,
        config.dpi,
        session_id
    );

    Ok(Json(RenderPagesResponse {
        status: Status::Success,
        message: format!("{} page(s) rendered", pages_rendered),
        session_id,
        pages_rendered,
        pages: PageMap(pages),
    }))
}
