//! Embedded image extraction endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;
use crate::raster::{extract_embedded_images, naming, EmbeddedFailure};
use crate::state::AppState;

use super::common::{encode_data, run_blocking, DocumentSource, PageMap, Status};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractImagesRequest {
    #[serde(flatten)]
    pub source: DocumentSource,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedImageEntry {
    pub name: String,
    pub format: String,
    pub size_bytes: usize,
    pub data: String,
    pub page_index: usize,
    pub page_number: usize,
    pub width_px: u32,
    pub height_px: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractImagesResponse {
    pub status: Status,
    pub message: String,
    pub total_images: usize,
    pub pages: PageMap<EmbeddedImageEntry>,
    pub failures: Vec<EmbeddedFailure>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/embedded-images", post(extract))
}

async fn extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractImagesRequest>,
) -> Result<Json<ExtractImagesResponse>> {
    let stored = request.source.resolve(&state)?;
    let prefix = naming::file_prefix(&stored.file_name);
    let engine = state.engine();
    let artifacts = state.artifacts().cloned();

    let (total_images, pages, failures) = run_blocking(&state, move || {
        let extraction = Document::with_open(engine.as_ref(), &stored.bytes, |doc| {
            extract_embedded_images(doc, &prefix)
        })?;
        let total_images = extraction.total_images();

        let pages = extraction
            .pages
            .into_iter()
            .map(|page| {
                let key = page.page_key();
                let entries = page
                    .images
                    .into_iter()
                    .map(|image| EmbeddedImageEntry {
                        saved_to: artifacts
                            .as_ref()
                            .and_then(|w| w.save(&image.name, &image.bytes))
                            .map(|p| p.display().to_string()),
                        size_bytes: image.size_bytes(),
                        data: encode_data(&image.bytes),
                        page_index: image.page_index,
                        page_number: image.page_number(),
                        width_px: image.width_px,
                        height_px: image.height_px,
                        name: image.name,
                        format: image.format,
                    })
                    .collect::<Vec<_>>();
                (key, entries)
            })
            .collect::<Vec<_>>();
        Ok((total_images, pages, extraction.failures))
    })
    .await?;

    tracing::info!(
        "Extracted {} embedded images ({} failed)",
        total_images,
        failures.len()
    );

    Ok(Json(ExtractImagesResponse {
        status: if failures.is_empty() {
            Status::Success
        } else {
            Status::Partial
        },
        message: format!("{} image(s) extracted", total_images),
        total_images,
        pages: PageMap(pages),
        failures,
    }))
}
