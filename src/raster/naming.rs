//! Artifact names
//!
//! Page numbers in names and keys are 1-based; ordinals are 0-based.

use crate::document::PdfRect;

const FALLBACK_PREFIX: &str = "document";

/// Prefix derived from a display name: basename, cut at the first `.`
pub fn file_prefix(display_name: &str) -> String {
    let base = display_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let stem = base.split('.').next().unwrap_or_default().trim();

    if stem.is_empty() {
        FALLBACK_PREFIX.to_string()
    } else {
        stem.to_string()
    }
}

pub fn page_key(page_number: usize) -> String {
    format!("page_{}", page_number)
}

pub fn page_image_name(prefix: &str, page_number: usize) -> String {
    format!("{}_p{}.png", prefix, page_number)
}

pub fn embedded_image_name(prefix: &str, page_number: usize, ordinal: usize, ext: &str) -> String {
    format!("{}_p{}_{}.{}", prefix, page_number, ordinal, ext)
}

/// Region names carry the PDF-space origin, truncated toward zero
pub fn region_image_name(prefix: &str, page_number: usize, rect: &PdfRect) -> String {
    format!(
        "{}_p{}_selecao_{}_{}.png",
        prefix,
        page_number,
        rect.x.trunc() as i64,
        rect.y.trunc() as i64
    )
}
