//! Batch region processing
//!
//! Selections arrive as raw JSON so that one malformed entry becomes an
//! error result at its index instead of rejecting the whole request.

use serde::Deserialize;
use serde_json::Value;

use crate::document::{
    to_pdf_space, Document, DocumentError, DocumentResult, RenderRect,
};

use super::region::{extract_region, RegionImage};
use super::RasterConfig;

/// A render-space selection on one page
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSelection {
    pub page_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RegionSelection {
    pub fn render_rect(&self) -> RenderRect {
        RenderRect::new(self.x, self.y, self.width, self.height)
    }
}

/// One entry of the incoming selection list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionInput {
    Valid(RegionSelection),
    Malformed {
        page_index: Option<usize>,
        reason: String,
    },
}

const COORDINATE_FIELDS: [&str; 4] = ["x", "y", "width", "height"];

impl SelectionInput {
    pub fn from_json(value: &Value) -> Self {
        match RegionSelection::deserialize(value) {
            Ok(selection) => SelectionInput::Valid(selection),
            Err(e) => {
                tracing::debug!("Selection rejected: {}", e);
                SelectionInput::Malformed {
                    page_index: value
                        .get("pageIndex")
                        .and_then(Value::as_u64)
                        .and_then(|i| usize::try_from(i).ok()),
                    reason: describe_malformed(value),
                }
            }
        }
    }

    pub fn page_index(&self) -> Option<usize> {
        match self {
            SelectionInput::Valid(selection) => Some(selection.page_index),
            SelectionInput::Malformed { page_index, .. } => *page_index,
        }
    }
}

/// Name the fields that kept `value` from being a selection
fn describe_malformed(value: &Value) -> String {
    let Some(fields) = value.as_object() else {
        return "Malformed selection: expected an object".to_string();
    };

    let mut invalid = Vec::new();
    if fields.get("pageIndex").and_then(Value::as_u64).is_none() {
        invalid.push("pageIndex");
    }
    invalid.extend(
        COORDINATE_FIELDS
            .iter()
            .copied()
            .filter(|key| !fields.get(*key).is_some_and(Value::is_number)),
    );

    if invalid.is_empty() {
        "Malformed selection".to_string()
    } else {
        format!("Malformed selection: missing or invalid {}", invalid.join(", "))
    }
}

/// Split a JSON selection list into per-item inputs
///
/// Only a non-array or empty array is rejected.
pub fn parse_selections(value: &Value) -> DocumentResult<Vec<SelectionInput>> {
    let items = value
        .as_array()
        .ok_or_else(|| DocumentError::InvalidBatch("selections must be a list".into()))?;
    if items.is_empty() {
        return Err(DocumentError::InvalidBatch("selections list is empty".into()));
    }
    Ok(items.iter().map(SelectionInput::from_json).collect())
}

/// Outcome for one selection, at its original position
#[derive(Debug)]
pub struct RegionResult {
    pub selection_index: usize,
    pub page_index: Option<usize>,
    pub outcome: DocumentResult<RegionImage>,
}

impl RegionResult {
    pub fn page_number(&self) -> Option<usize> {
        self.page_index.map(|i| i + 1)
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Extract every selection in order, isolating per-item failures
///
/// Selections are converted from render space at `config.dpi` and rendered
/// at `config.region_dpi`. The output has one entry per input.
pub fn extract_regions(
    doc: &Document,
    selections: &[SelectionInput],
    config: &RasterConfig,
    prefix: &str,
) -> DocumentResult<Vec<RegionResult>> {
    if selections.is_empty() {
        return Err(DocumentError::InvalidBatch("selections list is empty".into()));
    }
    let selection_scale = config.page_scale()?;
    let output_scale = config.region_scale()?;

    let results = selections
        .iter()
        .enumerate()
        .map(|(selection_index, input)| {
            let outcome = match input {
                SelectionInput::Valid(selection) => {
                    let rect = to_pdf_space(&selection.render_rect(), selection_scale);
                    tracing::debug!(
                        "Selection {} on page {}: {}",
                        selection_index,
                        selection.page_index + 1,
                        rect
                    );
                    extract_region(doc, selection.page_index, &rect, output_scale, prefix)
                }
                SelectionInput::Malformed { reason, .. } => {
                    Err(DocumentError::InvalidBatch(reason.clone()))
                }
            };

            if let Err(e) = &outcome {
                tracing::warn!("Selection {} failed: {}", selection_index, e);
            }

            RegionResult {
                selection_index,
                page_index: input.page_index(),
                outcome,
            }
        })
        .collect();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PdfRect;
    use crate::test_support::{FakeEngine, FakePage};
    use serde_json::json;

    fn selection(page_index: usize, x: f64, y: f64, w: f64, h: f64) -> SelectionInput {
        SelectionInput::Valid(RegionSelection {
            page_index,
            x,
            y,
            width: w,
            height: h,
        })
    }

    #[test]
    fn test_parse_rejects_non_list_and_empty() {
        assert!(matches!(
            parse_selections(&json!({"pageIndex": 0})),
            Err(DocumentError::InvalidBatch(_))
        ));
        assert!(matches!(
            parse_selections(&json!([])),
            Err(DocumentError::InvalidBatch(_))
        ));
    }

    #[test]
    fn test_parse_keeps_malformed_entries() {
        let inputs = parse_selections(&json!([
            {"pageIndex": 0, "x": 1, "y": 2, "width": 3, "height": 4},
            {"pageIndex": 1, "x": 1},
            "nonsense"
        ]))
        .unwrap();

        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0], selection(0, 1.0, 2.0, 3.0, 4.0));
        assert!(matches!(
            &inputs[1],
            SelectionInput::Malformed { page_index: Some(1), .. }
        ));
        assert_eq!(inputs[2].page_index(), None);
    }

    #[test]
    fn test_malformed_reason_names_fields() {
        let inputs = parse_selections(&json!([
            {"pageIndex": 1, "x": 1, "width": "wide"},
            {"pageIndex": -2, "x": 0, "y": 0, "width": 1, "height": 1},
            42
        ]))
        .unwrap();

        let reasons: Vec<&str> = inputs
            .iter()
            .map(|input| match input {
                SelectionInput::Malformed { reason, .. } => reason.as_str(),
                SelectionInput::Valid(_) => panic!("expected a malformed selection"),
            })
            .collect();
        assert_eq!(reasons[0], "Malformed selection: missing or invalid y, width, height");
        assert_eq!(reasons[1], "Malformed selection: missing or invalid pageIndex");
        assert_eq!(reasons[2], "Malformed selection: expected an object");
    }

    #[test]
    fn test_batch_isolates_out_of_range_page() {
        let engine = FakeEngine::letter(2);
        let selections = vec![
            selection(0, 300.0, 300.0, 600.0, 600.0),
            selection(7, 300.0, 300.0, 600.0, 600.0),
            selection(1, 0.0, 0.0, 300.0, 300.0),
        ];

        let results = Document::with_open(&engine, FakeEngine::BYTES, |doc| {
            extract_regions(doc, &selections, &RasterConfig::default(), "scan")
        })
        .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(matches!(
            results[1].outcome,
            Err(DocumentError::PageIndex { index: 7, .. })
        ));
        assert!(results[2].is_success());
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.selection_index, i);
        }
        assert_eq!(results[1].page_number(), Some(8));
        assert_eq!(engine.closed(), 1);
    }

    #[test]
    fn test_render_space_selection_to_600px() {
        let engine = FakeEngine::letter(1);
        let selections = vec![selection(0, 300.0, 300.0, 600.0, 600.0)];

        let results = Document::with_open(&engine, FakeEngine::BYTES, |doc| {
            extract_regions(doc, &selections, &RasterConfig::default(), "scan")
        })
        .unwrap();

        let region = results[0].outcome.as_ref().unwrap();
        assert!((region.rect.x - 72.0).abs() < 1e-9);
        assert!((region.rect.width - 144.0).abs() < 1e-9);
        assert!((region.image.width_px as i64 - 600).abs() <= 1);
        assert!((region.image.height_px as i64 - 600).abs() <= 1);
        assert_eq!(region.name, "scan_p1_selecao_72_72.png");
    }

    #[test]
    fn test_malformed_and_out_of_bounds_do_not_abort() {
        let engine = FakeEngine::letter(1);
        let selections = vec![
            SelectionInput::Malformed {
                page_index: Some(0),
                reason: "missing width".into(),
            },
            selection(0, 2500.0, 3200.0, 200.0, 200.0),
            selection(0, 0.0, 0.0, 100.0, 100.0),
        ];

        let results = Document::with_open(&engine, FakeEngine::BYTES, |doc| {
            extract_regions(doc, &selections, &RasterConfig::default(), "scan")
        })
        .unwrap();

        assert!(matches!(results[0].outcome, Err(DocumentError::InvalidBatch(_))));
        assert!(matches!(results[1].outcome, Err(DocumentError::OutOfBounds { .. })));
        assert!(results[2].is_success());
    }

    #[test]
    fn test_render_failure_stays_at_its_index() {
        let engine = FakeEngine::new(vec![FakePage::letter(), FakePage::broken_render()]);
        let selections = vec![
            selection(0, 0.0, 0.0, 300.0, 300.0),
            selection(1, 0.0, 0.0, 300.0, 300.0),
            selection(0, 600.0, 600.0, 300.0, 300.0),
        ];

        let results = Document::with_open(&engine, FakeEngine::BYTES, |doc| {
            extract_regions(doc, &selections, &RasterConfig::default(), "scan")
        })
        .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(matches!(results[1].outcome, Err(DocumentError::RenderError(_))));
        assert_eq!(results[1].selection_index, 1);
        assert_eq!(results[1].page_number(), Some(2));
        assert!(results[2].is_success());
        assert_eq!(engine.rendered(), 2);
        assert_eq!(engine.closed(), 1);
    }

    #[test]
    fn test_selection_dpi_follows_page_dpi() {
        let engine = FakeEngine::letter(1);
        let config = RasterConfig::default().with_dpi(72.0);
        // Bottom-right quarter of a page image rendered at 72 dpi
        let selections = vec![selection(0, 306.0, 396.0, 306.0, 396.0)];

        let results = Document::with_open(&engine, FakeEngine::BYTES, |doc| {
            extract_regions(doc, &selections, &config, "scan")
        })
        .unwrap();

        let region = results[0].outcome.as_ref().unwrap();
        assert_eq!(region.rect, PdfRect::new(306.0, 396.0, 306.0, 396.0));
        assert_eq!(region.name, "scan_p1_selecao_306_396.png");
        assert_eq!((region.image.width_px, region.image.height_px), (1275, 1650));
    }

    #[test]
    fn test_region_dpi_changes_output_size() {
        let engine = FakeEngine::letter(1);
        let config = RasterConfig {
            region_dpi: 150.0,
            ..RasterConfig::default()
        };
        let selections = vec![selection(0, 300.0, 300.0, 600.0, 600.0)];

        let results = Document::with_open(&engine, FakeEngine::BYTES, |doc| {
            extract_regions(doc, &selections, &config, "scan")
        })
        .unwrap();

        let region = results[0].outcome.as_ref().unwrap();
        assert!((region.image.width_px as i64 - 300).abs() <= 1);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let engine = FakeEngine::letter(1);
        let doc = Document::open(&engine, FakeEngine::BYTES).unwrap();
        let err = extract_regions(&doc, &[], &RasterConfig::default(), "scan").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidBatch(_)));
    }
}
