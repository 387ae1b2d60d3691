//! Shared request plumbing: document sources, base64 and blocking work

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::document::{DocumentError, DocumentResult};
use crate::error::{AppError, Result};
use crate::session::StoredDocument;
use crate::state::AppState;

/// Either a session id or an inline document
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSource {
    pub session_id: Option<Uuid>,
    pub file_name: Option<String>,
    pub data: Option<String>,
}

impl DocumentSource {
    /// Resolve to document bytes, preferring the session when both are given
    pub fn resolve(&self, state: &AppState) -> Result<Arc<StoredDocument>> {
        if let Some(id) = self.session_id {
            return state
                .sessions()
                .get(&id)
                .ok_or_else(|| AppError::NotFound(format!("Session not found: {}", id)));
        }

        match (&self.file_name, &self.data) {
            (Some(file_name), Some(data)) => {
                Ok(StoredDocument::new(file_name.clone(), decode_data(data)?))
            }
            _ => Err(AppError::BadRequest(
                "Provide either sessionId or both fileName and data".to_string(),
            )),
        }
    }
}

/// Decode a base64 payload, tolerating a `data:...;base64,` prefix
pub fn decode_data(data: &str) -> Result<Vec<u8>> {
    let payload = match data.split_once("base64,") {
        Some((head, rest)) if head.starts_with("data:") => rest,
        _ => data,
    };
    BASE64
        .decode(payload.trim())
        .map_err(|e| AppError::BadRequest(format!("data is not valid base64: {}", e)))
}

pub fn encode_data(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Run CPU-bound document work off the async runtime, bounded by the
/// configured render timeout
///
/// On timeout the task is abandoned; it still closes its document when it
/// finishes.
pub async fn run_blocking<F, R>(state: &AppState, job: F) -> Result<R>
where
    F: FnOnce() -> DocumentResult<R> + Send + 'static,
    R: Send + 'static,
{
    let limit = state.config().render_timeout;
    let task = tokio::task::spawn_blocking(job);

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(e)) => Err(AppError::Internal(format!("Processing task failed: {}", e))),
        Err(_) => Err(DocumentError::Timeout(limit).into()),
    }
}

/// Ordered `page_{n}` mapping
///
/// Serialized as a JSON object whose keys keep page order.
#[derive(Debug)]
pub struct PageMap<T>(pub Vec<(String, Vec<T>)>);

impl<T: Serialize> Serialize for PageMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(key, entries)| (key, entries)))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Partial,
    Error,
}
