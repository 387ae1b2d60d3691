//! Uploaded document sessions
//!
//! A page-render request stores the uploaded bytes so follow-up region and
//! embedded-image requests can refer to the document by id instead of
//! sending it again. Bounded with LRU eviction.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use uuid::Uuid;

/// Document bytes plus the name used for artifact prefixes
#[derive(Debug)]
pub struct StoredDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// DPI the pages were rendered at, which is the space later selections
    /// are drawn in. `None` for documents sent inline with a request.
    pub render_dpi: Option<f64>,
}

impl StoredDocument {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            file_name: file_name.into(),
            bytes,
            render_dpi: None,
        })
    }

    pub fn rendered(file_name: impl Into<String>, bytes: Vec<u8>, dpi: f64) -> Arc<Self> {
        Arc::new(Self {
            file_name: file_name.into(),
            bytes,
            render_dpi: Some(dpi),
        })
    }
}

/// Session store shared by all handlers
pub struct SessionStore {
    entries: Mutex<LruCache<Uuid, Arc<StoredDocument>>>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        let size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(size)),
        }
    }

    /// Store a document and return its new session id
    pub fn insert(&self, document: Arc<StoredDocument>) -> Uuid {
        let id = Uuid::new_v4();
        let size = document.bytes.len();
        let evicted = self.entries.lock().push(id, document);

        if let Some((old, _)) = evicted {
            tracing::debug!("Session {} evicted", old);
        }
        tracing::debug!("Session {} created ({} bytes)", id, size);
        id
    }

    /// Look up a session, marking it recently used
    pub fn get(&self, id: &Uuid) -> Option<Arc<StoredDocument>> {
        self.entries.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
