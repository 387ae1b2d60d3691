//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::document::PdfEngine;
use crate::raster::ArtifactWriter;
use crate::session::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    engine: Arc<dyn PdfEngine>,
    sessions: SessionStore,
    artifacts: Option<ArtifactWriter>,
}

impl AppState {
    /// Create the state around a rendering engine
    pub fn new(config: Config, engine: Arc<dyn PdfEngine>) -> Self {
        let sessions = SessionStore::new(config.session_capacity);
        let artifacts = config.output_dir.clone().map(ArtifactWriter::new);

        if let Some(writer) = &artifacts {
            tracing::info!("Writing artifacts to {}", writer.base_path().display());
        }

        Self {
            inner: Arc::new(AppStateInner {
                config,
                engine,
                sessions,
                artifacts,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get a handle to the rendering engine
    pub fn engine(&self) -> Arc<dyn PdfEngine> {
        Arc::clone(&self.inner.engine)
    }

    /// Get the session store
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Get the artifact writer, if an output directory is configured
    pub fn artifacts(&self) -> Option<&ArtifactWriter> {
        self.inner.artifacts.as_ref()
    }
}
