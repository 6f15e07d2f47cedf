use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use rollcall_embed::FaceEmbedder;
use rollcall_gallery::Gallery;
use rollcall_identity::IdentityStore;

use crate::audit::{default_sink, AuditSink};
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Coordinates enrollment, resolution and index maintenance over an
/// identity store, an embedding provider and the template gallery.
///
/// Thread-safe: all methods can be called concurrently. Resolution reads
/// a lock-free snapshot; index mutations (approval, deactivation,
/// rebuild, restore) serialize on one writer lock so a rebuild can never
/// lose a concurrent approval.
pub struct Engine {
    pub(crate) cfg: EngineConfig,
    pub(crate) store: Arc<dyn IdentityStore>,
    pub(crate) embedder: Arc<dyn FaceEmbedder>,
    pub(crate) gallery: Gallery,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) index_writer: Mutex<()>,
    pub(crate) rebuild_wanted: AtomicBool,
}

impl Engine {
    /// Create an engine with the default tracing audit sink.
    ///
    /// Panics if the configuration is inconsistent or the embedder does
    /// not produce `cfg.dim`-dimensional vectors.
    pub fn new(
        cfg: EngineConfig,
        store: Arc<dyn IdentityStore>,
        embedder: Arc<dyn FaceEmbedder>,
    ) -> Self {
        Self::with_audit(cfg, store, embedder, default_sink())
    }

    /// Create an engine reporting to the given audit sink.
    pub fn with_audit(
        cfg: EngineConfig,
        store: Arc<dyn IdentityStore>,
        embedder: Arc<dyn FaceEmbedder>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let cfg = cfg.with_defaults();
        assert!(cfg.dim > 0, "engine: EngineConfig.dim must be positive");
        assert_eq!(
            embedder.dimension(),
            cfg.dim,
            "engine: embedder dimension must match EngineConfig.dim"
        );
        assert!(
            cfg.min_images <= cfg.max_images,
            "engine: EngineConfig.min_images must not exceed max_images"
        );
        let gallery = Gallery::new(cfg.dim);
        Self {
            cfg,
            store,
            embedder,
            gallery,
            audit,
            index_writer: Mutex::new(()),
            rebuild_wanted: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Number of templates currently searchable.
    pub fn index_len(&self) -> Result<usize, EngineError> {
        Ok(self.gallery.snapshot()?.len())
    }

    pub(crate) fn lock_index_writer(&self) -> Result<MutexGuard<'_, ()>, EngineError> {
        self.index_writer
            .lock()
            .map_err(|_| EngineError::IndexUnavailable)
    }
}
