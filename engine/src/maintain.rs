use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use rollcall_gallery::io;
use rollcall_identity::IdentityId;

use crate::audit::AuditEvent;
use crate::engine::Engine;
use crate::error::EngineError;

/// Summary of a completed index rebuild.
#[derive(Debug, Clone)]
pub struct RebuildReport {
    /// Templates now searchable.
    pub entries: usize,
    /// Distinct identities indexed.
    pub identities: usize,
    pub duration: Duration,
}

impl Engine {
    /// Rebuild the index strictly from the store's active identities,
    /// discarding anything the store does not corroborate.
    ///
    /// Single-writer: the active set is read inside the writer critical
    /// section, so a racing approval either lands in the set or replays
    /// its upsert against the rebuilt index afterwards. Searches keep
    /// hitting the old snapshot until the swap.
    pub fn rebuild_index(&self) -> Result<RebuildReport, EngineError> {
        let start = Instant::now();
        let _writer = self.lock_index_writer()?;
        let active = self.store.list_active()?;
        let identities = active.len();
        let entries = self
            .gallery
            .rebuild_from(active.into_iter().map(|i| (i.id, i.embeddings)))?;
        self.rebuild_wanted.store(false, Ordering::SeqCst);

        let report = RebuildReport {
            entries,
            identities,
            duration: start.elapsed(),
        };
        self.audit.record(&AuditEvent::IndexRebuilt {
            entries,
            identities,
            duration_ms: report.duration.as_millis() as u64,
        });
        Ok(report)
    }

    /// True when a detected inconsistency is waiting on a rebuild.
    pub fn needs_rebuild(&self) -> bool {
        self.rebuild_wanted.load(Ordering::SeqCst)
    }

    /// Suspend an identity and synchronously drop its templates.
    ///
    /// The query-time status filter covers any window in which another
    /// snapshot still carries the templates.
    pub fn deactivate_identity(&self, identity_id: IdentityId) -> Result<(), EngineError> {
        let _writer = self.lock_index_writer()?;
        self.store.deactivate(identity_id)?;
        let removed = self.gallery.remove(identity_id)?;
        self.audit.record(&AuditEvent::IdentityDeactivated {
            identity_id,
            removed,
        });
        Ok(())
    }

    /// Persist the current snapshot to `path`. Returns the number of
    /// templates written.
    pub fn save_index(&self, path: &Path) -> Result<usize, EngineError> {
        let snapshot = self.gallery.snapshot()?;
        io::save_file(&snapshot, path)?;
        let entries = snapshot.len();
        self.audit.record(&AuditEvent::IndexSaved {
            path: path.to_path_buf(),
            entries,
        });
        Ok(entries)
    }

    /// Restore a snapshot written by [`Engine::save_index`] and make it
    /// searchable. Returns the number of templates restored.
    ///
    /// Every identity in the file must exist in the store. An unknown
    /// identity leaves the current index untouched, flags a rebuild and
    /// reports [`EngineError::InconsistentState`]. Suspended identities
    /// may load; the query-time filter keeps them unmatchable until the
    /// next rebuild drops them.
    pub fn load_index(&self, path: &Path) -> Result<usize, EngineError> {
        let snapshot = io::load_file(path)?;
        for identity_id in snapshot.identity_ids() {
            if self.store.identity_status(identity_id)?.is_none() {
                self.audit
                    .record(&AuditEvent::InconsistencyDetected { identity_id });
                self.rebuild_wanted.store(true, Ordering::SeqCst);
                return Err(EngineError::InconsistentState(identity_id));
            }
        }

        let entries = snapshot.len();
        let _writer = self.lock_index_writer()?;
        self.gallery.install(snapshot)?;
        self.audit.record(&AuditEvent::IndexLoaded {
            path: path.to_path_buf(),
            entries,
        });
        Ok(entries)
    }
}
