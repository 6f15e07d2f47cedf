use std::sync::atomic::Ordering;

use chrono::Utc;

use rollcall_embed::{EmbedError, FaceImage};
use rollcall_gallery::Hit;
use rollcall_identity::{AttendanceEvent, AttendanceOutcome, CheckType, IdentityId};

use crate::audit::AuditEvent;
use crate::engine::Engine;
use crate::error::EngineError;

/// Outcome of resolving a capture against the gallery.
#[derive(Debug)]
pub enum Resolved {
    /// Confident match to a single active identity.
    Match {
        identity_id: IdentityId,
        confidence: f32,
    },
    /// No identity cleared the policy. Carries the best similarity among
    /// eligible candidates for observability.
    NoMatch { best: Option<f32> },
    /// The capture produced no usable embedding; no match was attempted.
    EmbeddingFailed(EmbedError),
}

/// Outcome of an attendance capture.
#[derive(Debug)]
pub enum Marked {
    Recorded(AttendanceEvent),
    /// This identity, day and check type were already recorded; carries
    /// the existing event.
    Duplicate(AttendanceEvent),
    NotRecognized { best: Option<f32> },
    EmbeddingFailed(EmbedError),
}

impl Engine {
    /// Resolve a capture to at most one active identity.
    pub fn resolve_face(&self, image: &FaceImage) -> Result<Resolved, EngineError> {
        let vector = match self.embedder.embed(image) {
            Ok(vector) => vector,
            Err(err) => {
                self.audit.record(&AuditEvent::EmbeddingFailed {
                    detail: err.to_string(),
                });
                return Ok(Resolved::EmbeddingFailed(err));
            }
        };
        self.resolve_vector(&vector)
    }

    /// Resolve a precomputed embedding.
    ///
    /// Policy: take the k nearest templates, keep the best hit per
    /// distinct identity, drop candidates that are no longer active,
    /// then require the survivor to clear `match_threshold` and beat the
    /// runner-up identity by `ambiguity_margin`. An indexed identity the
    /// store does not know flags a forced rebuild and is skipped.
    pub fn resolve_vector(&self, vector: &[f32]) -> Result<Resolved, EngineError> {
        let hits = self.gallery.search(vector, self.cfg.search_k)?;

        let mut candidates: Vec<Hit> = Vec::new();
        for hit in hits {
            if candidates.iter().any(|c| c.identity_id == hit.identity_id) {
                continue;
            }
            candidates.push(hit);
        }

        let mut survivors: Vec<Hit> = Vec::new();
        for hit in candidates {
            match self.store.identity_status(hit.identity_id)? {
                Some(status) if status.is_searchable() => survivors.push(hit),
                Some(_) => {}
                None => {
                    self.audit.record(&AuditEvent::InconsistencyDetected {
                        identity_id: hit.identity_id,
                    });
                    self.rebuild_wanted.store(true, Ordering::SeqCst);
                }
            }
        }

        let Some(top) = survivors.first() else {
            self.audit
                .record(&AuditEvent::FaceUnmatched { best: None });
            return Ok(Resolved::NoMatch { best: None });
        };
        let confidence = top.similarity();

        if confidence < self.cfg.match_threshold {
            self.audit.record(&AuditEvent::FaceUnmatched {
                best: Some(confidence),
            });
            return Ok(Resolved::NoMatch {
                best: Some(confidence),
            });
        }

        if let Some(runner_up) = survivors.get(1) {
            let gap = confidence - runner_up.similarity();
            if gap < self.cfg.ambiguity_margin {
                self.audit.record(&AuditEvent::ResolutionAmbiguous {
                    top: top.identity_id,
                    runner_up: runner_up.identity_id,
                    gap,
                });
                return Ok(Resolved::NoMatch {
                    best: Some(confidence),
                });
            }
        }

        self.audit.record(&AuditEvent::FaceMatched {
            identity_id: top.identity_id,
            confidence,
        });
        Ok(Resolved::Match {
            identity_id: top.identity_id,
            confidence,
        })
    }

    /// Resolve a capture and record an attendance event on a match.
    ///
    /// At most one event exists per identity, calendar day and check
    /// type; a repeat capture reports the existing event instead of
    /// appending.
    pub fn mark_attendance(
        &self,
        image: &FaceImage,
        check_type: CheckType,
    ) -> Result<Marked, EngineError> {
        let (identity_id, confidence) = match self.resolve_face(image)? {
            Resolved::Match {
                identity_id,
                confidence,
            } => (identity_id, confidence),
            Resolved::NoMatch { best } => return Ok(Marked::NotRecognized { best }),
            Resolved::EmbeddingFailed(err) => return Ok(Marked::EmbeddingFailed(err)),
        };

        let event = AttendanceEvent {
            identity_id,
            timestamp: Utc::now(),
            confidence,
            check_type,
        };
        match self.store.record_attendance(event)? {
            AttendanceOutcome::Recorded(event) => {
                self.audit.record(&AuditEvent::AttendanceRecorded {
                    identity_id,
                    check_type,
                });
                Ok(Marked::Recorded(event))
            }
            AttendanceOutcome::Duplicate(existing) => {
                self.audit.record(&AuditEvent::AttendanceDuplicate {
                    identity_id,
                    check_type,
                });
                Ok(Marked::Duplicate(existing))
            }
        }
    }
}
