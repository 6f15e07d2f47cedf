//! Audit trail for lifecycle transitions and resolution decisions.
//!
//! Every engine operation reports one [`AuditEvent`] per transition or
//! decision, with enough detail to reconstruct why a capture did or did
//! not match after the fact.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rollcall_identity::{CheckType, IdentityId, RequestId};

/// A single audited fact. Events are emitted after the transition they
/// describe has committed.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEvent {
    EnrollmentSubmitted {
        request_id: RequestId,
        accepted: usize,
        rejected: usize,
    },
    ReviewStarted {
        request_id: RequestId,
    },
    EnrollmentApproved {
        request_id: RequestId,
        identity_id: IdentityId,
        templates: usize,
    },
    EnrollmentRejected {
        request_id: RequestId,
        reason: String,
    },
    IdentityDeactivated {
        identity_id: IdentityId,
        removed: usize,
    },
    FaceMatched {
        identity_id: IdentityId,
        confidence: f32,
    },
    FaceUnmatched {
        best: Option<f32>,
    },
    ResolutionAmbiguous {
        top: IdentityId,
        runner_up: IdentityId,
        gap: f32,
    },
    EmbeddingFailed {
        detail: String,
    },
    AttendanceRecorded {
        identity_id: IdentityId,
        check_type: CheckType,
    },
    AttendanceDuplicate {
        identity_id: IdentityId,
        check_type: CheckType,
    },
    IndexRebuilt {
        entries: usize,
        identities: usize,
        duration_ms: u64,
    },
    IndexSaved {
        path: PathBuf,
        entries: usize,
    },
    IndexLoaded {
        path: PathBuf,
        entries: usize,
    },
    InconsistencyDetected {
        identity_id: IdentityId,
    },
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnrollmentSubmitted {
                request_id,
                accepted,
                rejected,
            } => write!(
                f,
                "enrollment {request_id} submitted: {accepted} accepted, {rejected} rejected"
            ),
            Self::ReviewStarted { request_id } => {
                write!(f, "enrollment {request_id} under review")
            }
            Self::EnrollmentApproved {
                request_id,
                identity_id,
                templates,
            } => write!(
                f,
                "enrollment {request_id} approved as identity {identity_id} ({templates} templates)"
            ),
            Self::EnrollmentRejected { request_id, reason } => {
                write!(f, "enrollment {request_id} rejected: {reason}")
            }
            Self::IdentityDeactivated {
                identity_id,
                removed,
            } => write!(
                f,
                "identity {identity_id} deactivated, {removed} templates removed"
            ),
            Self::FaceMatched {
                identity_id,
                confidence,
            } => write!(
                f,
                "face matched identity {identity_id} (confidence {confidence:.3})"
            ),
            Self::FaceUnmatched { best: Some(best) } => {
                write!(f, "face unmatched (best {best:.3})")
            }
            Self::FaceUnmatched { best: None } => write!(f, "face unmatched (no candidates)"),
            Self::ResolutionAmbiguous {
                top,
                runner_up,
                gap,
            } => write!(
                f,
                "ambiguous resolution between {top} and {runner_up} (gap {gap:.3})"
            ),
            Self::EmbeddingFailed { detail } => write!(f, "embedding failed: {detail}"),
            Self::AttendanceRecorded {
                identity_id,
                check_type,
            } => write!(
                f,
                "attendance {check_type} recorded for identity {identity_id}"
            ),
            Self::AttendanceDuplicate {
                identity_id,
                check_type,
            } => write!(
                f,
                "attendance {check_type} for identity {identity_id} already recorded today"
            ),
            Self::IndexRebuilt {
                entries,
                identities,
                duration_ms,
            } => write!(
                f,
                "index rebuilt: {entries} templates, {identities} identities in {duration_ms}ms"
            ),
            Self::IndexSaved { path, entries } => {
                write!(f, "index saved to {} ({entries} templates)", path.display())
            }
            Self::IndexLoaded { path, entries } => write!(
                f,
                "index loaded from {} ({entries} templates)",
                path.display()
            ),
            Self::InconsistencyDetected { identity_id } => write!(
                f,
                "index references unknown identity {identity_id}, rebuild flagged"
            ),
        }
    }
}

/// Audit sink interface for engine components.
///
/// The engine reports every state transition and resolution decision
/// through a sink. The default implementation forwards to the `tracing`
/// crate.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Returns the default sink that uses the `tracing` crate.
pub fn default_sink() -> Arc<dyn AuditSink> {
    Arc::new(TracingSink)
}

/// Default sink implementation using `tracing`.
struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, event: &AuditEvent) {
        match event {
            AuditEvent::InconsistencyDetected { .. } => tracing::error!("engine: {event}"),
            AuditEvent::ResolutionAmbiguous { .. }
            | AuditEvent::EmbeddingFailed { .. }
            | AuditEvent::AttendanceDuplicate { .. } => tracing::warn!("engine: {event}"),
            _ => tracing::info!("engine: {event}"),
        }
    }
}

/// No-op sink that discards all events.
pub struct NopSink;

impl AuditSink for NopSink {
    fn record(&self, _event: &AuditEvent) {}
}

/// Sink that keeps events in memory, in arrival order.
/// For tests and diagnostics.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AuditSink for MemorySink {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        let request_id = RequestId::from_u128(1);
        sink.record(&AuditEvent::ReviewStarted { request_id });
        sink.record(&AuditEvent::EnrollmentRejected {
            request_id,
            reason: "blurry".into(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], AuditEvent::ReviewStarted { request_id });
        assert!(matches!(
            &events[1],
            AuditEvent::EnrollmentRejected { reason, .. } if reason == "blurry"
        ));
    }

    #[test]
    fn test_display_messages() {
        let identity_id = IdentityId::from_u128(5);
        let matched = AuditEvent::FaceMatched {
            identity_id,
            confidence: 0.75,
        };
        assert!(matched.to_string().contains("confidence 0.750"));

        let unmatched = AuditEvent::FaceUnmatched { best: None };
        assert_eq!(unmatched.to_string(), "face unmatched (no candidates)");

        let duplicate = AuditEvent::AttendanceDuplicate {
            identity_id,
            check_type: CheckType::In,
        };
        assert!(duplicate.to_string().contains("attendance in"));
    }

    #[test]
    fn test_nop_sink() {
        NopSink.record(&AuditEvent::FaceUnmatched { best: Some(0.1) });
    }

    #[test]
    fn test_default_sink() {
        default_sink().record(&AuditEvent::FaceUnmatched { best: None });
    }
}
