use chrono::NaiveDate;

use crate::error::StoreError;
use crate::types::{
    AttendanceEvent, CandidateInfo, CheckType, EnrollmentRequest, Identity, IdentityId,
    IdentityStatus, RequestId,
};

/// Outcome of recording an attendance event.
#[derive(Debug, Clone)]
pub enum AttendanceOutcome {
    /// The event was appended.
    Recorded(AttendanceEvent),

    /// An event for the same identity, day and check type already exists.
    /// The existing event is returned and nothing is appended.
    Duplicate(AttendanceEvent),
}

/// Durable record of enrollment requests, identities and attendance events.
///
/// Implementations must be safe for concurrent use (Send + Sync), and every
/// request state transition must be atomic: of two racing `promote`/`reject`
/// calls on the same request exactly one wins, the loser observes
/// [`StoreError::AlreadyFinalized`].
///
/// Use [`MemoryIdentityStore`] for in-memory storage (testing/single-process).
///
/// [`MemoryIdentityStore`]: crate::MemoryIdentityStore
pub trait IdentityStore: Send + Sync {
    /// Creates a new enrollment request in the submitted state.
    fn create_pending(&self, candidate: CandidateInfo) -> Result<EnrollmentRequest, StoreError>;

    /// Appends an embedding to a request that has not been finalized.
    fn attach_embedding(&self, request_id: RequestId, vector: Vec<f32>) -> Result<(), StoreError>;

    /// Marks a request as under review. Idempotent while non-terminal.
    fn begin_review(&self, request_id: RequestId) -> Result<EnrollmentRequest, StoreError>;

    /// Finalizes a request as approved, creating the active identity that
    /// takes over its embeddings. Promoting an already-promoted request is a
    /// no-op returning the existing identity.
    fn promote(&self, request_id: RequestId) -> Result<Identity, StoreError>;

    /// Finalizes a request as rejected, recording the reason and discarding
    /// its embeddings. Returns the updated request.
    fn reject(&self, request_id: RequestId, reason: &str) -> Result<EnrollmentRequest, StoreError>;

    /// Returns a request by id.
    fn request(&self, request_id: RequestId) -> Result<EnrollmentRequest, StoreError>;

    /// Returns an identity by id.
    fn identity(&self, identity_id: IdentityId) -> Result<Identity, StoreError>;

    /// Returns the status of an identity, or `None` if the store has no
    /// record of it.
    fn identity_status(&self, identity_id: IdentityId)
    -> Result<Option<IdentityStatus>, StoreError>;

    /// Returns all active identities with their embeddings, ordered by id.
    fn list_active(&self) -> Result<Vec<Identity>, StoreError>;

    /// Moves an identity out of the searchable set. Idempotent.
    fn deactivate(&self, identity_id: IdentityId) -> Result<(), StoreError>;

    /// Records an attendance event unless one already exists for the same
    /// identity, calendar day and check type.
    fn record_attendance(&self, event: AttendanceEvent) -> Result<AttendanceOutcome, StoreError>;

    /// Returns the attendance event for the given identity, day and check
    /// type, if any.
    fn attendance_on(
        &self,
        identity_id: IdentityId,
        day: NaiveDate,
        check_type: CheckType,
    ) -> Result<Option<AttendanceEvent>, StoreError>;

    /// Returns all attendance events for an identity in insertion order.
    fn attendance_of(&self, identity_id: IdentityId) -> Result<Vec<AttendanceEvent>, StoreError>;
}
