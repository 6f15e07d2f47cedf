//! Identity records and the enrollment lifecycle store.
//!
//! An enrollment starts as an [`EnrollmentRequest`] holding the candidate's
//! details and face embeddings. Review finalizes the request exactly once:
//! `promote` creates an active [`Identity`] that takes over the embeddings,
//! `reject` discards them. Attendance events reference identities and are
//! append-only with at most one event per identity, day and check type.
//!
//! # Usage
//!
//! ```
//! use rollcall_identity::{CandidateInfo, IdentityStore, MemoryIdentityStore};
//!
//! let store = MemoryIdentityStore::new();
//! let req = store.create_pending(CandidateInfo {
//!     full_name: "Dana Reyes".into(),
//!     external_id: Some("EMP-0042".into()),
//! }).unwrap();
//! store.attach_embedding(req.id, vec![0.1, 0.9, 0.0]).unwrap();
//! let identity = store.promote(req.id).unwrap();
//! assert_eq!(identity.embeddings.len(), 1);
//! ```
//!
//! # Design
//!
//! Every status transition is atomic: of two racing `promote`/`reject` calls
//! on the same request exactly one wins and the loser observes
//! [`StoreError::AlreadyFinalized`]. Promoting an already-promoted request is
//! a no-op that returns the existing identity, so approval can be retried
//! safely.

mod error;
mod memory;
mod store;
mod types;

pub use error::StoreError;
pub use memory::MemoryIdentityStore;
pub use store::{AttendanceOutcome, IdentityStore};
pub use types::{
    AttendanceEvent, CandidateInfo, CheckType, EnrollmentRequest, Identity, IdentityId,
    IdentityStatus, RequestId, RequestState,
};
