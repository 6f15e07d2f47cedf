use rollcall_gallery::GalleryError;
use rollcall_identity::{IdentityId, RequestId, RequestState, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Bad input shape. Recovered locally and surfaced to the caller;
    /// nothing is stored.
    #[error("engine: {0}")]
    Validation(String),

    /// The request already took its one terminal transition.
    #[error("engine: request {request_id} already finalized as {state}")]
    AlreadyFinalized {
        request_id: RequestId,
        state: RequestState,
    },

    /// The index cannot serve right now. Retryable, distinct from a
    /// no-match outcome.
    #[error("engine: index unavailable")]
    IndexUnavailable,

    /// The index references an identity the store does not know.
    /// Reported once a forced rebuild has been flagged.
    #[error("engine: index references unknown identity {0}")]
    InconsistentState(IdentityId),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Gallery(GalleryError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyFinalized { request_id, state } => {
                Self::AlreadyFinalized { request_id, state }
            }
            other => Self::Store(other),
        }
    }
}

impl From<GalleryError> for EngineError {
    fn from(err: GalleryError) -> Self {
        match err {
            GalleryError::Unavailable => Self::IndexUnavailable,
            other => Self::Gallery(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_finalized_lifts_to_engine_variant() {
        let request_id = RequestId::from_u128(7);
        let err: EngineError = StoreError::AlreadyFinalized {
            request_id,
            state: RequestState::Approved,
        }
        .into();
        assert!(matches!(
            err,
            EngineError::AlreadyFinalized { state: RequestState::Approved, .. }
        ));
        assert!(err.to_string().contains("already finalized as approved"));
    }

    #[test]
    fn test_unavailable_lifts_to_engine_variant() {
        let err: EngineError = GalleryError::Unavailable.into();
        assert!(matches!(err, EngineError::IndexUnavailable));
    }

    #[test]
    fn test_transparent_passthrough() {
        let err: EngineError = GalleryError::ZeroVector.into();
        assert_eq!(err.to_string(), "gallery: zero vector");
    }
}
