use thiserror::Error;

use crate::types::{IdentityId, RequestId, RequestState};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("identity: request {0} not found")]
    RequestNotFound(RequestId),

    #[error("identity: identity {0} not found")]
    IdentityNotFound(IdentityId),

    #[error("identity: request {request_id} already finalized as {state}")]
    AlreadyFinalized {
        request_id: RequestId,
        state: RequestState,
    },

    #[error("identity: request {0} has no embeddings")]
    EmptyRequest(RequestId),

    #[error("identity: {0}")]
    Backend(String),
}
