use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{AttendanceOutcome, IdentityStore};
use crate::types::{
    AttendanceEvent, CandidateInfo, CheckType, EnrollmentRequest, Identity, IdentityId,
    IdentityStatus, RequestId, RequestState,
};

/// In-memory [`IdentityStore`] implementation.
/// Data is lost on restart. Suitable for testing or single-process use.
///
/// All mutations run under one mutex, so the check-and-set on request state
/// is atomic and racing finalizations see exactly one winner.
pub struct MemoryIdentityStore {
    inner: Mutex<Inner>,
}

struct Inner {
    requests: HashMap<RequestId, EnrollmentRequest>,
    identities: HashMap<IdentityId, Identity>,
    attendance: Vec<AttendanceEvent>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                requests: HashMap::new(),
                identities: HashMap::new(),
                attendance: Vec::new(),
            }),
        }
    }
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn create_pending(&self, candidate: CandidateInfo) -> Result<EnrollmentRequest, StoreError> {
        let request = EnrollmentRequest {
            id: Uuid::new_v4(),
            candidate,
            embeddings: Vec::new(),
            state: RequestState::Submitted,
            submitted_at: Utc::now(),
            decided_at: None,
            decision_reason: None,
            identity_id: None,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.requests.insert(request.id, request.clone());
        Ok(request)
    }

    fn attach_embedding(&self, request_id: RequestId, vector: Vec<f32>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let req = inner
            .requests
            .get_mut(&request_id)
            .ok_or(StoreError::RequestNotFound(request_id))?;
        if req.state.is_terminal() {
            return Err(StoreError::AlreadyFinalized {
                request_id,
                state: req.state,
            });
        }
        req.embeddings.push(vector);
        Ok(())
    }

    fn begin_review(&self, request_id: RequestId) -> Result<EnrollmentRequest, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let req = inner
            .requests
            .get_mut(&request_id)
            .ok_or(StoreError::RequestNotFound(request_id))?;
        match req.state {
            RequestState::Submitted => {
                req.state = RequestState::UnderReview;
                Ok(req.clone())
            }
            RequestState::UnderReview => Ok(req.clone()),
            RequestState::Approved | RequestState::Rejected => {
                Err(StoreError::AlreadyFinalized {
                    request_id,
                    state: req.state,
                })
            }
        }
    }

    fn promote(&self, request_id: RequestId) -> Result<Identity, StoreError> {
        let inner = &mut *self.inner.lock().unwrap();
        let req = inner
            .requests
            .get_mut(&request_id)
            .ok_or(StoreError::RequestNotFound(request_id))?;
        match req.state {
            RequestState::Approved => {
                let identity_id = req.identity_id.ok_or_else(|| {
                    StoreError::Backend(format!("approved request {request_id} has no identity"))
                })?;
                inner.identities.get(&identity_id).cloned().ok_or_else(|| {
                    StoreError::Backend(format!(
                        "identity {identity_id} of approved request {request_id} is missing"
                    ))
                })
            }
            RequestState::Rejected => Err(StoreError::AlreadyFinalized {
                request_id,
                state: req.state,
            }),
            RequestState::Submitted | RequestState::UnderReview => {
                if req.embeddings.is_empty() {
                    return Err(StoreError::EmptyRequest(request_id));
                }
                let now = Utc::now();
                let identity = Identity {
                    id: Uuid::new_v4(),
                    full_name: req.candidate.full_name.clone(),
                    external_id: req.candidate.external_id.clone(),
                    embeddings: std::mem::take(&mut req.embeddings),
                    status: IdentityStatus::Active,
                    enrolled_at: now,
                    updated_at: now,
                };
                req.state = RequestState::Approved;
                req.decided_at = Some(now);
                req.identity_id = Some(identity.id);
                inner.identities.insert(identity.id, identity.clone());
                Ok(identity)
            }
        }
    }

    fn reject(&self, request_id: RequestId, reason: &str) -> Result<EnrollmentRequest, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let req = inner
            .requests
            .get_mut(&request_id)
            .ok_or(StoreError::RequestNotFound(request_id))?;
        if req.state.is_terminal() {
            return Err(StoreError::AlreadyFinalized {
                request_id,
                state: req.state,
            });
        }
        req.state = RequestState::Rejected;
        req.embeddings.clear();
        req.decided_at = Some(Utc::now());
        req.decision_reason = Some(reason.to_string());
        Ok(req.clone())
    }

    fn request(&self, request_id: RequestId) -> Result<EnrollmentRequest, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .requests
            .get(&request_id)
            .cloned()
            .ok_or(StoreError::RequestNotFound(request_id))
    }

    fn identity(&self, identity_id: IdentityId) -> Result<Identity, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .identities
            .get(&identity_id)
            .cloned()
            .ok_or(StoreError::IdentityNotFound(identity_id))
    }

    fn identity_status(
        &self,
        identity_id: IdentityId,
    ) -> Result<Option<IdentityStatus>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.identities.get(&identity_id).map(|i| i.status))
    }

    fn list_active(&self) -> Result<Vec<Identity>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut active: Vec<Identity> = inner
            .identities
            .values()
            .filter(|i| i.status.is_searchable())
            .cloned()
            .collect();
        active.sort_by_key(|i| i.id);
        Ok(active)
    }

    fn deactivate(&self, identity_id: IdentityId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let identity = inner
            .identities
            .get_mut(&identity_id)
            .ok_or(StoreError::IdentityNotFound(identity_id))?;
        if identity.status != IdentityStatus::Suspended {
            identity.status = IdentityStatus::Suspended;
            identity.updated_at = Utc::now();
        }
        Ok(())
    }

    fn record_attendance(&self, event: AttendanceEvent) -> Result<AttendanceOutcome, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.identities.contains_key(&event.identity_id) {
            return Err(StoreError::IdentityNotFound(event.identity_id));
        }
        let day = event.timestamp.date_naive();
        let existing = inner.attendance.iter().find(|e| {
            e.identity_id == event.identity_id
                && e.check_type == event.check_type
                && e.timestamp.date_naive() == day
        });
        if let Some(existing) = existing {
            return Ok(AttendanceOutcome::Duplicate(existing.clone()));
        }
        inner.attendance.push(event.clone());
        Ok(AttendanceOutcome::Recorded(event))
    }

    fn attendance_on(
        &self,
        identity_id: IdentityId,
        day: NaiveDate,
        check_type: CheckType,
    ) -> Result<Option<AttendanceEvent>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .attendance
            .iter()
            .find(|e| {
                e.identity_id == identity_id
                    && e.check_type == check_type
                    && e.timestamp.date_naive() == day
            })
            .cloned())
    }

    fn attendance_of(&self, identity_id: IdentityId) -> Result<Vec<AttendanceEvent>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .attendance
            .iter()
            .filter(|e| e.identity_id == identity_id)
            .cloned()
            .collect())
    }
}
