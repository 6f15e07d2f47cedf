//! Record and status types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of an enrolled identity.
pub type IdentityId = Uuid;

/// Unique identifier of an enrollment request.
pub type RequestId = Uuid;

/// Candidate details captured when an enrollment is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInfo {
    /// Display name of the person being enrolled.
    pub full_name: String,

    /// External reference such as an employee or student number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// Represents the status of an enrolled identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityStatus {
    Pending,
    Active,
    Rejected,
    Suspended,
}

impl IdentityStatus {
    /// Returns true if embeddings of this identity may be matched.
    pub fn is_searchable(&self) -> bool {
        matches!(self, IdentityStatus::Active)
    }

    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityStatus::Pending => "pending",
            IdentityStatus::Active => "active",
            IdentityStatus::Rejected => "rejected",
            IdentityStatus::Suspended => "suspended",
        }
    }

    /// Parses a status from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(IdentityStatus::Pending),
            "active" => Some(IdentityStatus::Active),
            "rejected" => Some(IdentityStatus::Rejected),
            "suspended" => Some(IdentityStatus::Suspended),
            _ => None,
        }
    }
}

impl fmt::Display for IdentityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for IdentityStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IdentityStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        IdentityStatus::from_str(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown identity status: {s}")))
    }
}

/// Represents the state of an enrollment request.
///
/// A request moves `submitted -> under_review -> {approved, rejected}`.
/// The two terminal states are final: a request is never reopened, and
/// re-submission after rejection creates a brand-new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl RequestState {
    /// Returns true once the request has received its final decision.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Approved | RequestState::Rejected)
    }

    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Submitted => "submitted",
            RequestState::UnderReview => "under_review",
            RequestState::Approved => "approved",
            RequestState::Rejected => "rejected",
        }
    }

    /// Parses a state from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(RequestState::Submitted),
            "under_review" => Some(RequestState::UnderReview),
            "approved" => Some(RequestState::Approved),
            "rejected" => Some(RequestState::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for RequestState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RequestState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RequestState::from_str(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown request state: {s}")))
    }
}

/// Whether an attendance event marks arrival or departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckType {
    In,
    Out,
}

impl CheckType {
    /// Returns the string representation of the check type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::In => "in",
            CheckType::Out => "out",
        }
    }

    /// Parses a check type from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(CheckType::In),
            "out" => Some(CheckType::Out),
            _ => None,
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for CheckType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CheckType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CheckType::from_str(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown check type: {s}")))
    }
}

/// An enrolled person.
///
/// Embeddings are immutable once accepted; re-enrollment goes through a new
/// [`EnrollmentRequest`] instead of mutating an existing identity in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,

    /// Display name of the person.
    pub full_name: String,

    /// External reference such as an employee or student number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// One embedding per accepted enrollment image.
    pub embeddings: Vec<Vec<f32>>,

    pub status: IdentityStatus,

    pub enrolled_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// A candidate identity awaiting review.
///
/// The request owns its embeddings until the review decision: approval moves
/// them onto the created [`Identity`], rejection discards them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    pub id: RequestId,

    pub candidate: CandidateInfo,

    /// Embeddings extracted from the submitted images. Emptied when the
    /// request is finalized.
    pub embeddings: Vec<Vec<f32>>,

    pub state: RequestState,

    pub submitted_at: DateTime<Utc>,

    /// When the terminal decision was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,

    /// Reason recorded with a rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_reason: Option<String>,

    /// Identity created by approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<IdentityId>,
}

/// A single recognition-driven attendance record. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEvent {
    pub identity_id: IdentityId,

    pub timestamp: DateTime<Utc>,

    /// Similarity score of the match that produced this event.
    pub confidence: f32,

    pub check_type: CheckType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_status_string() {
        assert_eq!(IdentityStatus::Pending.to_string(), "pending");
        assert_eq!(IdentityStatus::Active.to_string(), "active");
        assert_eq!(IdentityStatus::Rejected.to_string(), "rejected");
        assert_eq!(IdentityStatus::Suspended.to_string(), "suspended");
    }

    #[test]
    fn test_identity_status_from_str() {
        assert_eq!(IdentityStatus::from_str("active"), Some(IdentityStatus::Active));
        assert_eq!(IdentityStatus::from_str("suspended"), Some(IdentityStatus::Suspended));
        assert_eq!(IdentityStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_identity_status_searchable() {
        assert!(IdentityStatus::Active.is_searchable());
        assert!(!IdentityStatus::Pending.is_searchable());
        assert!(!IdentityStatus::Rejected.is_searchable());
        assert!(!IdentityStatus::Suspended.is_searchable());
    }

    #[test]
    fn test_request_state_terminal() {
        assert!(!RequestState::Submitted.is_terminal());
        assert!(!RequestState::UnderReview.is_terminal());
        assert!(RequestState::Approved.is_terminal());
        assert!(RequestState::Rejected.is_terminal());
    }

    #[test]
    fn test_request_state_serialize() {
        let json = serde_json::to_string(&RequestState::UnderReview).unwrap();
        assert_eq!(json, r#""under_review""#);

        let restored: RequestState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, RequestState::UnderReview);

        assert!(serde_json::from_str::<RequestState>(r#""reopened""#).is_err());
    }

    #[test]
    fn test_check_type_string() {
        assert_eq!(CheckType::In.to_string(), "in");
        assert_eq!(CheckType::Out.to_string(), "out");
        assert_eq!(CheckType::from_str("out"), Some(CheckType::Out));
        assert_eq!(CheckType::from_str("inout"), None);
    }

    #[test]
    fn test_candidate_info_serialize() {
        let info = CandidateInfo {
            full_name: "Dana Reyes".into(),
            external_id: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("external_id"));

        let restored: CandidateInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, info);
    }
}
