use serde::Serialize;

use rollcall_embed::{quality, EmbedError, FaceImage, QualityReport};
use rollcall_identity::{CandidateInfo, EnrollmentRequest, Identity, RequestId};

use crate::audit::AuditEvent;
use crate::engine::Engine;
use crate::error::EngineError;

/// Per-image outcome of a submission.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    /// Position in the submitted batch.
    pub index: usize,
    pub accepted: bool,
    /// Failure description for images that produced no embedding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub quality: QualityReport,
}

/// Outcome of an accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub request_id: RequestId,
    /// Images that produced embeddings.
    pub accepted: usize,
    pub image_reports: Vec<ImageReport>,
}

/// Admin decision on a pending enrollment. Typed commands only; the
/// engine never prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { reason: String },
}

/// Outcome of a review.
#[derive(Debug, Clone)]
pub enum Review {
    /// The identity is active and searchable.
    Approved(Identity),
    /// The request record, now terminal with its embeddings discarded.
    Rejected(EnrollmentRequest),
}

impl Engine {
    /// Validate and ingest an enrollment submission.
    ///
    /// Every image runs quality assessment and then embedding; per-image
    /// failures land in the receipt. A request is created only when at
    /// least `min_images` images yield embeddings; a failed submission
    /// stores nothing.
    pub fn submit_enrollment(
        &self,
        candidate: CandidateInfo,
        images: &[FaceImage],
    ) -> Result<SubmissionReceipt, EngineError> {
        if candidate.full_name.trim().is_empty() {
            return Err(EngineError::Validation(
                "candidate full_name is empty".into(),
            ));
        }
        let (min, max) = (self.cfg.min_images, self.cfg.max_images);
        if images.len() < min || images.len() > max {
            return Err(EngineError::Validation(format!(
                "got {} images, need between {min} and {max}",
                images.len()
            )));
        }

        let mut reports = Vec::with_capacity(images.len());
        let mut embeddings = Vec::new();
        for (index, image) in images.iter().enumerate() {
            let quality = quality::assess(image);
            if quality.score < self.cfg.quality_threshold {
                reports.push(ImageReport {
                    index,
                    accepted: false,
                    reason: Some(
                        EmbedError::LowQuality {
                            score: quality.score,
                            threshold: self.cfg.quality_threshold,
                        }
                        .to_string(),
                    ),
                    quality,
                });
                continue;
            }
            match self.embedder.embed(image) {
                Ok(vector) => {
                    embeddings.push(vector);
                    reports.push(ImageReport {
                        index,
                        accepted: true,
                        reason: None,
                        quality,
                    });
                }
                Err(err) => reports.push(ImageReport {
                    index,
                    accepted: false,
                    reason: Some(err.to_string()),
                    quality,
                }),
            }
        }

        if embeddings.len() < min {
            let reasons: Vec<String> = reports
                .iter()
                .filter_map(|r| {
                    r.reason
                        .as_ref()
                        .map(|reason| format!("image {}: {reason}", r.index))
                })
                .collect();
            return Err(EngineError::Validation(format!(
                "only {} of {} images usable, need {min} ({})",
                embeddings.len(),
                images.len(),
                reasons.join("; ")
            )));
        }

        let request = self.store.create_pending(candidate)?;
        let accepted = embeddings.len();
        for vector in embeddings {
            self.store.attach_embedding(request.id, vector)?;
        }
        self.audit.record(&AuditEvent::EnrollmentSubmitted {
            request_id: request.id,
            accepted,
            rejected: reports.len() - accepted,
        });
        Ok(SubmissionReceipt {
            request_id: request.id,
            accepted,
            image_reports: reports,
        })
    }

    /// Move a submitted request into review.
    /// Idempotent while the request is non-terminal.
    pub fn begin_review(&self, request_id: RequestId) -> Result<EnrollmentRequest, EngineError> {
        let request = self.store.begin_review(request_id)?;
        self.audit
            .record(&AuditEvent::ReviewStarted { request_id });
        Ok(request)
    }

    /// Apply an admin decision to a pending request.
    ///
    /// Approval promotes the request in the store, then replaces the
    /// identity's templates in the index in one writer-serialized step,
    /// so no embedding is searchable before the request is approved and
    /// a retried approval cannot duplicate entries. Racing decisions on
    /// one request yield exactly one winner; the loser gets
    /// [`EngineError::AlreadyFinalized`].
    pub fn review_enrollment(
        &self,
        request_id: RequestId,
        decision: Decision,
    ) -> Result<Review, EngineError> {
        match decision {
            Decision::Approve => {
                let _writer = self.lock_index_writer()?;
                let identity = self.store.promote(request_id)?;
                let templates = self.gallery.upsert(identity.id, &identity.embeddings)?;
                self.audit.record(&AuditEvent::EnrollmentApproved {
                    request_id,
                    identity_id: identity.id,
                    templates,
                });
                Ok(Review::Approved(identity))
            }
            Decision::Reject { reason } => {
                let request = self.store.reject(request_id, &reason)?;
                self.audit
                    .record(&AuditEvent::EnrollmentRejected { request_id, reason });
                Ok(Review::Rejected(request))
            }
        }
    }
}
