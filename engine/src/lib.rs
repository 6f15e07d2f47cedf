//! Face identity resolution and enrollment lifecycle engine.
//!
//! Ties together the identity store, the embedding provider and the
//! template gallery: enrollment submissions run the quality gate and
//! embedding, reviews drive the request state machine and the index,
//! resolution matches captures against active identities under a
//! threshold-plus-ambiguity policy, and attendance marking dedups per
//! identity, day and check type.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use rollcall_embed::{EmbedError, FaceEmbedder, FaceImage};
//! use rollcall_engine::{Engine, EngineConfig, Resolved};
//! use rollcall_identity::MemoryIdentityStore;
//!
//! struct FixedEmbedder;
//!
//! impl FaceEmbedder for FixedEmbedder {
//!     fn embed(&self, image: &FaceImage) -> Result<Vec<f32>, EmbedError> {
//!         Ok(vec![image.luma()[0] as f32, 1.0, 0.0, 0.0])
//!     }
//!     fn dimension(&self) -> usize {
//!         4
//!     }
//! }
//!
//! let engine = Engine::new(
//!     EngineConfig { dim: 4, ..EngineConfig::default() },
//!     Arc::new(MemoryIdentityStore::new()),
//!     Arc::new(FixedEmbedder),
//! );
//!
//! let capture = FaceImage::from_luma(2, 2, vec![128, 0, 0, 0]).unwrap();
//! let resolved = engine.resolve_face(&capture).unwrap();
//! assert!(matches!(resolved, Resolved::NoMatch { best: None }));
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod enroll;
pub mod error;
pub mod maintain;
pub mod resolve;

pub use audit::{AuditEvent, AuditSink, MemorySink, NopSink};
pub use config::EngineConfig;
pub use engine::Engine;
pub use enroll::{Decision, ImageReport, Review, SubmissionReceipt};
pub use error::EngineError;
pub use maintain::RebuildReport;
pub use resolve::{Marked, Resolved};
