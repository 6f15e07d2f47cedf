//! Face template index with exact cosine search over atomically
//! swapped snapshots.
//!
//! # Usage
//!
//! ```
//! use rollcall_gallery::Gallery;
//! use rollcall_identity::IdentityId;
//!
//! let gallery = Gallery::new(4);
//! let dana = IdentityId::from_u128(1);
//! gallery.insert(dana, &[0.9, 0.1, 0.0, 0.0]).unwrap();
//!
//! let hits = gallery.search(&[1.0, 0.0, 0.0, 0.0], 3).unwrap();
//! assert_eq!(hits[0].identity_id, dana);
//! ```
//!
//! # Design
//!
//! Searches run against an immutable [`GallerySnapshot`] behind an `Arc`,
//! so readers never block writers and never observe a half-applied change.
//! Each mutation clones the current entries, builds a successor snapshot
//! and swaps it in under a brief write lock. Templates are L2-normalized
//! on every ingestion path; queries are compared as-is since cosine
//! distance is scale invariant.

pub mod cosine;
pub mod error;
pub mod index;
pub mod io;

pub use cosine::{cosine_distance, l2_normalize};
pub use error::GalleryError;
pub use index::{Gallery, GallerySnapshot, Hit};
pub use io::{load as load_gallery, save as save_gallery};
