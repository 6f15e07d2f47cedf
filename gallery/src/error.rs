use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("gallery: dimension mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    #[error("gallery: zero vector")]
    ZeroVector,

    #[error("gallery: index unavailable")]
    Unavailable,

    #[error("gallery: {0}")]
    Io(String),

    #[error("gallery: invalid format: {0}")]
    InvalidFormat(String),
}
