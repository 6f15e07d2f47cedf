use crate::error::EmbedError;
use crate::image::FaceImage;

/// FaceEmbedder converts face captures into dense float32 vectors.
///
/// Implementations must be safe for concurrent use (Send + Sync).
pub trait FaceEmbedder: Send + Sync {
    /// Return the embedding vector for a single capture.
    ///
    /// The capture must contain exactly one detectable face; implementations
    /// report [`EmbedError::NoFaceDetected`] or
    /// [`EmbedError::MultipleFacesDetected`] otherwise.
    fn embed(&self, image: &FaceImage) -> Result<Vec<f32>, EmbedError>;

    /// Return the dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
