use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embed: no face detected")]
    NoFaceDetected,

    #[error("embed: {count} faces detected, expected one")]
    MultipleFacesDetected { count: usize },

    #[error("embed: quality {score:.2} below threshold {threshold:.2}")]
    LowQuality { score: f32, threshold: f32 },

    #[error("embed: invalid image: {0}")]
    InvalidImage(String),

    #[error("embed: model error: {0}")]
    Model(String),
}
