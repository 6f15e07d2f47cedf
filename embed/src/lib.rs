pub mod embed;
pub mod error;
pub mod image;
pub mod quality;

pub use embed::FaceEmbedder;
pub use error::EmbedError;
pub use image::FaceImage;
pub use quality::QualityReport;
