use crate::error::EmbedError;

/// A decoded grayscale face capture.
///
/// Pixels are 8-bit luma in row-major order. Decoding from camera formats
/// happens upstream; this type only guards the shape invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceImage {
    luma: Vec<u8>,
    width: usize,
    height: usize,
}

impl FaceImage {
    /// Wrap raw luma pixels. Fails when the buffer does not match the
    /// declared dimensions or either dimension is zero.
    pub fn from_luma(width: usize, height: usize, luma: Vec<u8>) -> Result<Self, EmbedError> {
        if width == 0 || height == 0 {
            return Err(EmbedError::InvalidImage(format!(
                "empty dimensions {width}x{height}"
            )));
        }
        if luma.len() != width * height {
            return Err(EmbedError::InvalidImage(format!(
                "{} pixels for {width}x{height}",
                luma.len()
            )));
        }
        Ok(Self { luma, width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn luma(&self) -> &[u8] {
        &self.luma
    }

    /// Pixel at (x, y). Panics when out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.luma[y * self.width + x]
    }
}
