use serde::Serialize;

use crate::image::FaceImage;

const SHARPNESS_WEIGHT: f32 = 0.4;
const BRIGHTNESS_WEIGHT: f32 = 0.3;
const CONTRAST_WEIGHT: f32 = 0.3;

/// Per-metric breakdown of a capture quality score.
/// All fields are in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityReport {
    /// Weighted total: 0.4 sharpness + 0.3 brightness + 0.3 contrast.
    pub score: f32,
    pub sharpness: f32,
    pub brightness: f32,
    pub contrast: f32,
}

/// Score a capture for enrollment suitability.
///
/// Sharpness is the variance of a 4-neighbour Laplacian, saturating at 100.
/// Brightness peaks at a mid-gray mean and falls off toward pure black or
/// white. Contrast is the pixel standard deviation, saturating at half the
/// dynamic range.
pub fn assess(image: &FaceImage) -> QualityReport {
    let sharpness = (laplacian_variance(image) / 100.0).min(1.0) as f32;
    let (mean, std) = mean_std(image);
    let brightness = (1.0 - ((mean / 255.0 - 0.5).abs() * 2.0).min(1.0)) as f32;
    let contrast = (std / 128.0).min(1.0) as f32;
    QualityReport {
        score: SHARPNESS_WEIGHT * sharpness
            + BRIGHTNESS_WEIGHT * brightness
            + CONTRAST_WEIGHT * contrast,
        sharpness,
        brightness,
        contrast,
    }
}

fn laplacian_variance(image: &FaceImage) -> f64 {
    let (w, h) = (image.width(), image.height());
    if w < 3 || h < 3 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let n = ((w - 2) * (h - 2)) as f64;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = image.pixel(x, y) as f64;
            let response = image.pixel(x, y - 1) as f64
                + image.pixel(x, y + 1) as f64
                + image.pixel(x - 1, y) as f64
                + image.pixel(x + 1, y) as f64
                - 4.0 * center;
            sum += response;
            sum_sq += response * response;
        }
    }
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

fn mean_std(image: &FaceImage) -> (f64, f64) {
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let n = image.luma().len() as f64;
    for &p in image.luma() {
        let v = p as f64;
        sum += v;
        sum_sq += v * v;
    }
    let mean = sum / n;
    let std = (sum_sq / n - mean * mean).max(0.0).sqrt();
    (mean, std)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: usize, height: usize, value: u8) -> FaceImage {
        FaceImage::from_luma(width, height, vec![value; width * height]).unwrap()
    }

    fn checkerboard(width: usize, height: usize) -> FaceImage {
        let luma = (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                if (x + y) % 2 == 0 { 0 } else { 255 }
            })
            .collect();
        FaceImage::from_luma(width, height, luma).unwrap()
    }

    #[test]
    fn test_flat_black_scores_zero() {
        let report = assess(&flat(16, 16, 0));
        assert_eq!(report.sharpness, 0.0);
        assert_eq!(report.brightness, 0.0);
        assert_eq!(report.contrast, 0.0);
        assert_eq!(report.score, 0.0);
    }

    #[test]
    fn test_flat_midgray_scores_brightness_only() {
        let report = assess(&flat(16, 16, 128));
        assert_eq!(report.sharpness, 0.0);
        assert_eq!(report.contrast, 0.0);
        assert!(report.brightness > 0.99);
        assert!((report.score - BRIGHTNESS_WEIGHT * report.brightness).abs() < 1e-6);
    }

    #[test]
    fn test_checkerboard_scores_high() {
        let report = assess(&checkerboard(16, 16));
        assert_eq!(report.sharpness, 1.0);
        assert!(report.brightness > 0.99);
        assert!(report.contrast > 0.99);
        assert!(report.score > 0.95);
    }

    #[test]
    fn test_overexposed_brightness_drops() {
        let report = assess(&flat(16, 16, 255));
        assert_eq!(report.brightness, 0.0);

        let dim = assess(&flat(16, 16, 64));
        let mid = assess(&flat(16, 16, 128));
        assert!(dim.brightness < mid.brightness);
    }

    #[test]
    fn test_tiny_image_has_no_sharpness_signal() {
        let report = assess(&flat(2, 2, 128));
        assert_eq!(report.sharpness, 0.0);
    }
}
