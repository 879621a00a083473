// ============================================================
// Layer 3 — Normalized Bitmap and Prediction
// ============================================================
// The classifier never sees strokes. It sees a small, fixed-size
// grayscale grid produced by the image normalizer, and answers
// with a single digit label.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width × height of a single-channel bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitmapShape {
    pub width:  usize,
    pub height: usize,
}

impl BitmapShape {
    /// Input shape of the bundled digit model (MNIST layout).
    pub const MODEL_DEFAULT: BitmapShape = BitmapShape { width: 28, height: 28 };

    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BitmapShape {
    fn default() -> Self {
        Self::MODEL_DEFAULT
    }
}

impl fmt::Display for BitmapShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Fixed-size grayscale grid, row-major, one byte per pixel.
///
/// Always built whole by the normalizer; there is no API to
/// mutate pixels after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBitmap {
    shape:  BitmapShape,
    pixels: Vec<u8>,
}

impl NormalizedBitmap {
    /// Returns None when the pixel count doesn't match the shape.
    pub fn from_pixels(shape: BitmapShape, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == shape.len()).then_some(Self { shape, pixels })
    }

    pub fn shape(&self) -> BitmapShape {
        self.shape
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.shape.width + x]
    }

    /// Pixels scaled to [0, 1], the layout the model consumes.
    pub fn to_unit_floats(&self) -> Vec<f32> {
        self.pixels.iter().map(|&p| unit_scale(p)).collect()
    }

    pub fn mean(&self) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        self.pixels.iter().map(|&p| p as f64).sum::<f64>() / self.pixels.len() as f64
    }

    pub fn variance(&self) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        self.pixels
            .iter()
            .map(|&p| (p as f64 - mean).powi(2))
            .sum::<f64>()
            / self.pixels.len() as f64
    }

    /// Coarse terminal preview: one character per pixel, darker
    /// characters for brighter pixels.
    pub fn ascii_preview(&self) -> String {
        const RAMP: &[u8] = b" .:-=+*#%@";
        let mut out = String::with_capacity((self.shape.width + 1) * self.shape.height);
        for row in self.pixels.chunks(self.shape.width) {
            for &p in row {
                let idx = p as usize * (RAMP.len() - 1) / 255;
                out.push(RAMP[idx] as char);
            }
            out.push('\n');
        }
        out
    }
}

/// Byte → [0, 1]. Shared by inference and the training batcher so
/// both see identical input scaling.
pub fn unit_scale(p: u8) -> f32 {
    p as f32 / 255.0
}

/// One classifier answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    digit:      u8,
    confidence: f32,
}

impl Prediction {
    /// Returns None for labels outside 0..=9.
    pub fn new(digit: u8, confidence: f32) -> Option<Self> {
        (digit <= 9).then_some(Self { digit, confidence })
    }

    pub fn digit(&self) -> u8 {
        self.digit
    }

    /// Top-1 softmax probability. Logged only; no decision uses it.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// The digit as the text the drill engine checks.
    pub fn as_answer(&self) -> String {
        self.digit.to_string()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_count_must_match_shape() {
        let shape = BitmapShape::new(2, 2);
        assert!(NormalizedBitmap::from_pixels(shape, vec![0; 3]).is_none());
        assert!(NormalizedBitmap::from_pixels(shape, vec![0; 4]).is_some());
    }

    #[test]
    fn test_uniform_bitmap_has_zero_variance() {
        let bm = NormalizedBitmap::from_pixels(BitmapShape::new(3, 3), vec![255; 9]).unwrap();
        assert_eq!(bm.variance(), 0.0);
        assert_eq!(bm.mean(), 255.0);
    }

    #[test]
    fn test_unit_floats_span_zero_to_one() {
        let bm = NormalizedBitmap::from_pixels(BitmapShape::new(2, 1), vec![0, 255]).unwrap();
        assert_eq!(bm.to_unit_floats(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_prediction_rejects_non_digits() {
        assert!(Prediction::new(10, 0.9).is_none());
        assert_eq!(Prediction::new(7, 0.9).unwrap().as_answer(), "7");
    }

    #[test]
    fn test_ascii_preview_has_one_line_per_row() {
        let bm = NormalizedBitmap::from_pixels(BitmapShape::new(4, 3), vec![0; 12]).unwrap();
        assert_eq!(bm.ascii_preview().lines().count(), 3);
    }
}
