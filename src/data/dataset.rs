use burn::data::dataset::Dataset;

use crate::domain::bitmap::BitmapShape;
use crate::domain::traits::LabeledBitmap;

/// In-memory set of labelled digit bitmaps, all of one shape.
pub struct DigitDataset {
    samples: Vec<LabeledBitmap>,
}

impl DigitDataset {
    pub fn new(samples: Vec<LabeledBitmap>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// Shape of the first sample; None when empty.
    pub fn shape(&self) -> Option<BitmapShape> {
        self.samples.first().map(|s| s.bitmap.shape())
    }

    /// Number of samples per digit 0..=9.
    pub fn label_histogram(&self) -> [usize; 10] {
        let mut counts = [0usize; 10];
        for s in &self.samples {
            counts[s.label as usize % 10] += 1;
        }
        counts
    }
}

impl Dataset<LabeledBitmap> for DigitDataset {
    fn get(&self, index: usize) -> Option<LabeledBitmap> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
