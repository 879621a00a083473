// ============================================================
// Layer 4 — Digit Batcher
// ============================================================
// Implements Burn's Batcher trait: a Vec of labelled bitmaps
// becomes one image tensor and one target tensor.
//
//   Input:  N bitmaps of H×W bytes, N labels
//   Output: images  [N, H, W]  floats in [0, 1]
//           targets [N]        digit labels
//
// `bitmaps_to_tensor` is also what the inferencer uses for a
// single drawing, so training and inference scale pixels the
// same way.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::bitmap::NormalizedBitmap;
use crate::domain::traits::LabeledBitmap;

/// A batch of digit images ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct DigitBatch<B: Backend> {
    /// Shape: [batch_size, height, width]
    pub images: Tensor<B, 3>,

    /// Shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug, Default)]
pub struct DigitBatcher;

impl DigitBatcher {
    pub fn new() -> Self {
        Self
    }
}

/// Stack bitmaps (all of one shape) into a [N, H, W] float tensor.
pub fn bitmaps_to_tensor<B: Backend>(bitmaps: &[&NormalizedBitmap], device: &B::Device) -> Tensor<B, 3> {
    let shape = bitmaps
        .first()
        .map(|b| b.shape())
        .unwrap_or_default();

    let flat: Vec<f32> = bitmaps
        .iter()
        .flat_map(|b| b.to_unit_floats())
        .collect();

    let data = TensorData::new(flat, [bitmaps.len(), shape.height, shape.width])
        .convert::<B::FloatElem>();
    Tensor::<B, 3>::from_data(data, device)
}

impl<B: Backend> Batcher<B, LabeledBitmap, DigitBatch<B>> for DigitBatcher {
    fn batch(&self, items: Vec<LabeledBitmap>, device: &B::Device) -> DigitBatch<B> {
        let bitmaps: Vec<&NormalizedBitmap> = items.iter().map(|s| &s.bitmap).collect();
        let images = bitmaps_to_tensor::<B>(&bitmaps, device);

        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [items.len()]).convert::<B::IntElem>(),
            device,
        );

        DigitBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bitmap::BitmapShape;

    type TestBackend = burn::backend::NdArray;

    fn sample(fill: u8, label: u8) -> LabeledBitmap {
        let bitmap = NormalizedBitmap::from_pixels(BitmapShape::new(3, 2), vec![fill; 6]).unwrap();
        LabeledBitmap { bitmap, label }
    }

    #[test]
    fn test_batch_shapes_and_scaling() {
        let device = Default::default();
        let batch: DigitBatch<TestBackend> =
            DigitBatcher::new().batch(vec![sample(255, 4), sample(0, 7)], &device);

        assert_eq!(batch.images.dims(),  [2, 2, 3]);
        assert_eq!(batch.targets.dims(), [2]);

        let pixels: Vec<f32> = batch.images.into_data().to_vec::<f32>().unwrap();
        assert_eq!(pixels[0],  1.0);
        assert_eq!(pixels[11], 0.0);

        let labels: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(labels, vec![4, 7]);
    }
}
