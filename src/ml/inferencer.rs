// ============================================================
// Layer 5 — Inferencer
// ============================================================
// The burn-backed DigitClassifier. Loaded once at start-up from
// the latest checkpoint and shared behind an Arc; a missing or
// unreadable checkpoint is a fatal start-up error.
//
// Inference runs on the CPU (ndarray): one 28×28 image per call
// does not need a GPU.

use anyhow::Result;
use burn::prelude::*;
use std::sync::Mutex;

use crate::data::batcher::bitmaps_to_tensor;
use crate::domain::bitmap::{BitmapShape, NormalizedBitmap, Prediction};
use crate::domain::traits::{ClassifierError, DigitClassifier};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{DigitCnn, DigitCnnConfig, NUM_CLASSES};

pub type InferBackend = burn::backend::NdArray;

pub struct BurnDigitClassifier<B: Backend = InferBackend> {
    model:       Mutex<DigitCnn<B>>,
    input_shape: BitmapShape,
    device:      B::Device,
}

impl BurnDigitClassifier<InferBackend> {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device = Default::default();
        let cfg    = ckpt_manager.load_config()?;
        let model  = DigitCnnConfig::new(NUM_CLASSES, cfg.hidden_size)
            .with_dropout(0.0)
            .init::<InferBackend>(&device);
        let model  = ckpt_manager.load_model(model, &device)?;

        let input_shape = cfg.input_shape();
        tracing::info!("Digit model loaded from checkpoint (input {})", input_shape);
        Ok(Self::new(model, input_shape, device))
    }
}

impl<B: Backend> BurnDigitClassifier<B> {
    pub fn new(model: DigitCnn<B>, input_shape: BitmapShape, device: B::Device) -> Self {
        Self { model: Mutex::new(model), input_shape, device }
    }
}

impl<B: Backend> DigitClassifier for BurnDigitClassifier<B>
where
    B::Device: Sync,
{
    fn input_shape(&self) -> BitmapShape {
        self.input_shape
    }

    fn classify(&self, bitmap: &NormalizedBitmap) -> Result<Prediction, ClassifierError> {
        assert_eq!(
            bitmap.shape(),
            self.input_shape,
            "bitmap shape must match the model input shape"
        );

        let input  = bitmaps_to_tensor::<B>(&[bitmap], &self.device);
        let logits = {
            let model = self
                .model
                .lock()
                .map_err(|_| ClassifierError::InferenceFailed("model lock poisoned".into()))?;
            model.forward(input)
        };

        let probs: Vec<f32> = burn::tensor::activation::softmax(logits, 1)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ClassifierError::InferenceFailed(format!("{e:?}")))?;

        let (digit, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, p)| p.is_finite())
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| ClassifierError::InferenceFailed("model produced no finite scores".into()))?;

        let prediction = Prediction::new(digit as u8, confidence).ok_or_else(|| {
            ClassifierError::InferenceFailed(format!("class index {digit} is not a digit"))
        })?;

        tracing::debug!("Predicted {} (p={:.3})", prediction.digit(), prediction.confidence());
        Ok(prediction)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn untrained() -> BurnDigitClassifier<InferBackend> {
        let device = Default::default();
        let model  = DigitCnnConfig::new(NUM_CLASSES, 16)
            .with_dropout(0.0)
            .init::<InferBackend>(&device);
        BurnDigitClassifier::new(model, BitmapShape::MODEL_DEFAULT, device)
    }

    #[test]
    fn test_classify_returns_a_digit() {
        let bm = NormalizedBitmap::from_pixels(BitmapShape::MODEL_DEFAULT, vec![128; 784]).unwrap();
        let p  = untrained().classify(&bm).unwrap();
        assert!(p.digit() <= 9);
        assert!(p.confidence() > 0.0 && p.confidence() <= 1.0);
    }

    #[test]
    fn test_classify_is_deterministic_without_dropout() {
        let c  = untrained();
        let bm = NormalizedBitmap::from_pixels(BitmapShape::MODEL_DEFAULT, vec![40; 784]).unwrap();
        assert_eq!(c.classify(&bm).unwrap(), c.classify(&bm).unwrap());
    }

    #[test]
    #[should_panic]
    fn test_wrong_shape_is_a_programming_error() {
        let bm = NormalizedBitmap::from_pixels(BitmapShape::new(14, 14), vec![0; 196]).unwrap();
        let _  = untrained().classify(&bm);
    }
}
