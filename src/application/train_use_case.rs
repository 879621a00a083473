// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the classifier training pipeline in order:
//
//   Step 1: Load IDX images + labels  (Layer 4 - data)
//   Step 2: Split train/validation    (Layer 4 - data)
//   Step 3: Build datasets            (Layer 4 - data)
//   Step 4: Save config               (Layer 6 - infra)
//   Step 5: Run training loop         (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{dataset::DigitDataset, loader::IdxLoader, splitter::split_train_val};
use crate::domain::bitmap::BitmapShape;
use crate::domain::traits::DigitSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// Saved next to the weights as train_config.json; the inferencer reads
// input_width/input_height and hidden_size back to rebuild the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub input_width:    usize,
    pub input_height:   usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub hidden_size:    usize,
    pub dropout:        f64,
    pub train_fraction: f64,
    pub seed:           u64,
    pub num_workers:    usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "data/mnist".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            input_width:    BitmapShape::MODEL_DEFAULT.width,
            input_height:   BitmapShape::MODEL_DEFAULT.height,
            batch_size:     64,
            epochs:         5,
            lr:             1e-3,
            hidden_size:    128,
            dropout:        0.3,
            train_fraction: 0.9,
            seed:           42,
            num_workers:    2,
        }
    }
}

impl TrainConfig {
    pub fn input_shape(&self) -> BitmapShape {
        BitmapShape::new(self.input_width, self.input_height)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load labelled digits ──────────────────────────────────────
        let loader  = IdxLoader::mnist_train(&cfg.data_dir, cfg.input_shape());
        let samples = loader.load_all()?;
        if samples.is_empty() {
            bail!("No training samples found in '{}'", cfg.data_dir);
        }

        // ── Step 2: Train / validation split ──────────────────────────────────
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let (train_samples, val_samples) = split_train_val(samples, cfg.train_fraction, &mut rng);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        // ── Step 3: Build Burn datasets ───────────────────────────────────────
        let train_dataset = DigitDataset::new(train_samples);
        let val_dataset   = DigitDataset::new(val_samples);
        tracing::debug!("Training label histogram: {:?}", train_dataset.label_histogram());

        // ── Step 4: Save config for inference ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, train_dataset, val_dataset, ckpt_manager)?;

        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_input_shape_is_model_default() {
        assert_eq!(TrainConfig::default().input_shape(), BitmapShape::MODEL_DEFAULT);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: TrainConfig = serde_json::from_str(r#"{"epochs": 2, "lr": 0.01}"#).unwrap();
        assert_eq!(cfg.epochs,         2);
        assert_eq!(cfg.lr,             0.01);
        assert_eq!(cfg.train_fraction, 0.9);
        assert_eq!(cfg.input_width,    28);
    }

    #[test]
    fn test_missing_data_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            data_dir:       dir.path().join("nope").to_string_lossy().into_owned(),
            checkpoint_dir: dir.path().join("ckpt").to_string_lossy().into_owned(),
            ..TrainConfig::default()
        };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }
}
