// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores DigitCnn weights using Burn's CompactRecorder.
//
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights after epoch 1
//     model_epoch_2.mpk.gz
//     ...
//     latest_epoch.json      ← number of the last saved epoch
//     train_config.json      ← TrainConfig (input shape, hidden size)
//
// Weights are useless without the config: the inferencer rebuilds
// the network from train_config.json before loading the record.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::DigitCnn;

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::debug!("Cannot create '{}': {}", dir.display(), e);
        }
        Self { dir }
    }

    /// Write {dir}/model_epoch_{epoch}.mpk.gz and move the latest pointer.
    pub fn save_model<B: Backend>(&self, model: &DigitCnn<B>, epoch: usize) -> Result<()> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join(LATEST_EPOCH_FILE);
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {LATEST_EPOCH_FILE}"))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the latest weights into a freshly built model of the same
    /// architecture.
    pub fn load_model<B: Backend>(&self, model: DigitCnn<B>, device: &B::Device) -> Result<DigitCnn<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(TRAIN_CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(TRAIN_CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' first.",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed training config '{}'", path.display()))
    }

    /// Errors if training hasn't been run yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_EPOCH_FILE);

        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{LATEST_EPOCH_FILE}'. Have you run 'train' first?"))?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::{DigitCnnConfig, NUM_CLASSES};

    type TestBackend = burn::backend::NdArray;

    fn manager() -> (tempfile::TempDir, CheckpointManager) {
        let dir  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(dir.path().to_string_lossy().into_owned());
        (dir, mgr)
    }

    #[test]
    fn test_config_round_trip() {
        let (_dir, mgr) = manager();
        let cfg = TrainConfig { hidden_size: 77, input_width: 20, ..TrainConfig::default() };
        mgr.save_config(&cfg).unwrap();
        assert_eq!(mgr.load_config().unwrap(), cfg);
    }

    #[test]
    fn test_untrained_directory_reports_missing_files() {
        let (_dir, mgr) = manager();
        assert!(mgr.latest_epoch().is_err());
        assert!(mgr.load_config().is_err());
    }

    #[test]
    fn test_saved_weights_load_back() {
        let (_dir, mgr) = manager();
        let device      = Default::default();
        let cfg         = DigitCnnConfig::new(NUM_CLASSES, 8).with_dropout(0.0);
        let trained     = cfg.init::<TestBackend>(&device);

        mgr.save_model(&trained, 3).unwrap();
        assert_eq!(mgr.latest_epoch().unwrap(), 3);

        let restored = mgr.load_model(cfg.init::<TestBackend>(&device), &device).unwrap();
        let input    = Tensor::<TestBackend, 3>::ones([1, 28, 28], &device);
        let a: Vec<f32> = trained.forward(input.clone()).into_data().to_vec().unwrap();
        let b: Vec<f32> = restored.forward(input).into_data().to_vec().unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-2);
        }
    }
}
