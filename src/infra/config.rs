// ============================================================
// Layer 6 — Application Config
// ============================================================
// Runtime settings for the drill, recognize and ask commands,
// read from a JSON file given with `--config`. Every field has a
// default, so a partial file (or none at all) is valid:
//
//   {
//     "canvas":      { "width": 200, "height": 200, "stroke_width": 30 },
//     "normalizer":  { "padding": 10, "invert": true },
//     "recognition": { "auto_recognize_secs": 4 },
//     "chat":        { "base_url": "http://127.0.0.1:8000", "timeout_secs": 30 },
//     "model":       { "checkpoint_dir": "checkpoints" }
//   }
//
// Training hyper-parameters are not here: they live in TrainConfig
// and travel with the checkpoint.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::data::normalizer::NormalizerSettings;
use crate::domain::drawing::{Rect, DEFAULT_CANVAS_SIDE, DEFAULT_STROKE_WIDTH};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub canvas:      CanvasSettings,
    pub normalizer:  NormalizerSettings,
    pub recognition: RecognitionSettings,
    pub chat:        ChatSettings,
    pub model:       ModelSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub width:        f32,
    pub height:       f32,
    /// Pen width for strokes entered in the terminal session.
    pub stroke_width: f32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width:        DEFAULT_CANVAS_SIDE,
            height:       DEFAULT_CANVAS_SIDE,
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }
}

impl CanvasSettings {
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Inactivity period before an automatic recognition attempt.
    pub auto_recognize_secs: f64,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self { auto_recognize_secs: 4.0 }
    }
}

impl RecognitionSettings {
    /// Non-positive or non-finite values fall back to the default.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(self.auto_recognize_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| Duration::from_secs(4))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub base_url:     String,
    pub timeout_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            base_url:     "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub checkpoint_dir: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self { checkpoint_dir: "checkpoints".to_string() }
    }
}

impl AppConfig {
    /// Defaults when `path` is None; a given file must exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            tracing::debug!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{}'", path.display()))?;
        let config: AppConfig = serde_json::from_str(&json)
            .with_context(|| format!("Malformed config file '{}'", path.display()))?;

        tracing::info!("Loaded config from '{}'", path.display());
        Ok(config)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_path_gives_defaults() {
        let cfg = AppConfig::load(None).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.recognition.period(), Duration::from_secs(4));
        assert!(cfg.normalizer.invert);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("aula.json");
        fs::write(&path, r#"{"chat": {"base_url": "http://10.0.0.2:9000"}, "normalizer": {"invert": false}}"#).unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.chat.base_url,     "http://10.0.0.2:9000");
        assert_eq!(cfg.chat.timeout_secs, 30);
        assert!(!cfg.normalizer.invert);
        assert_eq!(cfg.normalizer.padding, 10.0);
        assert_eq!(cfg.canvas.width,       200.0);
    }

    #[test]
    fn test_missing_or_broken_file_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        assert!(AppConfig::load(Some(&path)).is_err());

        fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_bad_period_falls_back() {
        let zero     = RecognitionSettings { auto_recognize_secs: 0.0 };
        let negative = RecognitionSettings { auto_recognize_secs: -2.0 };
        let custom   = RecognitionSettings { auto_recognize_secs: 1.5 };
        assert_eq!(zero.period(),     Duration::from_secs(4));
        assert_eq!(negative.period(), Duration::from_secs(4));
        assert_eq!(custom.period(),   Duration::from_millis(1500));
    }
}
