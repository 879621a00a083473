// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between layers. The application layer is written
// against these traits only, so tests can swap in mocks:
//
//   DigitClassifier  — ml::inferencer::BurnDigitClassifier
//   DigitSource      — data::loader::IdxLoader
//   QuestionAnswerer — infra::chat_client::ChatClient
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use thiserror::Error;

use crate::domain::bitmap::{BitmapShape, NormalizedBitmap, Prediction};

// ─── DigitClassifier ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

/// Maps a normalized bitmap to a digit label.
///
/// Implementations are loaded once and shared read-only between
/// threads, hence `Send + Sync`.
pub trait DigitClassifier: Send + Sync {
    /// The exact bitmap shape `classify` accepts.
    fn input_shape(&self) -> BitmapShape;

    /// Top-1 digit for the bitmap.
    ///
    /// # Panics
    /// When `bitmap.shape() != self.input_shape()`. Feeding the
    /// wrong shape is a caller bug, not a runtime condition.
    fn classify(&self, bitmap: &NormalizedBitmap) -> Result<Prediction, ClassifierError>;
}

// ─── DigitSource ──────────────────────────────────────────────────────────────

/// A bitmap with its ground-truth digit, used for training.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBitmap {
    pub bitmap: NormalizedBitmap,
    pub label:  u8,
}

/// Anything that can supply labelled digit images.
pub trait DigitSource {
    fn load_all(&self) -> Result<Vec<LabeledBitmap>>;
}

// ─── QuestionAnswerer ─────────────────────────────────────────────────────────

/// Reply from the chat assistant. Media links are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text:      String,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
}

impl Answer {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self { text: text.into(), video_url: None, audio_url: None }
    }
}

/// Any component that can answer a free-text question.
pub trait QuestionAnswerer {
    fn answer(&self, question: &str) -> Result<Answer>;
}
