// ============================================================
// Layer 4 — Loaders
// ============================================================
// Two on-disk formats enter the system here:
//
//   1. IDX files (the MNIST distribution format) — labelled digit
//      images used to train the classifier.
//
//        images:  [0x00000803][count][rows][cols][count*rows*cols bytes]
//        labels:  [0x00000801][count][count bytes]
//
//      All header integers are big-endian u32.
//
//   2. Drawing files (JSON) — strokes captured elsewhere, used by
//      the `recognize` command and the drill session's `load`.
//
// Reference: Rust Book §9 (Error Handling), §12 (I/O)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::domain::bitmap::{BitmapShape, NormalizedBitmap};
use crate::domain::drawing::{Drawing, Rect, Stroke, DEFAULT_CANVAS_SIDE};
use crate::domain::traits::{DigitSource, LabeledBitmap};

const IMAGES_MAGIC: u32 = 0x0000_0803;
const LABELS_MAGIC: u32 = 0x0000_0801;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{file}: bad magic number {found:#010x}, expected {expected:#010x}")]
    BadMagic { file: String, found: u32, expected: u32 },

    #[error("{file}: truncated (needed {needed} bytes, found {found})")]
    Truncated { file: String, needed: usize, found: usize },

    #[error("image count {images} does not match label count {labels}")]
    CountMismatch { images: usize, labels: usize },

    #[error("images are {found}, the model expects {expected}")]
    ShapeMismatch { found: BitmapShape, expected: BitmapShape },

    #[error("label {0} is not a digit")]
    BadLabel(u8),
}

// ─── IDX ──────────────────────────────────────────────────────────────────────

/// Loads a pair of IDX image/label files.
pub struct IdxLoader {
    images: PathBuf,
    labels: PathBuf,
    shape:  BitmapShape,
}

impl IdxLoader {
    pub fn new(images: impl Into<PathBuf>, labels: impl Into<PathBuf>, shape: BitmapShape) -> Self {
        Self { images: images.into(), labels: labels.into(), shape }
    }

    /// The standard MNIST training file names inside `dir`.
    pub fn mnist_train(dir: impl AsRef<Path>, shape: BitmapShape) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join("train-images-idx3-ubyte"),
            dir.join("train-labels-idx1-ubyte"),
            shape,
        )
    }
}

impl DigitSource for IdxLoader {
    fn load_all(&self) -> Result<Vec<LabeledBitmap>> {
        let image_bytes = fs::read(&self.images)
            .with_context(|| format!("Cannot read '{}'", self.images.display()))?;
        let label_bytes = fs::read(&self.labels)
            .with_context(|| format!("Cannot read '{}'", self.labels.display()))?;

        let samples = parse_idx(
            &image_bytes,
            &label_bytes,
            self.shape,
            &self.images.display().to_string(),
            &self.labels.display().to_string(),
        )?;

        tracing::info!(
            "Loaded {} labelled digits from '{}'",
            samples.len(),
            self.images.display()
        );
        Ok(samples)
    }
}

/// Decode in-memory IDX image and label buffers.
pub fn parse_idx(
    images:      &[u8],
    labels:      &[u8],
    expected:    BitmapShape,
    images_name: &str,
    labels_name: &str,
) -> Result<Vec<LabeledBitmap>, LoadError> {
    let img_header = read_header(images, images_name, IMAGES_MAGIC, 4)?;
    let lbl_header = read_header(labels, labels_name, LABELS_MAGIC, 2)?;

    let (count, rows, cols) = (img_header[1] as usize, img_header[2] as usize, img_header[3] as usize);
    let label_count         = lbl_header[1] as usize;

    if count != label_count {
        return Err(LoadError::CountMismatch { images: count, labels: label_count });
    }

    let shape = BitmapShape::new(cols, rows);
    if shape != expected || shape.is_empty() {
        return Err(LoadError::ShapeMismatch { found: shape, expected });
    }

    let img_body = &images[16..];
    let lbl_body = &labels[8..];
    check_len(img_body, count * shape.len(), images_name)?;
    check_len(lbl_body, count, labels_name)?;

    img_body
        .chunks_exact(shape.len())
        .zip(lbl_body)
        .take(count)
        .map(|(pixels, &label)| {
            if label > 9 {
                return Err(LoadError::BadLabel(label));
            }
            let bitmap = NormalizedBitmap::from_pixels(shape, pixels.to_vec()).ok_or_else(|| {
                LoadError::Truncated { file: images_name.to_string(), needed: shape.len(), found: pixels.len() }
            })?;
            Ok(LabeledBitmap { bitmap, label })
        })
        .collect()
}

/// Read `words` big-endian u32s and verify the magic number.
/// The magic is checked before the rest of the header so a swapped
/// pair reports `BadMagic` rather than `Truncated`.
fn read_header(bytes: &[u8], file: &str, magic: u32, words: usize) -> Result<Vec<u32>, LoadError> {
    check_len(bytes, 4, file)?;
    let found = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if found != magic {
        return Err(LoadError::BadMagic { file: file.to_string(), found, expected: magic });
    }

    check_len(bytes, words * 4, file)?;
    Ok(bytes[..words * 4]
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn check_len(bytes: &[u8], needed: usize, file: &str) -> Result<(), LoadError> {
    if bytes.len() < needed {
        return Err(LoadError::Truncated { file: file.to_string(), needed, found: bytes.len() });
    }
    Ok(())
}

// ─── Drawing files ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width:  f32,
    pub height: f32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self { width: DEFAULT_CANVAS_SIDE, height: DEFAULT_CANVAS_SIDE }
    }
}

/// JSON layout of a saved drawing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawingFile {
    #[serde(default)]
    pub canvas:  CanvasSize,
    #[serde(default)]
    pub strokes: Vec<Stroke>,
}

impl DrawingFile {
    pub fn into_drawing(self) -> Drawing {
        Drawing::with_strokes(Rect::from_size(self.canvas.width, self.canvas.height), self.strokes)
    }
}

/// Load a drawing JSON file.
pub fn load_drawing(path: impl AsRef<Path>) -> Result<Drawing> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read drawing '{}'", path.display()))?;
    let file: DrawingFile = serde_json::from_str(&json)
        .with_context(|| format!("'{}' is not a valid drawing file", path.display()))?;

    let drawing = file.into_drawing();
    tracing::debug!("Loaded {} strokes from '{}'", drawing.strokes().len(), path.display());
    Ok(drawing)
}
