// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Two pipelines share this layer.
//
// Recognition (every attempt):
//
//   Drawing (strokes)
//       │
//       ▼
//   ImageNormalizer   → square, centred, downscaled bitmap
//       │
//       ▼
//   classifier input
//
// Training (the `train` command):
//
//   IDX files
//       │
//       ▼
//   IdxLoader         → labelled bitmaps
//       │
//       ▼
//   split_train_val   → shuffled train / validation parts
//       │
//       ▼
//   DigitDataset      → Burn's Dataset trait
//       │
//       ▼
//   DigitBatcher      → [N, H, W] image tensors + [N] targets
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Strokes → fixed-size grayscale bitmap
pub mod normalizer;

/// IDX training files and drawing JSON files
pub mod loader;

/// Implements Burn's Dataset trait for labelled digits
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
