// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that talks to burn's nn/optim/record APIs lives
// here. The recognition controller only sees the DigitClassifier
// trait, so it is testable without a model.
//
//   model.rs      — DigitCnn: two 3×3 convolutions, adaptive
//                   average pooling, two linear layers
//
//   trainer.rs    — forward pass, cross-entropy, backward pass,
//                   Adam step, per-epoch validation + checkpoint
//
//   inferencer.rs — loads the latest checkpoint and implements
//                   DigitClassifier (softmax, top-1)
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            LeCun et al. (1998) Gradient-Based Learning

/// Convolutional digit classifier architecture
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Checkpoint-backed DigitClassifier
pub mod inferencer;
