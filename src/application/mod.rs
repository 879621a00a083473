// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no model math, no file formats,
// no HTTP. Each module here drives lower layers toward one goal.
//
//   recognition        — drawing → background recognition job
//   drill_engine       — exercise generation and answer checking
//   drill_session      — the interactive `drill` loop
//   chat_use_case      — conversation with the teaching assistant
//   recognize_use_case — one-shot `recognize` of a drawing file
//   train_use_case     — the `train` pipeline
//
// Reference: Clean Architecture pattern
//            Rust Book §16 (Fearless Concurrency: channels)

/// Recognition state machine and worker hand-off
pub mod recognition;

/// Exercise generation, grading and the clear-canvas signal
pub mod drill_engine;

/// Terminal drill loop
pub mod drill_session;

/// Chat transcript over a QuestionAnswerer
pub mod chat_use_case;

/// One-shot drawing file recognition
pub mod recognize_use_case;

/// The training workflow
pub mod train_use_case;
