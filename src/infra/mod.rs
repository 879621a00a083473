// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to one business layer:
//
//   config.rs      — AppConfig, the JSON file behind `--config`
//
//   checkpoint.rs  — DigitCnn weights via Burn's CompactRecorder,
//                    plus TrainConfig as JSON so inference can
//                    rebuild the network
//
//   metrics.rs     — per-epoch training metrics appended to CSV
//
//   chat_client.rs — blocking HTTP client for the assistant's
//                    /ask endpoint
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Runtime settings file
pub mod config;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// HTTP client for the question-answering assistant
pub mod chat_client;
