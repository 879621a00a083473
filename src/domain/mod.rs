// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// application works with. No burn types, no file I/O, no
// network calls live here.
//
//   drawing.rs  — ink points, strokes, the drawing on the canvas
//   bitmap.rs   — the normalized model input and the prediction
//   exercise.rs — arithmetic exercises and answer feedback
//   traits.rs   — seams implemented by the ml / data / infra layers
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

/// Points, strokes and the drawing captured on the canvas
pub mod drawing;

/// Normalized bitmaps and digit predictions
pub mod bitmap;

/// Exercises, operations and feedback
pub mod exercise;

/// Core abstractions (traits) that other layers implement
pub mod traits;
