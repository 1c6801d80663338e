// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust descriptions of what a model graph IS: its named
// inputs and outputs, its layer table, the emotion wiring
// strategy, and the errors a builder may report.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// The ml layer produces these descriptions; the infra layer
// persists them in artifact manifests; the CLI prints them.

/// Typed errors shared by every builder
pub mod error;

/// Named tensor specs, signatures and layer tables
pub mod signature;

/// Emotion wiring strategy and architecture kinds
pub mod strategy;
