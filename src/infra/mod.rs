// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence of model graphs:
//
//   artifact.rs - one directory per saved graph. Burn's
//                 full-precision NamedMpkGzFileRecorder stores
//                 the parameters and a JSON manifest stores the
//                 config and signature needed to rebuild the
//                 graph before loading.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Artifact saving, loading and trunk signature checks
pub mod artifact;
