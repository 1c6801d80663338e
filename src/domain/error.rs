// ============================================================
// Layer 3 — Architecture Errors
// ============================================================
// Every failure a builder can report. Builders never fall back
// silently: an unknown strategy, a missing input, a wrong shape
// or a broken pretrained artifact all surface here and are
// returned to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, validating or loading a model graph.
#[derive(Debug, Error)]
pub enum ArchError {
    /// The emotion strategy string is neither "Bottom-up" nor "Top-down".
    #[error("invalid emotion strategy '{0}': expected \"Bottom-up\" or \"Top-down\"")]
    InvalidStrategy(String),

    /// A named input declared by the model signature was not supplied.
    #[error("missing model input '{0}'")]
    MissingInput(String),

    /// Tensor or signature shapes disagree with what the graph expects.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A pretrained artifact is missing, unreadable or corrupt.
    #[error("cannot load artifact '{}': {reason}", .path.display())]
    ArtifactLoad { path: PathBuf, reason: String },

    /// Writing an artifact to disk failed.
    #[error("cannot save artifact '{}': {reason}", .path.display())]
    ArtifactSave { path: PathBuf, reason: String },

    /// The artifact has the right inputs but cannot be truncated into a trunk.
    #[error("'{name}' cannot serve as a trunk: {reason}")]
    UnsupportedTrunk { name: String, reason: String },

    /// The truncation offset reaches past the first layer of the artifact.
    #[error("trunk offset {offset} exceeds the {layers} layers of '{name}'")]
    TrunkTooShallow { name: String, layers: usize, offset: usize },

    /// The requested cut point does not yield a rank-2 representation.
    #[error("cannot truncate at layer {index} ('{name}'): {reason}")]
    UnsupportedCut { index: usize, name: String, reason: String },
}
