// ============================================================
// Layer 3 — Emotion Strategy and Architecture Kinds
// ============================================================

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::domain::error::ArchError;

/// How the emotion heads of fItG_emotion are wired.
///
///   BottomUp - emotion reads an extra branch built from the
///              individual encodings only (no group stream)
///   TopDown  - emotion reads the same fused 16-unit group
///              representation as the cohesion heads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmotionStrategy {
    #[default]
    #[serde(rename = "Bottom-up")]
    BottomUp,
    #[serde(rename = "Top-down")]
    TopDown,
}

impl EmotionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionStrategy::BottomUp => "Bottom-up",
            EmotionStrategy::TopDown  => "Top-down",
        }
    }
}

impl fmt::Display for EmotionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionStrategy {
    type Err = ArchError;

    // Only the two literal spellings are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bottom-up" => Ok(EmotionStrategy::BottomUp),
            "Top-down"  => Ok(EmotionStrategy::TopDown),
            other       => Err(ArchError::InvalidStrategy(other.to_string())),
        }
    }
}

/// The four architecture families, as recorded in artifact manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitectureKind {
    Filstm,
    Fitg,
    FitgEmotion,
    Tbd,
}

impl fmt::Display for ArchitectureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArchitectureKind::Filstm      => "FI-LSTM",
            ArchitectureKind::Fitg        => "fItG",
            ArchitectureKind::FitgEmotion => "fItG_emotion",
            ArchitectureKind::Tbd         => "TBD",
        };
        f.write_str(s)
    }
}
