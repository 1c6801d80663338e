// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Two subcommands, `summary` and `export`, both selecting an
// architecture through the same ArchArgs flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::build_use_case::BuildRequest;
use crate::domain::strategy::ArchitectureKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the layer table and signature of an architecture
    Summary(SummaryArgs),

    /// Write a freshly initialised architecture as an artifact directory
    Export(ExportArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchArg {
    Filstm,
    Fitg,
    FitgEmotion,
    Tbd,
}

impl From<ArchArg> for ArchitectureKind {
    fn from(a: ArchArg) -> Self {
        match a {
            ArchArg::Filstm      => ArchitectureKind::Filstm,
            ArchArg::Fitg        => ArchitectureKind::Fitg,
            ArchArg::FitgEmotion => ArchitectureKind::FitgEmotion,
            ArchArg::Tbd         => ArchitectureKind::Tbd,
        }
    }
}

/// Which graph to build.
#[derive(Args, Debug)]
pub struct ArchArgs {
    #[arg(long, value_enum)]
    pub arch: ArchArg,

    /// Emotion wiring for fitg-emotion: "Bottom-up" or "Top-down"
    #[arg(long, default_value = "Bottom-up")]
    pub strategy: String,

    /// Saved fItG artifact directory used as the TBD trunk
    #[arg(long)]
    pub pretrained: Option<PathBuf>,

    /// Trailing fItG layers TBD drops from the trunk
    #[arg(long, default_value_t = 6)]
    pub trunk_offset: usize,
}

/// The application layer never sees clap types.
impl From<ArchArgs> for BuildRequest {
    fn from(a: ArchArgs) -> Self {
        BuildRequest {
            architecture: a.arch.into(),
            strategy:     a.strategy,
            pretrained:   a.pretrained,
            trunk_offset: a.trunk_offset,
        }
    }
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub arch: ArchArgs,

    /// Run a zero-input forward pass with this batch size
    #[arg(long)]
    pub probe_batch: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub arch: ArchArgs,

    /// Artifact directory to create
    #[arg(long)]
    pub out: PathBuf,
}
