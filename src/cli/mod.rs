// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and prints results. All work is
// delegated to Layer 2 (application).
//
//   1. `summary` - layer table, signature, optional probe pass
//   2. `export`  - save a freshly built graph as an artifact
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ExportArgs, SummaryArgs};

use crate::application::summary_use_case::SummaryReport;
use crate::domain::signature::format_shape;

#[derive(Parser, Debug)]
#[command(
    name = "cohesion-nets",
    version = "0.1.0",
    about = "Build and inspect multitask group-cohesion networks (FI-LSTM, fItG, fItG_emotion, TBD)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Summary(args) => run_summary(args),
            Commands::Export(args)  => run_export(args),
        }
    }
}

fn run_summary(args: SummaryArgs) -> Result<()> {
    use crate::application::summary_use_case::SummaryUseCase;

    let report = SummaryUseCase::new(args.arch.into(), args.probe_batch).execute()?;
    println!("{}", render_summary(&report));
    Ok(())
}

/// Layer table (which already lists inputs and outputs), then probe shapes.
fn render_summary(report: &SummaryReport) -> String {
    let mut text = report.summary.to_string();
    if let Some(probe) = &report.probe {
        text.push_str("\nProbe pass:");
        for (name, dims) in probe {
            text.push_str(&format!("\n  {:<14} {}", name, format_shape(dims)));
        }
    }
    text
}

fn run_export(args: ExportArgs) -> Result<()> {
    use crate::application::export_use_case::ExportUseCase;

    let out      = args.out.clone();
    let manifest = ExportUseCase::new(args.arch.into(), args.out).execute()?;
    println!(
        "Exported {} ({} layers, {} outputs) to {}",
        manifest.name,
        manifest.layer_count,
        manifest.signature.outputs.len(),
        out.display()
    );
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use commands::ArchArg;

    #[test]
    fn test_summary_defaults() {
        let cli = Cli::try_parse_from(["cohesion-nets", "summary", "--arch", "fitg-emotion"]).unwrap();
        let Commands::Summary(args) = cli.command else { panic!("expected summary") };
        assert_eq!(args.arch.arch, ArchArg::FitgEmotion);
        assert_eq!(args.arch.strategy, "Bottom-up");
        assert_eq!(args.arch.trunk_offset, 6);
        assert!(args.probe_batch.is_none());
    }

    #[test]
    fn test_export_tbd_args() {
        let cli = Cli::try_parse_from([
            "cohesion-nets", "export", "--arch", "tbd",
            "--pretrained", "runs/fitg", "--trunk-offset", "8", "--out", "runs/tbd",
        ])
        .unwrap();
        let Commands::Export(args) = cli.command else { panic!("expected export") };
        assert_eq!(args.out, std::path::PathBuf::from("runs/tbd"));

        let req: crate::application::build_use_case::BuildRequest = args.arch.into();
        assert_eq!(req.architecture, crate::domain::strategy::ArchitectureKind::Tbd);
        assert_eq!(req.trunk_offset, 8);
        assert_eq!(req.pretrained.unwrap(), std::path::PathBuf::from("runs/fitg"));
    }

    #[test]
    fn test_summary_lists_signature_once() {
        use crate::application::{build_use_case::BuildRequest, summary_use_case::SummaryUseCase};
        use crate::domain::strategy::ArchitectureKind;

        let report = SummaryUseCase::new(BuildRequest::new(ArchitectureKind::Fitg), Some(1))
            .execute()
            .unwrap();
        let text = render_summary(&report);

        assert_eq!(text.matches("Inputs:").count(), 1);
        assert_eq!(text.matches("Outputs:").count(), 1);
        assert!(text.contains("Probe pass:"));
        assert!(text.contains("Output_t5"));
    }

    #[test]
    fn test_unknown_architecture_rejected() {
        assert!(Cli::try_parse_from(["cohesion-nets", "summary", "--arch", "gru"]).is_err());
    }

    #[test]
    fn test_export_requires_out() {
        assert!(Cli::try_parse_from(["cohesion-nets", "export", "--arch", "fitg"]).is_err());
    }
}
