// ============================================================
// Layer 2 — Export Use Case
// ============================================================
// Builds a freshly initialised graph and writes it as an
// artifact directory. An exported fItG is what TBD loads as
// its pretrained trunk once it has been trained.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::build_use_case::{BuildRequest, BuildUseCase};
use crate::infra::artifact::ArtifactManifest;

pub struct ExportUseCase {
    request: BuildRequest,
    out_dir: PathBuf,
}

impl ExportUseCase {
    pub fn new(request: BuildRequest, out_dir: PathBuf) -> Self {
        Self { request, out_dir }
    }

    pub fn execute(&self) -> Result<ArtifactManifest> {
        let built    = BuildUseCase::new(self.request.clone()).execute()?;
        let manifest = built
            .save(&self.out_dir)
            .with_context(|| format!("Failed to export to '{}'", self.out_dir.display()))?;
        tracing::info!(
            "Exported {} ({} layers) to '{}'",
            manifest.name, manifest.layer_count, self.out_dir.display()
        );
        Ok(manifest)
    }
}
