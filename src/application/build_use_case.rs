// ============================================================
// Layer 2 — Build Use Case
// ============================================================
// Turns a BuildRequest into a concrete graph through the
// ml::builders entry points:
//
//   create_filstm / create_fitg    - published defaults
//   create_fitg_emotion            - strategy parsed first, so an
//                                    unknown strategy builds nothing
//   create_tbd                     - needs a pretrained fItG directory
//
// The built graph keeps its config next to it so it can be
// exported as an artifact and rebuilt later.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::strategy::{ArchitectureKind, EmotionStrategy};
use crate::infra::artifact::{ArtifactManifest, ArtifactStore};
use crate::ml::{
    builders::{create_filstm, create_fitg, create_fitg_emotion, create_tbd},
    filstm::{FilstmConfig, FilstmModel},
    fitg::{FitgConfig, FitgModel},
    fitg_emotion::{FitgEmotionConfig, FitgEmotionModel},
    graph::CohesionModel,
    tbd::{TbdConfig, TbdModel, DEFAULT_TRUNK_OFFSET},
    DefaultBackend,
};

// ─── Build Request ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRequest {
    pub architecture: ArchitectureKind,
    /// Only read for fItG_emotion
    pub strategy:     String,
    /// Only read for TBD
    pub pretrained:   Option<PathBuf>,
    pub trunk_offset: usize,
}

impl BuildRequest {
    pub fn new(architecture: ArchitectureKind) -> Self {
        Self {
            architecture,
            strategy:     EmotionStrategy::default().to_string(),
            pretrained:   None,
            trunk_offset: DEFAULT_TRUNK_OFFSET,
        }
    }
}

// ─── Built Model ─────────────────────────────────────────────────────────────
#[derive(Debug)]
pub enum BuiltModel {
    Filstm(FilstmConfig, FilstmModel<DefaultBackend>),
    Fitg(FitgConfig, FitgModel<DefaultBackend>),
    FitgEmotion(FitgEmotionConfig, FitgEmotionModel<DefaultBackend>),
    Tbd(TbdConfig, TbdModel<DefaultBackend>),
}

impl BuiltModel {
    pub fn kind(&self) -> ArchitectureKind {
        match self {
            BuiltModel::Filstm(..)      => ArchitectureKind::Filstm,
            BuiltModel::Fitg(..)        => ArchitectureKind::Fitg,
            BuiltModel::FitgEmotion(..) => ArchitectureKind::FitgEmotion,
            BuiltModel::Tbd(..)         => ArchitectureKind::Tbd,
        }
    }

    pub fn as_graph(&self) -> &dyn CohesionModel<DefaultBackend> {
        match self {
            BuiltModel::Filstm(_, m)      => m,
            BuiltModel::Fitg(_, m)        => m,
            BuiltModel::FitgEmotion(_, m) => m,
            BuiltModel::Tbd(_, m)         => m,
        }
    }

    /// Write the graph to `dir` as manifest.json + model.mpk.gz.
    pub fn save(self, dir: &Path) -> Result<ArtifactManifest> {
        let kind  = self.kind();
        let store = ArtifactStore::new(dir);
        let manifest = match self {
            BuiltModel::Filstm(c, m) => {
                let manifest = ArtifactManifest::describe(kind, &m, &c)?;
                store.save(m, &manifest)?;
                manifest
            }
            BuiltModel::Fitg(c, m) => {
                let manifest = ArtifactManifest::describe(kind, &m, &c)?;
                store.save(m, &manifest)?;
                manifest
            }
            BuiltModel::FitgEmotion(c, m) => {
                let manifest = ArtifactManifest::describe(kind, &m, &c)?;
                store.save(m, &manifest)?;
                manifest
            }
            BuiltModel::Tbd(c, m) => {
                let manifest = ArtifactManifest::describe(kind, &m, &c)?;
                store.save(m, &manifest)?;
                manifest
            }
        };
        Ok(manifest)
    }
}

// ─── BuildUseCase ────────────────────────────────────────────────────────────
pub struct BuildUseCase {
    request: BuildRequest,
}

impl BuildUseCase {
    pub fn new(request: BuildRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<BuiltModel> {
        let req    = &self.request;
        let device = Default::default();
        tracing::debug!("Building {} from {:?}", req.architecture, req);

        let built = match req.architecture {
            ArchitectureKind::Filstm => {
                let (config, model) = create_filstm::<DefaultBackend>(&device).into_parts();
                BuiltModel::Filstm(config, model)
            }
            ArchitectureKind::Fitg => {
                let (config, model) = create_fitg::<DefaultBackend>(&device).into_parts();
                BuiltModel::Fitg(config, model)
            }
            ArchitectureKind::FitgEmotion => {
                let (config, model) = create_fitg_emotion::<DefaultBackend>(&req.strategy, &device)
                    .context("Cannot build fItG_emotion")?
                    .into_parts();
                BuiltModel::FitgEmotion(config, model)
            }
            ArchitectureKind::Tbd => {
                let dir = req
                    .pretrained
                    .as_ref()
                    .context("TBD needs --pretrained <DIR> pointing at a saved fItG artifact")?;
                let (config, model) = create_tbd::<DefaultBackend>(dir, req.trunk_offset, &device)
                    .with_context(|| format!("Cannot build TBD on '{}'", dir.display()))?
                    .into_parts();
                BuiltModel::Tbd(config, model)
            }
        };
        Ok(built)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::domain::error::ArchError;

    #[test]
    fn test_builds_each_standalone_architecture() {
        for (kind, outputs) in [
            (ArchitectureKind::Filstm, 5),
            (ArchitectureKind::Fitg, 5),
            (ArchitectureKind::FitgEmotion, 10),
        ] {
            let built = BuildUseCase::new(BuildRequest::new(kind)).execute().unwrap();
            assert_eq!(built.kind(), kind);
            assert_eq!(built.as_graph().signature().outputs.len(), outputs);
        }
    }

    #[test]
    fn test_invalid_strategy_keeps_typed_cause() {
        let mut req = BuildRequest::new(ArchitectureKind::FitgEmotion);
        req.strategy = "Sideways".into();
        let err = BuildUseCase::new(req).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArchError>(),
            Some(ArchError::InvalidStrategy(s)) if s == "Sideways"
        ));
    }

    #[test]
    fn test_tbd_without_pretrained_dir() {
        let err = BuildUseCase::new(BuildRequest::new(ArchitectureKind::Tbd)).execute().unwrap_err();
        assert!(err.to_string().contains("--pretrained"));
    }

    #[test]
    fn test_exported_fitg_feeds_tbd() {
        let tmp = TempDir::new().unwrap();
        let manifest = BuildUseCase::new(BuildRequest::new(ArchitectureKind::Fitg))
            .execute()
            .unwrap()
            .save(tmp.path())
            .unwrap();
        assert_eq!(manifest.layer_count, 16);

        let mut req = BuildRequest::new(ArchitectureKind::Tbd);
        req.pretrained = Some(tmp.path().to_path_buf());
        let tbd = BuildUseCase::new(req).execute().unwrap();
        assert_eq!(tbd.as_graph().name(), "TBD");
        assert_eq!(tbd.as_graph().signature().outputs.len(), 5);
    }
}
