// ============================================================
// Layer 6 — Model Artifact Store
// ============================================================
// Saves and restores model graphs using Burn's named MessagePack
// file recorder with gzip and full precision, so a reloaded graph
// carries exactly the weights that were saved.
//
// What gets saved per artifact directory:
//   1. model.mpk.gz   - all parameters (MessagePack + gzip)
//   2. manifest.json  - architecture kind, name, config,
//                       input/output signature, layer count
//
// The manifest is read first. It carries the config needed to
// rebuild the graph before the weights are loaded into it, and
// its signature lets TBD reject an incompatible artifact before
// any weights are touched.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::domain::{
    error::ArchError,
    signature::{ModelSignature, TensorSpec},
    strategy::ArchitectureKind,
};
use crate::ml::{
    fitg::{FitgConfig, FitgModel},
    graph::CohesionModel,
    tbd::PretrainedFitg,
};

const MANIFEST_FILE: &str = "manifest.json";
// The recorder appends ".mpk.gz"
const RECORD_STEM: &str = "model";
pub const RECORD_FILE: &str = "model.mpk.gz";

type ArtifactRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Everything needed to rebuild a saved graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub architecture: ArchitectureKind,
    pub name:         String,
    pub config:       serde_json::Value,
    pub signature:    ModelSignature,
    pub layer_count:  usize,
}

impl ArtifactManifest {
    pub fn describe<B: Backend, M: CohesionModel<B>>(
        architecture: ArchitectureKind,
        model:        &M,
        config:       &impl Serialize,
    ) -> Result<Self, ArchError> {
        let config = serde_json::to_value(config).map_err(|e| ArchError::ArtifactSave {
            path:   PathBuf::from(MANIFEST_FILE),
            reason: format!("cannot serialise config: {e}"),
        })?;
        Ok(Self {
            architecture,
            name:        model.name(),
            config,
            signature:   model.signature(),
            layer_count: model.layers().len(),
        })
    }

    /// Decode the stored config as `C`.
    pub fn config<C: DeserializeOwned>(&self, dir: &Path) -> Result<C, ArchError> {
        serde_json::from_value(self.config.clone()).map_err(|e| ArchError::ArtifactLoad {
            path:   dir.join(MANIFEST_FILE),
            reason: format!("config does not describe a {}: {e}", self.architecture),
        })
    }
}

/// Reads and writes artifacts in one directory.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self) -> PathBuf {
        self.dir.join(RECORD_STEM)
    }

    /// Write the manifest and the parameter record.
    pub fn save<B: Backend, M: Module<B>>(&self, model: M, manifest: &ArtifactManifest) -> Result<(), ArchError> {
        fs::create_dir_all(&self.dir).map_err(|e| ArchError::ArtifactSave {
            path:   self.dir.clone(),
            reason: e.to_string(),
        })?;

        let manifest_path = self.dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(manifest).map_err(|e| ArchError::ArtifactSave {
            path:   manifest_path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&manifest_path, json).map_err(|e| ArchError::ArtifactSave {
            path:   manifest_path.clone(),
            reason: e.to_string(),
        })?;

        let record_path = self.record_path();
        ArtifactRecorder::default()
            .record(model.into_record(), record_path.clone())
            .map_err(|e| ArchError::ArtifactSave {
                path:   record_path.clone(),
                reason: format!("{e:?}"),
            })?;

        tracing::debug!("Saved '{}' artifact to '{}'", manifest.name, self.dir.display());
        Ok(())
    }

    pub fn load_manifest(&self) -> Result<ArtifactManifest, ArchError> {
        let path = self.dir.join(MANIFEST_FILE);
        let json = fs::read_to_string(&path).map_err(|e| ArchError::ArtifactLoad {
            path:   path.clone(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&json).map_err(|e| ArchError::ArtifactLoad {
            path,
            reason: format!("corrupt manifest: {e}"),
        })
    }

    /// Load parameters into a freshly built graph of the right architecture.
    pub fn load_into<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M, ArchError> {
        let path   = self.record_path();
        let record = ArtifactRecorder::default()
            .load(path.clone(), device)
            .map_err(|e| ArchError::ArtifactLoad {
                path,
                reason: format!("{e:?}"),
            })?;
        Ok(model.load_record(record))
    }

    /// Rebuild a saved fItG with its trained parameters.
    pub fn load_fitg<B: Backend>(&self, device: &B::Device) -> Result<FitgModel<B>, ArchError> {
        let manifest = self.load_manifest()?;
        if manifest.architecture != ArchitectureKind::Fitg {
            return Err(ArchError::UnsupportedTrunk {
                name:   manifest.name,
                reason: format!("stored architecture is {}, not fItG", manifest.architecture),
            });
        }
        let config: FitgConfig = manifest.config(&self.dir)?;
        let model = self.load_into(config.init::<B>(device), device)?;
        tracing::info!("Loaded '{}' from '{}'", manifest.name, self.dir.display());
        Ok(model)
    }

    /// Load a pretrained trunk, checking its input signature first.
    ///
    /// A mismatched signature fails before any weights are read.
    pub fn load_trunk<B: Backend>(&self, expected_inputs: &[TensorSpec], device: &B::Device) -> Result<PretrainedFitg<B>, ArchError> {
        let manifest = self.load_manifest()?;
        manifest.signature.check_inputs(expected_inputs)?;
        Ok(PretrainedFitg::new(self.load_fitg(device)?))
    }
}
