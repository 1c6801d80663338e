// ============================================================
// Layer 5 — TBD (transfer from a pretrained fItG)
// ============================================================
// TBD re-uses a fItG trained on one cohesion dimension as the
// trunk of a model that predicts another dimension:
//
//   1. load the pretrained fItG artifact       (infra::artifact)
//   2. keep its parameters trainable           (fine-tuning)
//   3. cut it at layer L − trunk_offset        (default: 6)
//      → for fItG that is Dense_group, the 16-unit group vector
//   4. run the cut graph on fresh p0, p1, p2, Group inputs
//   5. Dense_group (16, relu), then per task an independent
//      Dense(8, relu) → Dense(4, relu) → Output_t{i} (1, sigmoid)
//
// The offset is tied to the layer count of fItG.

use std::path::Path;

use burn::{
    module::{ModuleMapper, ParamId},
    nn::{Dropout, Linear, LinearConfig, Lstm},
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::domain::{
    error::ArchError,
    signature::{LayerKind, LayerSpec, ModelSignature, TensorSpec},
};
use crate::infra::artifact::ArtifactStore;
use crate::ml::{
    blocks::{concat_features, last_state, IndividualEncoder},
    fitg::FitgModel,
    graph::CohesionModel,
    io::{ModelInputs, ModelOutputs},
    layout::{task_output_name, FeatureLayout, StreamDims},
};

pub const TBD_NAME: &str = "TBD";
pub const DEFAULT_TRUNK_OFFSET: usize = 6;

#[derive(Config, Debug)]
pub struct TbdConfig {
    #[config(default = "FeatureLayout::new()")]
    pub layout:       FeatureLayout,
    /// Trailing layers of the pretrained graph to drop
    #[config(default = 6)]
    pub trunk_offset: usize,
    #[config(default = 16)]
    pub dense:        usize,
    #[config(default = 8)]
    pub head_1:       usize,
    #[config(default = 4)]
    pub head_2:       usize,
    /// TBD predicts a single cohesion dimension
    #[config(default = 1)]
    pub nb_output:    usize,
}

impl TbdConfig {
    /// Load the pretrained artifact stored in `dir` and build TBD on top of it.
    pub fn init_from_pretrained<B: Backend>(&self, dir: impl AsRef<Path>, device: &B::Device) -> Result<TbdModel<B>, ArchError> {
        let store      = ArtifactStore::new(dir.as_ref());
        let pretrained = store.load_trunk::<B>(&self.layout.stream_inputs(), device)?;
        self.init_with_trunk(pretrained, device)
    }

    /// Build TBD on an already loaded pretrained handle.
    pub fn init_with_trunk<B: Backend>(&self, mut pretrained: PretrainedFitg<B>, device: &B::Device) -> Result<TbdModel<B>, ArchError> {
        pretrained.signature().check_inputs(&self.layout.stream_inputs())?;
        pretrained.set_trainable(true);

        let layers = pretrained.layer_count();
        if self.trunk_offset == 0 || self.trunk_offset > layers {
            return Err(ArchError::TrunkTooShallow {
                name:   pretrained.name(),
                layers,
                offset: self.trunk_offset,
            });
        }
        if self.trunk_offset != DEFAULT_TRUNK_OFFSET {
            tracing::warn!(
                "Trunk offset {} differs from the fItG default of {}",
                self.trunk_offset, DEFAULT_TRUNK_OFFSET
            );
        }

        let trunk = pretrained.truncate(layers - self.trunk_offset)?;
        let heads = (0..self.layout.nb_task)
            .map(|_| TbdHead {
                hidden: LinearConfig::new(self.dense, self.head_1).init(device),
                narrow: LinearConfig::new(self.head_1, self.head_2).init(device),
                output: LinearConfig::new(self.head_2, self.nb_output).init(device),
            })
            .collect();

        let model = TbdModel {
            dense:     LinearConfig::new(trunk.units, self.dense).init(device),
            trunk,
            heads,
            nb_output: self.nb_output,
        };
        tracing::info!(
            "Built {}: trunk cut at layer {} of {}, {} heads, {} params",
            TBD_NAME, layers - self.trunk_offset, layers, self.layout.nb_task, model.num_params()
        );
        Ok(model)
    }
}

// ─── Pretrained handle ────────────────────────────────────────────────────────

/// A loaded fItG whose layers can be cut off and re-used.
#[derive(Debug)]
pub struct PretrainedFitg<B: Backend> {
    model:     FitgModel<B>,
    trainable: bool,
}

impl<B: Backend> PretrainedFitg<B> {
    /// Parameters start out trainable.
    pub fn new(model: FitgModel<B>) -> Self {
        Self { model, trainable: true }
    }

    pub fn name(&self) -> String {
        self.model.name()
    }

    pub fn signature(&self) -> ModelSignature {
        self.model.signature()
    }

    pub fn layers(&self) -> Vec<LayerSpec> {
        self.model.layers()
    }

    pub fn layer_count(&self) -> usize {
        self.layers().len()
    }

    pub fn is_trainable(&self) -> bool {
        self.trainable
    }

    /// Applied when the trunk is cut: `true` tracks gradients on every
    /// pretrained parameter, `false` freezes them all.
    pub fn set_trainable(&mut self, trainable: bool) {
        self.trainable = trainable;
    }

    /// Keep every layer up to and including `keep_up_to`.
    ///
    /// Only cuts that end on the fused group representation are
    /// meaningful: Group_LSTM, Dropout_group or Dense_group.
    pub fn truncate(self, keep_up_to: usize) -> Result<TruncatedFitg<B>, ArchError> {
        let layers = self.layers();
        let layer  = layers.get(keep_up_to).ok_or_else(|| ArchError::UnsupportedCut {
            index:  keep_up_to,
            name:   "<none>".into(),
            reason: format!("the model has only {} layers", layers.len()),
        })?;

        let (keep_dropout, keep_dense) = match layer.name.as_str() {
            "Group_LSTM"    => (false, false),
            "Dropout_group" => (true, false),
            "Dense_group"   => (true, true),
            _ => {
                return Err(ArchError::UnsupportedCut {
                    index:  keep_up_to,
                    name:   layer.name.clone(),
                    reason: "only Group_LSTM, Dropout_group or Dense_group end on the group representation".into(),
                })
            }
        };
        let units = layer.shape.first().copied().unwrap_or(0);
        tracing::debug!("Cutting {} at layer {} ('{}', {} units)", self.name(), keep_up_to, layer.name, units);

        let model  = if self.trainable {
            self.model.map(&mut RequireGrad)
        } else {
            self.model.no_grad()
        };
        let dims   = model.streams();
        let fusion = model.fusion;

        Ok(TruncatedFitg {
            individual:        model.individual,
            dense_init:        fusion.dense_init,
            lstm:              fusion.lstm,
            dropout:           keep_dropout.then_some(fusion.dropout),
            dense:             keep_dense.then_some(fusion.dense),
            timesteps:         dims.timesteps,
            nb_individuals:    dims.nb_individuals,
            nb_indiv_features: dims.nb_indiv_features,
            nb_group_features: dims.nb_group_features,
            cut:               keep_up_to,
            units,
        })
    }
}

/// Marks every float parameter as requiring gradients.
struct RequireGrad;

impl<B: Backend> ModuleMapper<B> for RequireGrad {
    fn map_float<const D: usize>(&mut self, _id: ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        tensor.set_require_grad(true)
    }
}

/// The pretrained fItG without its task heads.
#[derive(Module, Debug)]
pub struct TruncatedFitg<B: Backend> {
    pub individual:        IndividualEncoder<B>,
    pub dense_init:        Linear<B>,
    pub lstm:              Lstm<B>,
    pub dropout:           Option<Dropout>,
    pub dense:             Option<Linear<B>>,
    pub timesteps:         usize,
    pub nb_individuals:    usize,
    pub nb_indiv_features: usize,
    pub nb_group_features: usize,
    /// Index of the last kept layer in the pretrained layer table
    pub cut:               usize,
    /// Width of the representation the cut exposes
    pub units:             usize,
}

impl<B: Backend> TruncatedFitg<B> {
    pub fn streams(&self) -> StreamDims {
        StreamDims {
            timesteps:         self.timesteps,
            nb_individuals:    self.nb_individuals,
            nb_indiv_features: self.nb_indiv_features,
            nb_group_features: self.nb_group_features,
        }
    }

    /// [batch, units] representation at the cut.
    pub fn forward(&self, individuals: Vec<Tensor<B, 3>>, group: Tensor<B, 3>) -> Tensor<B, 2> {
        let mut streams = self.individual.encode_all(individuals);
        streams.push(group);

        let x = relu(self.dense_init.forward(concat_features(streams)));
        let mut x = last_state(&self.lstm, x);
        if let Some(dropout) = &self.dropout {
            x = dropout.forward(x);
        }
        match &self.dense {
            Some(dense) => relu(dense.forward(x)),
            None        => x,
        }
    }

    /// Run the cut graph on named inputs.
    pub fn invoke(&self, inputs: &ModelInputs<B>) -> Result<Tensor<B, 2>, ArchError> {
        let dims = self.streams();
        inputs.validate(&ModelSignature::new(dims.inputs(), vec![]))?;
        let (individuals, group) = dims.take(inputs)?;
        Ok(self.forward(individuals, group))
    }
}

// ─── TBD model ────────────────────────────────────────────────────────────────

/// Dense(8, relu) → Dense(4, relu) → Dense(1, sigmoid), one per task.
#[derive(Module, Debug)]
pub struct TbdHead<B: Backend> {
    pub hidden: Linear<B>,
    pub narrow: Linear<B>,
    pub output: Linear<B>,
}

impl<B: Backend> TbdHead<B> {
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.hidden.forward(x));
        let x = relu(self.narrow.forward(x));
        sigmoid(self.output.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct TbdModel<B: Backend> {
    pub trunk:     TruncatedFitg<B>,
    pub dense:     Linear<B>,
    pub heads:     Vec<TbdHead<B>>,
    pub nb_output: usize,
}

impl<B: Backend> TbdModel<B> {
    pub fn forward(&self, individuals: Vec<Tensor<B, 3>>, group: Tensor<B, 3>) -> Vec<Tensor<B, 2>> {
        let x = relu(self.dense.forward(self.trunk.forward(individuals, group)));
        self.heads.iter().map(|h| h.forward(x.clone())).collect()
    }
}

impl<B: Backend> CohesionModel<B> for TbdModel<B> {
    fn name(&self) -> String {
        TBD_NAME.to_string()
    }

    fn signature(&self) -> ModelSignature {
        ModelSignature::new(
            self.trunk.streams().inputs(),
            (0..self.heads.len())
                .map(|i| TensorSpec::new(task_output_name(i), [self.nb_output]))
                .collect(),
        )
    }

    fn layers(&self) -> Vec<LayerSpec> {
        let dense = self.dense.weight.val().dims()[1];
        let mut layers: Vec<LayerSpec> = self.trunk.streams().inputs().iter().map(LayerSpec::input).collect();
        layers.push(LayerSpec::new("Base_model", LayerKind::Model, [self.trunk.units], self.trunk.num_params()));
        layers.push(LayerSpec::new("Dense_group", LayerKind::Dense, [dense], self.dense.num_params()));

        for (i, head) in self.heads.iter().enumerate() {
            let task = i + 1;
            layers.push(LayerSpec::new(
                format!("Dense_t{task}_1"), LayerKind::Dense,
                [head.hidden.weight.val().dims()[1]], head.hidden.num_params(),
            ));
            layers.push(LayerSpec::new(
                format!("Dense_t{task}_2"), LayerKind::Dense,
                [head.narrow.weight.val().dims()[1]], head.narrow.num_params(),
            ));
            layers.push(LayerSpec::new(
                task_output_name(i), LayerKind::Dense, [self.nb_output], head.output.num_params(),
            ));
        }
        layers
    }

    fn forward_named(&self, inputs: &ModelInputs<B>) -> Result<ModelOutputs<B>, ArchError> {
        inputs.validate(&self.signature())?;
        let (individuals, group) = self.trunk.streams().take(inputs)?;

        Ok(ModelOutputs::new(
            self.forward(individuals, group)
                .into_iter()
                .enumerate()
                .map(|(i, t)| (task_output_name(i), t))
                .collect(),
        ))
    }
}
