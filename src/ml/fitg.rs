// ============================================================
// Layer 5 — fItG
// ============================================================
// Multi-stream model: each individual is encoded by the SAME
// shared encoder, the encodings are fused with the group stream,
// and five independent heads predict cohesion per task.
//
//   p0, p1, p2 [30, 50] ─► IndividualEncoder (shared) ─┐
//   Group      [30, 41] ───────────────────────────────┤
//                                                      ▼
//                                    concatenate [30, 191]
//                                    Dense_group_init (64, relu)
//                                    Group_LSTM (32, last state)
//                                    Dropout_group (0.2)
//                                    Dense_group (16, relu)
//                                          │
//                                    Output_t1..t5 (2, sigmoid)

use burn::{nn::Linear, prelude::*};

use crate::domain::{
    error::ArchError,
    signature::{LayerKind, LayerSpec, ModelSignature, TensorSpec},
};
use crate::ml::{
    blocks::{concat_features, dense_heads, sigmoid_head, FusionWidths, GroupFusion, IndividualEncoder},
    graph::CohesionModel,
    io::{ModelInputs, ModelOutputs},
    layout::{task_output_name, FeatureLayout, StreamDims},
};

pub const FITG_NAME: &str = "fItG";

#[derive(Config, Debug)]
pub struct FitgConfig {
    #[config(default = "FeatureLayout::new()")]
    pub layout:      FeatureLayout,
    #[config(default = 2)]
    pub nb_output:   usize,
    #[config(default = 64)]
    pub fusion_init: usize,
    #[config(default = 32)]
    pub group_lstm:  usize,
    #[config(default = 16)]
    pub group_dense: usize,
    #[config(default = 0.2)]
    pub dropout:     f64,
}

impl FitgConfig {
    pub fn fusion_widths(&self) -> FusionWidths {
        FusionWidths {
            input:   self.layout.combined_features(),
            init:    self.fusion_init,
            lstm:    self.group_lstm,
            dense:   self.group_dense,
            dropout: self.dropout,
        }
    }

    pub fn streams(&self) -> StreamDims {
        self.layout.streams()
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> FitgModel<B> {
        let model = FitgModel {
            individual:        IndividualEncoder::new(self.layout.nb_indiv_features, device),
            fusion:            GroupFusion::new(self.fusion_widths(), device),
            heads:             dense_heads(self.layout.nb_task, self.group_dense, self.nb_output, device),
            timesteps:         self.layout.timesteps(),
            nb_individuals:    self.layout.nb_individuals,
            nb_indiv_features: self.layout.nb_indiv_features,
            nb_group_features: self.layout.nb_group_features,
            nb_output:         self.nb_output,
        };
        tracing::info!(
            "Built {}: {} individual streams share one encoder, {} heads, {} params",
            FITG_NAME, self.layout.nb_individuals, self.layout.nb_task, model.num_params()
        );
        model
    }
}

#[derive(Module, Debug)]
pub struct FitgModel<B: Backend> {
    pub individual:        IndividualEncoder<B>,
    pub fusion:            GroupFusion<B>,
    pub heads:             Vec<Linear<B>>,
    pub timesteps:         usize,
    pub nb_individuals:    usize,
    pub nb_indiv_features: usize,
    pub nb_group_features: usize,
    pub nb_output:         usize,
}

impl<B: Backend> FitgModel<B> {
    pub fn streams(&self) -> StreamDims {
        StreamDims {
            timesteps:         self.timesteps,
            nb_individuals:    self.nb_individuals,
            nb_indiv_features: self.nb_indiv_features,
            nb_group_features: self.nb_group_features,
        }
    }

    /// Encode individuals, append the raw group stream: [batch, t, fused]
    pub fn fuse(&self, individuals: Vec<Tensor<B, 3>>, group: Tensor<B, 3>) -> Tensor<B, 3> {
        let mut streams = self.individual.encode_all(individuals);
        streams.push(group);
        concat_features(streams)
    }

    /// The 16-unit group representation fed to every head.
    pub fn represent(&self, individuals: Vec<Tensor<B, 3>>, group: Tensor<B, 3>) -> Tensor<B, 2> {
        self.fusion.forward(self.fuse(individuals, group))
    }

    /// One [batch, nb_output] tensor per task.
    pub fn forward(&self, individuals: Vec<Tensor<B, 3>>, group: Tensor<B, 3>) -> Vec<Tensor<B, 2>> {
        let x = self.represent(individuals, group);
        self.heads.iter().map(|h| sigmoid_head(h, x.clone())).collect()
    }
}

/// Input layers plus the shared individual encoder, listed once.
pub(crate) fn stream_layers<B: Backend>(dims: &StreamDims, encoder: &IndividualEncoder<B>) -> Vec<LayerSpec> {
    let seq = [dims.timesteps, dims.nb_indiv_features];
    let mut layers: Vec<LayerSpec> = dims.inputs().iter().map(LayerSpec::input).collect();
    layers.push(LayerSpec::new("Shared_Dense", LayerKind::Dense, seq, encoder.dense_params()));
    layers.push(LayerSpec::new("Shared_Individual_LSTM", LayerKind::Lstm, seq, encoder.lstm_params()));
    layers
}

/// concatenate → Dense_group_init → Group_LSTM → Dropout_group → Dense_group
pub(crate) fn fusion_layers<B: Backend>(dims: &StreamDims, fusion: &GroupFusion<B>) -> Vec<LayerSpec> {
    let t     = dims.timesteps;
    let init  = fusion.dense_init.weight.val().dims()[1];
    let lstm  = fusion.dense.weight.val().dims()[0];
    let dense = fusion.dense.weight.val().dims()[1];
    vec![
        LayerSpec::new("concatenate", LayerKind::Concatenate, [t, dims.fused_features()], 0),
        LayerSpec::new("Dense_group_init", LayerKind::Dense, [t, init], fusion.dense_init.num_params()),
        LayerSpec::new("Group_LSTM", LayerKind::Lstm, [lstm], fusion.lstm.num_params()),
        LayerSpec::new("Dropout_group", LayerKind::Dropout, [lstm], 0),
        LayerSpec::new("Dense_group", LayerKind::Dense, [dense], fusion.dense.num_params()),
    ]
}

impl<B: Backend> CohesionModel<B> for FitgModel<B> {
    fn name(&self) -> String {
        FITG_NAME.to_string()
    }

    fn signature(&self) -> ModelSignature {
        ModelSignature::new(
            self.streams().inputs(),
            (0..self.heads.len())
                .map(|i| TensorSpec::new(task_output_name(i), [self.nb_output]))
                .collect(),
        )
    }

    fn layers(&self) -> Vec<LayerSpec> {
        let mut layers = stream_layers(&self.streams(), &self.individual);
        layers.extend(fusion_layers(&self.streams(), &self.fusion));
        layers.extend(self.heads.iter().enumerate().map(|(i, h)| {
            LayerSpec::new(task_output_name(i), LayerKind::Dense, [self.nb_output], h.num_params())
        }));
        layers
    }

    fn forward_named(&self, inputs: &ModelInputs<B>) -> Result<ModelOutputs<B>, ArchError> {
        inputs.validate(&self.signature())?;
        let (individuals, group) = self.streams().take(inputs)?;

        Ok(ModelOutputs::new(
            self.forward(individuals, group)
                .into_iter()
                .enumerate()
                .map(|(i, t)| (task_output_name(i), t))
                .collect(),
        ))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::nn::{LinearConfig, LstmConfig};
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    fn random_stream(features: usize, device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 3> {
        Tensor::random([2, 30, features], Distribution::Default, device)
    }

    fn values(t: Tensor<TestBackend, 3>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_signature() {
        let device = Default::default();
        let model  = FitgConfig::new().init::<TestBackend>(&device);
        let sig    = model.signature();

        let names: Vec<&str> = sig.inputs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["p0", "p1", "p2", "Group"]);
        assert_eq!(sig.input("p1").unwrap().shape, vec![30, 50]);
        assert_eq!(sig.input("Group").unwrap().shape, vec![30, 41]);
        assert_eq!(sig.outputs.len(), 5);
        assert!(sig.outputs.iter().all(|o| o.shape == vec![2]));
    }

    #[test]
    fn test_forward_shapes() {
        let device  = Default::default();
        let model   = FitgConfig::new().init::<TestBackend>(&device);
        let inputs  = ModelInputs::<TestBackend>::zeros(&model.signature(), 3, &device);
        let outputs = model.forward_named(&inputs).unwrap();

        assert_eq!(outputs.names(), ["Output_t1", "Output_t2", "Output_t3", "Output_t4", "Output_t5"]);
        assert!(outputs.iter().all(|(_, t)| t.dims() == [3, 2]));
    }

    #[test]
    fn test_encoder_is_shared_across_individuals() {
        let device = Default::default();
        let model  = FitgConfig::new().init::<TestBackend>(&device);
        let a = random_stream(50, &device);
        let b = random_stream(50, &device);
        let c = random_stream(50, &device);

        let original = model.individual.encode_all(vec![a.clone(), b.clone(), c.clone()]);
        let permuted = model.individual.encode_all(vec![c, a, b]);

        // Each stream gets the same encoding whichever slot it occupies
        assert_eq!(values(original[0].clone()), values(permuted[1].clone()));
        assert_eq!(values(original[1].clone()), values(permuted[2].clone()));
        assert_eq!(values(original[2].clone()), values(permuted[0].clone()));
    }

    #[test]
    fn test_replacing_shared_encoder_changes_every_stream() {
        let device    = Default::default();
        let mut model = FitgConfig::new().init::<TestBackend>(&device);
        let streams: Vec<_> = (0..3).map(|_| random_stream(50, &device)).collect();
        let before = model.individual.encode_all(streams.clone());

        model.individual.dense = LinearConfig::new(50, 50).init(&device);
        let after = model.individual.encode_all(streams);

        for (b, a) in before.into_iter().zip(after) {
            assert_ne!(values(b), values(a));
        }
    }

    #[test]
    fn test_one_parameter_set_for_all_individuals() {
        let device = Default::default();
        let model  = FitgConfig::new().init::<TestBackend>(&device);

        let single_dense = LinearConfig::new(50, 50).init::<TestBackend>(&device).num_params();
        let single_lstm  = LstmConfig::new(50, 50, true).init::<TestBackend>(&device).num_params();
        assert_eq!(model.individual.num_params(), single_dense + single_lstm);
    }

    #[test]
    fn test_layer_table() {
        let device = Default::default();
        let model  = FitgConfig::new().init::<TestBackend>(&device);
        let layers = model.layers();

        assert_eq!(layers.len(), 16);
        assert_eq!(layers[6].name, "concatenate");
        assert_eq!(layers[6].shape, vec![30, 191]);
        assert_eq!(layers[7].shape, vec![30, 64]);
        assert_eq!(layers[8].shape, vec![32]);
        // Six layers from the end is the fused representation
        assert_eq!(layers[layers.len() - 6].name, "Dense_group");
        assert_eq!(model.summary().total_params(), model.num_params());
    }

    #[test]
    fn test_missing_group_stream() {
        let device = Default::default();
        let model  = FitgConfig::new().init::<TestBackend>(&device);
        let inputs = ModelInputs::<TestBackend>::new()
            .with("p0", Tensor::zeros([1, 30, 50], &device))
            .with("p1", Tensor::zeros([1, 30, 50], &device))
            .with("p2", Tensor::zeros([1, 30, 50], &device));
        assert!(matches!(
            model.forward_named(&inputs),
            Err(ArchError::MissingInput(ref n)) if n == "Group"
        ));
    }
}
