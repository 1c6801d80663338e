// ============================================================
// Layer 5 — FI-LSTM
// ============================================================
// Single-stream temporal model. Group and individual features
// arrive pre-concatenated as one sequence:
//
//   Input_x [30, 191]
//       │
//   LSTM_Time (30 units, last state)
//   Dropout_Time (0.2)
//   Dense_Time_1 (16, relu)
//   Dense_Time_2 (8, relu)
//       │
//   ├─► Output_t1 (2, sigmoid)
//   ├─► ...
//   └─► Output_t5 (2, sigmoid)

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig},
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::{
    error::ArchError,
    signature::{LayerKind, LayerSpec, ModelSignature, TensorSpec},
};
use crate::ml::{
    blocks::{dense_heads, last_state, sigmoid_head},
    graph::CohesionModel,
    io::{ModelInputs, ModelOutputs},
    layout::{task_output_name, FeatureLayout, COMBINED_INPUT},
};

pub const FILSTM_NAME: &str = "FI-LSTM";

#[derive(Config, Debug)]
pub struct FilstmConfig {
    #[config(default = "FeatureLayout::new()")]
    pub layout:    FeatureLayout,
    /// Units per task head; more than one is a multilabel setting
    #[config(default = 2)]
    pub nb_output: usize,
    #[config(default = 16)]
    pub dense_1:   usize,
    #[config(default = 8)]
    pub dense_2:   usize,
    #[config(default = 0.2)]
    pub dropout:   f64,
}

impl FilstmConfig {
    /// The recurrent layer is as wide as the sequence is long.
    pub fn lstm_units(&self) -> usize {
        self.layout.timesteps()
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> FilstmModel<B> {
        let features = self.layout.combined_features();
        let units    = self.lstm_units();

        let model = FilstmModel {
            lstm:      LstmConfig::new(features, units, true).init(device),
            dropout:   DropoutConfig::new(self.dropout).init(),
            dense_1:   LinearConfig::new(units, self.dense_1).init(device),
            dense_2:   LinearConfig::new(self.dense_1, self.dense_2).init(device),
            heads:     dense_heads(self.layout.nb_task, self.dense_2, self.nb_output, device),
            timesteps: self.layout.timesteps(),
            features,
            units,
            nb_output: self.nb_output,
        };
        tracing::info!(
            "Built {}: {} heads × {} units, {} params",
            FILSTM_NAME, self.layout.nb_task, self.nb_output, model.num_params()
        );
        model
    }
}

#[derive(Module, Debug)]
pub struct FilstmModel<B: Backend> {
    pub lstm:      Lstm<B>,
    pub dropout:   Dropout,
    pub dense_1:   Linear<B>,
    pub dense_2:   Linear<B>,
    pub heads:     Vec<Linear<B>>,
    pub timesteps: usize,
    pub features:  usize,
    pub units:     usize,
    pub nb_output: usize,
}

impl<B: Backend> FilstmModel<B> {
    /// input: [batch, timesteps, features] → one [batch, nb_output] per task
    pub fn forward(&self, input: Tensor<B, 3>) -> Vec<Tensor<B, 2>> {
        let x = last_state(&self.lstm, input);
        let x = self.dropout.forward(x);
        let x = relu(self.dense_1.forward(x));
        let x = relu(self.dense_2.forward(x));

        self.heads.iter().map(|h| sigmoid_head(h, x.clone())).collect()
    }
}

impl<B: Backend> CohesionModel<B> for FilstmModel<B> {
    fn name(&self) -> String {
        FILSTM_NAME.to_string()
    }

    fn signature(&self) -> ModelSignature {
        ModelSignature::new(
            vec![TensorSpec::new(COMBINED_INPUT, [self.timesteps, self.features])],
            (0..self.heads.len())
                .map(|i| TensorSpec::new(task_output_name(i), [self.nb_output]))
                .collect(),
        )
    }

    fn layers(&self) -> Vec<LayerSpec> {
        let units = self.units;
        let mut layers = vec![
            LayerSpec::new(COMBINED_INPUT, LayerKind::Input, [self.timesteps, self.features], 0),
            LayerSpec::new("LSTM_Time", LayerKind::Lstm, [units], self.lstm.num_params()),
            LayerSpec::new("Dropout_Time", LayerKind::Dropout, [units], 0),
            LayerSpec::new("Dense_Time_1", LayerKind::Dense, [self.dense_1.weight.val().dims()[1]], self.dense_1.num_params()),
            LayerSpec::new("Dense_Time_2", LayerKind::Dense, [self.dense_2.weight.val().dims()[1]], self.dense_2.num_params()),
        ];
        layers.extend(self.heads.iter().enumerate().map(|(i, h)| {
            LayerSpec::new(task_output_name(i), LayerKind::Dense, [self.nb_output], h.num_params())
        }));
        layers
    }

    fn forward_named(&self, inputs: &ModelInputs<B>) -> Result<ModelOutputs<B>, ArchError> {
        inputs.validate(&self.signature())?;
        let outputs = self.forward(inputs.stream(COMBINED_INPUT)?);

        Ok(ModelOutputs::new(
            outputs
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

    type TestBackend = NdArray;

    #[test]
    fn test_signature() {
        let device = Default::default();
        let model  = FilstmConfig::new().init::<TestBackend>(&device);
        let sig    = model.signature();

        assert_eq!(sig.inputs, vec![TensorSpec::new("Input_x", [30, 191])]);
        assert_eq!(sig.outputs.len(), 5);
        assert!(sig.outputs.iter().all(|o| o.shape == vec![2]));
        assert_eq!(sig.output_names(), ["Output_t1", "Output_t2", "Output_t3", "Output_t4", "Output_t5"]);
    }

    #[test]
    fn test_forward_shapes() {
        let device  = Default::default();
        let model   = FilstmConfig::new().init::<TestBackend>(&device);
        let inputs  = ModelInputs::<TestBackend>::zeros(&model.signature(), 4, &device);
        let outputs = model.forward_named(&inputs).unwrap();

        assert_eq!(outputs.len(), 5);
        for (_, t) in outputs.iter() {
            assert_eq!(t.dims(), [4, 2]);
        }
    }

    #[test]
    fn test_layer_table_accounts_for_every_param() {
        let device = Default::default();
        let model  = FilstmConfig::new().init::<TestBackend>(&device);
        let layers = model.layers();

        assert_eq!(layers.len(), 10);
        assert_eq!(layers[1].name, "LSTM_Time");
        assert_eq!(layers[1].shape, vec![30]);
        // Dense_Time_1: 30 × 16 + 16
        assert_eq!(layers[3].params, 496);
        assert_eq!(model.summary().total_params(), model.num_params());
    }

    #[test]
    fn test_wrong_stream_is_rejected() {
        let device = Default::default();
        let model  = FilstmConfig::new().init::<TestBackend>(&device);
        let inputs = ModelInputs::<TestBackend>::new().with("Input_x", Tensor::zeros([1, 30, 190], &device));
        assert!(matches!(model.forward_named(&inputs), Err(ArchError::ShapeMismatch(_))));
    }
}
