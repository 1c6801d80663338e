// ============================================================
// Layer 5 — Shared Building Blocks
// ============================================================
// Pieces reused by fItG, fItG_emotion and the TBD trunk.
//
// IndividualEncoder
//   One Dense(relu) + one sequence-preserving LSTM. A model owns
//   exactly ONE encoder and runs every individual stream through
//   it, so the streams are processed by literally the same
//   parameters:
//
//     p0 ─┐
//     p1 ─┼─► Shared_Dense ─► Shared_Individual_LSTM ─► [e0, e1, e2]
//     p2 ─┘
//
// GroupFusion
//   concat(e0, e1, e2, Group) ─► Dense_group_init(64, relu)
//     ─► Group_LSTM(32, last state) ─► Dropout_group(0.2)
//     ─► Dense_group(16, relu)

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig},
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

#[derive(Module, Debug)]
pub struct IndividualEncoder<B: Backend> {
    pub dense: Linear<B>,
    pub lstm:  Lstm<B>,
}

impl<B: Backend> IndividualEncoder<B> {
    /// Both layers are as wide as the individual feature vector.
    pub fn new(features: usize, device: &B::Device) -> Self {
        Self {
            dense: LinearConfig::new(features, features).init(device),
            lstm:  LstmConfig::new(features, features, true).init(device),
        }
    }

    /// [batch, timesteps, features] → [batch, timesteps, features]
    pub fn forward(&self, stream: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = relu(self.dense.forward(stream));
        let (sequence, _) = self.lstm.forward(x, None);
        sequence
    }

    /// Encode every individual stream with the same parameters.
    pub fn encode_all(&self, streams: Vec<Tensor<B, 3>>) -> Vec<Tensor<B, 3>> {
        streams.into_iter().map(|s| self.forward(s)).collect()
    }

    pub fn dense_params(&self) -> usize {
        self.dense.num_params()
    }

    pub fn lstm_params(&self) -> usize {
        self.lstm.num_params()
    }
}

#[derive(Module, Debug)]
pub struct GroupFusion<B: Backend> {
    pub dense_init: Linear<B>,
    pub lstm:       Lstm<B>,
    pub dropout:    Dropout,
    pub dense:      Linear<B>,
}

/// Widths of the fusion stack.
#[derive(Debug, Clone, Copy)]
pub struct FusionWidths {
    pub input:   usize,
    pub init:    usize,
    pub lstm:    usize,
    pub dense:   usize,
    pub dropout: f64,
}

impl<B: Backend> GroupFusion<B> {
    pub fn new(w: FusionWidths, device: &B::Device) -> Self {
        Self {
            dense_init: LinearConfig::new(w.input, w.init).init(device),
            lstm:       LstmConfig::new(w.init, w.lstm, true).init(device),
            dropout:    DropoutConfig::new(w.dropout).init(),
            dense:      LinearConfig::new(w.lstm, w.dense).init(device),
        }
    }

    /// Up to and including Group_LSTM: [batch, t, input] → [batch, lstm]
    pub fn recurrent_state(&self, fused: Tensor<B, 3>) -> Tensor<B, 2> {
        last_state(&self.lstm, relu(self.dense_init.forward(fused)))
    }

    /// The full stack: [batch, t, input] → [batch, dense]
    pub fn forward(&self, fused: Tensor<B, 3>) -> Tensor<B, 2> {
        let x = self.dropout.forward(self.recurrent_state(fused));
        relu(self.dense.forward(x))
    }
}

/// Run an LSTM over the whole sequence and keep only the final hidden state.
pub fn last_state<B: Backend>(lstm: &Lstm<B>, x: Tensor<B, 3>) -> Tensor<B, 2> {
    let (_, state) = lstm.forward(x, None);
    state.hidden
}

/// Concatenate per-timestep feature vectors: [b, t, f_i]... → [b, t, Σf_i]
pub fn concat_features<B: Backend>(streams: Vec<Tensor<B, 3>>) -> Tensor<B, 3> {
    Tensor::cat(streams, 2)
}

/// `count` independent dense heads of identical shape.
pub fn dense_heads<B: Backend>(count: usize, d_input: usize, d_output: usize, device: &B::Device) -> Vec<Linear<B>> {
    (0..count)
        .map(|_| LinearConfig::new(d_input, d_output).init(device))
        .collect()
}

/// Apply one sigmoid-activated head.
pub fn sigmoid_head<B: Backend>(head: &Linear<B>, x: Tensor<B, 2>) -> Tensor<B, 2> {
    sigmoid(head.forward(x))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    #[test]
    fn test_encoder_preserves_sequence() {
        let device  = Default::default();
        let encoder = IndividualEncoder::<TestBackend>::new(50, &device);
        let out = encoder.forward(Tensor::zeros([2, 30, 50], &device));
        assert_eq!(out.dims(), [2, 30, 50]);
    }

    #[test]
    fn test_fusion_reduces_to_vector() {
        let device = Default::default();
        let fusion = GroupFusion::<TestBackend>::new(
            FusionWidths { input: 191, init: 64, lstm: 32, dense: 16, dropout: 0.2 },
            &device,
        );
        let x = Tensor::random([3, 30, 191], Distribution::Default, &device);
        assert_eq!(fusion.recurrent_state(x.clone()).dims(), [3, 32]);
        assert_eq!(fusion.forward(x).dims(), [3, 16]);
    }

    #[test]
    fn test_sigmoid_head_is_bounded() {
        let device = Default::default();
        let heads  = dense_heads::<TestBackend>(5, 16, 2, &device);
        assert_eq!(heads.len(), 5);

        let x = Tensor::random([4, 16], Distribution::Uniform(-10.0, 10.0), &device);
        let y: Vec<f32> = sigmoid_head(&heads[0], x).into_data().to_vec::<f32>().unwrap();
        assert!(y.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_concat_widths_add_up() {
        let device = Default::default();
        let streams: Vec<Tensor<TestBackend, 3>> = vec![
            Tensor::zeros([1, 30, 50], &device),
            Tensor::zeros([1, 30, 50], &device),
            Tensor::zeros([1, 30, 41], &device),
        ];
        assert_eq!(concat_features(streams).dims(), [1, 30, 141]);
    }
}
