// ============================================================
// Layer 5 — fItG with Emotions
// ============================================================
// fItG plus one emotion head per task. The shared individual
// encoder and the group fusion stack are the same as fItG; what
// differs is where the emotion heads read from:
//
//   Bottom-up
//     concat(e0, e1, e2) [30, 150]      (no group stream)
//     Dense_emotion_1 (64, sigmoid)
//     Dense_emotion_2 (16, sigmoid)
//     Flatten_emotion [480] ─► Output_emotion_t1..t5 (1, sigmoid)
//
//   Top-down
//     Dense_group [16] ─► Output_emotion_t1..t5 (1, sigmoid)
//
// Cohesion heads always read Dense_group. Outputs are
// interleaved per task: cohesion_t1, emotion_t1, cohesion_t2, ...

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::sigmoid,
};

use crate::domain::{
    error::ArchError,
    signature::{LayerKind, LayerSpec, ModelSignature, TensorSpec},
    strategy::EmotionStrategy,
};
use crate::ml::{
    blocks::{concat_features, dense_heads, sigmoid_head, GroupFusion, IndividualEncoder},
    fitg::{fusion_layers, stream_layers, FitgConfig},
    graph::CohesionModel,
    io::{ModelInputs, ModelOutputs},
    layout::StreamDims,
};

#[derive(Config, Debug)]
pub struct FitgEmotionConfig {
    #[config(default = "FitgConfig::new()")]
    pub fitg:           FitgConfig,
    #[config(default = "EmotionStrategy::BottomUp")]
    pub strategy:       EmotionStrategy,
    #[config(default = 64)]
    pub emotion_dense_1: usize,
    #[config(default = 16)]
    pub emotion_dense_2: usize,
    #[config(default = 1)]
    pub emotion_output: usize,
}

impl FitgEmotionConfig {
    /// Parse the strategy name first so an unknown value never
    /// produces a partially wired graph.
    pub fn from_strategy(strategy: &str) -> Result<Self, ArchError> {
        Ok(Self::new().with_strategy(strategy.parse()?))
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> FitgEmotionModel<B> {
        let layout  = &self.fitg.layout;
        let streams = self.fitg.streams();

        let (bottom_up, emotion_input) = match self.strategy {
            EmotionStrategy::BottomUp => {
                let branch = BottomUpBranch {
                    dense_1: LinearConfig::new(
                        layout.nb_indiv_features * layout.nb_individuals,
                        self.emotion_dense_1,
                    ).init(device),
                    dense_2: LinearConfig::new(self.emotion_dense_1, self.emotion_dense_2).init(device),
                };
                (Some(branch), streams.timesteps * self.emotion_dense_2)
            }
            EmotionStrategy::TopDown => (None, self.fitg.group_dense),
        };
        tracing::debug!("{} emotion heads read {} features", self.strategy, emotion_input);

        let model = FitgEmotionModel {
            individual:        IndividualEncoder::new(layout.nb_indiv_features, device),
            fusion:            GroupFusion::new(self.fitg.fusion_widths(), device),
            bottom_up,
            cohesion_heads:    dense_heads(layout.nb_task, self.fitg.group_dense, self.fitg.nb_output, device),
            emotion_heads:     dense_heads(layout.nb_task, emotion_input, self.emotion_output, device),
            timesteps:         streams.timesteps,
            nb_individuals:    streams.nb_individuals,
            nb_indiv_features: streams.nb_indiv_features,
            nb_group_features: streams.nb_group_features,
            nb_output:         self.fitg.nb_output,
            emotion_output:    self.emotion_output,
        };
        tracing::info!(
            "Built {}: {} cohesion + {} emotion heads, {} params",
            model.name(), layout.nb_task, layout.nb_task, model.num_params()
        );
        model
    }
}

/// Emotion branch built from individual encodings only.
#[derive(Module, Debug)]
pub struct BottomUpBranch<B: Backend> {
    pub dense_1: Linear<B>,
    pub dense_2: Linear<B>,
}

impl<B: Backend> BottomUpBranch<B> {
    /// encodings: [batch, t, f] each → [batch, t × dense_2]
    pub fn forward(&self, encodings: Vec<Tensor<B, 3>>) -> Tensor<B, 2> {
        let x = concat_features(encodings);
        let x = sigmoid(self.dense_1.forward(x));
        let x = sigmoid(self.dense_2.forward(x));
        x.flatten::<2>(1, 2)
    }
}

#[derive(Module, Debug)]
pub struct FitgEmotionModel<B: Backend> {
    pub individual:        IndividualEncoder<B>,
    pub fusion:            GroupFusion<B>,
    pub bottom_up:         Option<BottomUpBranch<B>>,
    pub cohesion_heads:    Vec<Linear<B>>,
    pub emotion_heads:     Vec<Linear<B>>,
    pub timesteps:         usize,
    pub nb_individuals:    usize,
    pub nb_indiv_features: usize,
    pub nb_group_features: usize,
    pub nb_output:         usize,
    pub emotion_output:    usize,
}

/// Cohesion and emotion predictions for one task.
#[derive(Debug, Clone)]
pub struct TaskPrediction<B: Backend> {
    pub cohesion: Tensor<B, 2>,
    pub emotion:  Tensor<B, 2>,
}

impl<B: Backend> FitgEmotionModel<B> {
    pub fn strategy(&self) -> EmotionStrategy {
        if self.bottom_up.is_some() {
            EmotionStrategy::BottomUp
        } else {
            EmotionStrategy::TopDown
        }
    }

    pub fn streams(&self) -> StreamDims {
        StreamDims {
            timesteps:         self.timesteps,
            nb_individuals:    self.nb_individuals,
            nb_indiv_features: self.nb_indiv_features,
            nb_group_features: self.nb_group_features,
        }
    }

    pub fn forward(&self, individuals: Vec<Tensor<B, 3>>, group: Tensor<B, 3>) -> Vec<TaskPrediction<B>> {
        let encodings = self.individual.encode_all(individuals);

        let mut fused = encodings.clone();
        fused.push(group);
        let group_repr = self.fusion.forward(concat_features(fused));

        let emotion_repr = match &self.bottom_up {
            Some(branch) => branch.forward(encodings),
            None         => group_repr.clone(),
        };

        self.cohesion_heads
            .iter()
            .zip(&self.emotion_heads)
            .map(|(c, e)| TaskPrediction {
                cohesion: sigmoid_head(c, group_repr.clone()),
                emotion:  sigmoid_head(e, emotion_repr.clone()),
            })
            .collect()
    }
}

pub fn cohesion_output_name(task: usize) -> String {
    format!("Output_cohesion_t{}", task + 1)
}

pub fn emotion_output_name(task: usize) -> String {
    format!("Output_emotion_t{}", task + 1)
}

impl<B: Backend> CohesionModel<B> for FitgEmotionModel<B> {
    fn name(&self) -> String {
        format!("fItG_emotion_{}", self.strategy())
    }

    fn signature(&self) -> ModelSignature {
        let outputs = (0..self.cohesion_heads.len())
            .flat_map(|i| {
                [
                    TensorSpec::new(cohesion_output_name(i), [self.nb_output]),
                    TensorSpec::new(emotion_output_name(i), [self.emotion_output]),
                ]
            })
            .collect();
        ModelSignature::new(self.streams().inputs(), outputs)
    }

    fn layers(&self) -> Vec<LayerSpec> {
        let dims = self.streams();
        let t    = dims.timesteps;
        let mut layers = stream_layers(&dims, &self.individual);

        if let Some(branch) = &self.bottom_up {
            let d1 = branch.dense_1.weight.val().dims()[1];
            let d2 = branch.dense_2.weight.val().dims()[1];
            layers.extend([
                LayerSpec::new("concatenate_individuals", LayerKind::Concatenate, [t, dims.nb_indiv_features * dims.nb_individuals], 0),
                LayerSpec::new("Dense_emotion_1", LayerKind::Dense, [t, d1], branch.dense_1.num_params()),
                LayerSpec::new("Dense_emotion_2", LayerKind::Dense, [t, d2], branch.dense_2.num_params()),
                LayerSpec::new("Flatten_emotion", LayerKind::Flatten, [t * d2], 0),
            ]);
        }
        layers.extend(fusion_layers(&dims, &self.fusion));

        for (i, (c, e)) in self.cohesion_heads.iter().zip(&self.emotion_heads).enumerate() {
            layers.push(LayerSpec::new(cohesion_output_name(i), LayerKind::Dense, [self.nb_output], c.num_params()));
            layers.push(LayerSpec::new(emotion_output_name(i), LayerKind::Dense, [self.emotion_output], e.num_params()));
        }
        layers
    }

    fn forward_named(&self, inputs: &ModelInputs<B>) -> Result<ModelOutputs<B>, ArchError> {
        inputs.validate(&self.signature())?;
        let (individuals, group) = self.streams().take(inputs)?;

        let outputs = self
            .forward(individuals, group)
            .into_iter()
            .enumerate()
            .flat_map(|(i, p)| {
                [
                    (cohesion_output_name(i), p.cohesion),
                    (emotion_output_name(i), p.emotion),
                ]
            })
            .collect();
        Ok(ModelOutputs::new(outputs))
    }
}
