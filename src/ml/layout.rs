// ============================================================
// Layer 5 — Feature Layout
// ============================================================
// The numeric constants every architecture shares, held in one
// Burn Config that each architecture config embeds.
//
//   timesteps         = segments_per_task × nb_task = 6 × 5 = 30
//   combined_features = 50 × 3 + 41                  = 191

use burn::prelude::*;

use crate::domain::{error::ArchError, signature::TensorSpec};
use crate::ml::io::ModelInputs;

#[derive(Config, Debug, PartialEq)]
pub struct FeatureLayout {
    /// Number of tasks (activities) predicted, one head per task
    #[config(default = 5)]
    pub nb_task: usize,
    /// Time segments recorded per task (20 s each)
    #[config(default = 6)]
    pub segments_per_task: usize,
    /// Group members, each with their own input stream
    #[config(default = 3)]
    pub nb_individuals: usize,
    #[config(default = 50)]
    pub nb_indiv_features: usize,
    #[config(default = 41)]
    pub nb_group_features: usize,
}

impl FeatureLayout {
    pub fn timesteps(&self) -> usize {
        self.segments_per_task * self.nb_task
    }

    /// Width of the per-timestep vector once every individual
    /// stream is concatenated with the group stream.
    pub fn combined_features(&self) -> usize {
        self.nb_indiv_features * self.nb_individuals + self.nb_group_features
    }

    pub fn streams(&self) -> StreamDims {
        StreamDims {
            timesteps:         self.timesteps(),
            nb_individuals:    self.nb_individuals,
            nb_indiv_features: self.nb_indiv_features,
            nb_group_features: self.nb_group_features,
        }
    }

    /// The multi-stream signature: individual streams then `Group`.
    pub fn stream_inputs(&self) -> Vec<TensorSpec> {
        self.streams().inputs()
    }

    /// The single pre-concatenated stream used by FI-LSTM.
    pub fn combined_input(&self) -> TensorSpec {
        TensorSpec::new(COMBINED_INPUT, [self.timesteps(), self.combined_features()])
    }
}

/// Stream geometry shared by every multi-stream model.
/// Models keep these as plain fields and rebuild this view on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDims {
    pub timesteps:         usize,
    pub nb_individuals:    usize,
    pub nb_indiv_features: usize,
    pub nb_group_features: usize,
}

impl StreamDims {
    pub fn fused_features(&self) -> usize {
        self.nb_indiv_features * self.nb_individuals + self.nb_group_features
    }

    /// `p0`, `p1`, ... one per individual.
    pub fn individual_names(&self) -> Vec<String> {
        (0..self.nb_individuals).map(|i| format!("p{i}")).collect()
    }

    pub fn inputs(&self) -> Vec<TensorSpec> {
        let mut inputs: Vec<TensorSpec> = self
            .individual_names()
            .into_iter()
            .map(|n| TensorSpec::new(n, [self.timesteps, self.nb_indiv_features]))
            .collect();
        inputs.push(TensorSpec::new(GROUP_INPUT, [self.timesteps, self.nb_group_features]));
        inputs
    }

    /// Split validated named inputs into (individual streams, group stream).
    pub fn take<B: Backend>(&self, inputs: &ModelInputs<B>) -> Result<(Vec<Tensor<B, 3>>, Tensor<B, 3>), ArchError> {
        let individuals = self
            .individual_names()
            .iter()
            .map(|n| inputs.stream(n))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((individuals, inputs.stream(GROUP_INPUT)?))
    }
}

pub const GROUP_INPUT: &str = "Group";
pub const COMBINED_INPUT: &str = "Input_x";

/// `Output_t1` … `Output_tN`
pub fn task_output_name(task: usize) -> String {
    format!("Output_t{}", task + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_published_setup() {
        let layout = FeatureLayout::new();
        assert_eq!(layout.nb_task, 5);
        assert_eq!(layout.timesteps(), 30);
        assert_eq!(layout.combined_features(), 191);
    }

    #[test]
    fn test_stream_inputs_order_and_shapes() {
        let inputs = FeatureLayout::new().stream_inputs();
        let names: Vec<&str> = inputs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["p0", "p1", "p2", "Group"]);
        assert_eq!(inputs[0].shape, vec![30, 50]);
        assert_eq!(inputs[3].shape, vec![30, 41]);
    }

    #[test]
    fn test_layout_tracks_overrides() {
        let layout = FeatureLayout::new().with_nb_task(4).with_nb_individuals(2);
        assert_eq!(layout.timesteps(), 24);
        assert_eq!(layout.combined_features(), 141);
        assert_eq!(layout.streams().individual_names(), vec!["p0", "p1"]);
        assert_eq!(task_output_name(3), "Output_t4");
    }
}
