// ============================================================
// Layer 5 — Common Model Interface
// ============================================================
// Every architecture answers the same questions: what is it
// called, what does it take and return, which layers does it
// have, and what does it predict for a set of named inputs.
// The application layer only talks to models through this trait.

use burn::prelude::*;

use crate::domain::{
    error::ArchError,
    signature::{GraphSummary, LayerSpec, ModelSignature},
};
use crate::ml::io::{ModelInputs, ModelOutputs};

pub trait CohesionModel<B: Backend> {
    /// Display name, e.g. "fItG" or "fItG_emotion_Top-down".
    fn name(&self) -> String;

    /// Named inputs and outputs, in binding order.
    fn signature(&self) -> ModelSignature;

    /// Keras-style layer table: inputs, then each layer once, then heads.
    fn layers(&self) -> Vec<LayerSpec>;

    /// Validate `inputs` against the signature and run the graph.
    fn forward_named(&self, inputs: &ModelInputs<B>) -> Result<ModelOutputs<B>, ArchError>;

    fn summary(&self) -> GraphSummary {
        GraphSummary::new(self.name(), self.signature(), self.layers())
    }
}
