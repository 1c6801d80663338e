// ============================================================
// Layer 5 — Named Model Inputs and Outputs
// ============================================================
// Models are fed and read by name, exactly as the harness binds
// arrays to `p0`, `p1`, `p2`, `Group`, `Input_x` and to
// `Output_t{i}` / `Output_cohesion_t{i}` / `Output_emotion_t{i}`.
//
// Every sequence tensor is [batch, timesteps, features];
// every head output is [batch, units].

use burn::prelude::*;

use crate::domain::{
    error::ArchError,
    signature::{format_shape, ModelSignature, TensorSpec},
};

/// Ordered, named rank-3 input tensors.
#[derive(Debug, Clone)]
pub struct ModelInputs<B: Backend> {
    entries: Vec<(String, Tensor<B, 3>)>,
}

impl<B: Backend> Default for ModelInputs<B> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<B: Backend> ModelInputs<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) one named stream.
    pub fn with(mut self, name: impl Into<String>, tensor: Tensor<B, 3>) -> Self {
        self.insert(name, tensor);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor<B, 3>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = tensor,
            None        => self.entries.push((name, tensor)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Tensor<B, 3>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Zero-filled inputs for every stream of `signature`.
    pub fn zeros(signature: &ModelSignature, batch: usize, device: &B::Device) -> Self {
        signature.inputs.iter().fold(Self::new(), |inputs, spec| {
            let [t, f] = per_sample_dims(spec);
            inputs.with(spec.name.clone(), Tensor::zeros([batch, t, f], device))
        })
    }

    /// Check every declared input against its per-sample shape and a
    /// shared batch size. Undeclared streams are rejected.
    /// Returns the batch size.
    pub fn validate(&self, signature: &ModelSignature) -> Result<usize, ArchError> {
        let mut batch: Option<usize> = None;

        for spec in &signature.inputs {
            let tensor = self
                .get(&spec.name)
                .ok_or_else(|| ArchError::MissingInput(spec.name.clone()))?;
            let [b, t, f] = tensor.dims();

            if [t, f] != per_sample_dims(spec) {
                return Err(ArchError::ShapeMismatch(format!(
                    "input '{}' has per-sample shape {}, expected {}",
                    spec.name,
                    format_shape(&[t, f]),
                    format_shape(&spec.shape),
                )));
            }

            match batch {
                Some(expected) if expected != b => {
                    return Err(ArchError::ShapeMismatch(format!(
                        "input '{}' has batch size {b}, other inputs have {expected}",
                        spec.name,
                    )));
                }
                _ => batch = Some(b),
            }
        }

        if let Some(extra) = self
            .names()
            .into_iter()
            .find(|n| signature.input(n).is_none())
        {
            return Err(ArchError::ShapeMismatch(format!(
                "unexpected input '{extra}', the model takes [{}]",
                signature.inputs.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", "),
            )));
        }

        Ok(batch.unwrap_or(0))
    }

    /// Clone out one stream, failing if it is absent.
    pub fn stream(&self, name: &str) -> Result<Tensor<B, 3>, ArchError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| ArchError::MissingInput(name.to_string()))
    }
}

fn per_sample_dims(spec: &TensorSpec) -> [usize; 2] {
    match spec.shape.as_slice() {
        [t, f] => [*t, *f],
        // Signatures built in this crate always carry [timesteps, features]
        other  => [other.first().copied().unwrap_or(0), other.get(1).copied().unwrap_or(0)],
    }
}

/// Ordered, named head outputs.
#[derive(Debug, Clone)]
pub struct ModelOutputs<B: Backend> {
    entries: Vec<(String, Tensor<B, 2>)>,
}

impl<B: Backend> ModelOutputs<B> {
    pub fn new(entries: Vec<(String, Tensor<B, 2>)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Tensor<B, 2>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn at(&self, index: usize) -> Option<&Tensor<B, 2>> {
        self.entries.get(index).map(|(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor<B, 2>)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn into_tensors(self) -> Vec<Tensor<B, 2>> {
        self.entries.into_iter().map(|(_, t)| t).collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn signature() -> ModelSignature {
        ModelSignature::new(
            vec![TensorSpec::new("p0", [30, 50]), TensorSpec::new("Group", [30, 41])],
            vec![],
        )
    }

    #[test]
    fn test_zeros_validate() {
        let device = Default::default();
        let inputs = ModelInputs::<TestBackend>::zeros(&signature(), 3, &device);
        assert_eq!(inputs.names(), vec!["p0", "Group"]);
        assert_eq!(inputs.validate(&signature()).unwrap(), 3);
    }

    #[test]
    fn test_missing_input() {
        let device = Default::default();
        let inputs = ModelInputs::<TestBackend>::new()
            .with("p0", Tensor::zeros([2, 30, 50], &device));
        let err = inputs.validate(&signature()).unwrap_err();
        assert!(matches!(err, ArchError::MissingInput(ref n) if n == "Group"));
    }

    #[test]
    fn test_wrong_feature_width() {
        let device = Default::default();
        let inputs = ModelInputs::<TestBackend>::new()
            .with("p0", Tensor::zeros([2, 30, 49], &device))
            .with("Group", Tensor::zeros([2, 30, 41], &device));
        let msg = inputs.validate(&signature()).unwrap_err().to_string();
        assert!(msg.contains("'p0'"));
        assert!(msg.contains("(30, 49)"));
    }

    #[test]
    fn test_batch_sizes_must_agree() {
        let device = Default::default();
        let inputs = ModelInputs::<TestBackend>::new()
            .with("p0", Tensor::zeros([2, 30, 50], &device))
            .with("Group", Tensor::zeros([4, 30, 41], &device));
        assert!(matches!(
            inputs.validate(&signature()),
            Err(ArchError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_undeclared_stream_is_rejected() {
        let device = Default::default();
        let inputs = ModelInputs::<TestBackend>::zeros(&signature(), 2, &device)
            .with("p3", Tensor::zeros([2, 30, 50], &device));
        let err = inputs.validate(&signature()).unwrap_err();
        assert!(matches!(err, ArchError::ShapeMismatch(_)));
        assert!(err.to_string().contains("'p3'"));
    }

    #[test]
    fn test_insert_replaces_existing_stream() {
        let device = Default::default();
        let inputs = ModelInputs::<TestBackend>::new()
            .with("p0", Tensor::zeros([1, 30, 50], &device))
            .with("p0", Tensor::zeros([5, 30, 50], &device));
        assert_eq!(inputs.names().len(), 1);
        assert_eq!(inputs.get("p0").unwrap().dims(), [5, 30, 50]);
    }
}
