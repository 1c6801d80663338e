// ============================================================
// Layer 3 — Graph Signatures and Layer Tables
// ============================================================
// The named-input / named-output contract of a model is the wire
// format the training harness binds to, so it is described here
// with plain structs (no Burn types) and compared explicitly.
//
// Shapes never include the batch dimension:
//   sequence input  → [timesteps, features]
//   head output     → [units]

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::ArchError;

/// One named tensor in a model signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSpec {
    pub name:  String,
    pub shape: Vec<usize>,
}

impl TensorSpec {
    pub fn new(name: impl Into<String>, shape: impl Into<Vec<usize>>) -> Self {
        Self { name: name.into(), shape: shape.into() }
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, format_shape(&self.shape))
    }
}

/// Ordered inputs and outputs of a constructed graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSignature {
    pub inputs:  Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}

impl ModelSignature {
    pub fn new(inputs: Vec<TensorSpec>, outputs: Vec<TensorSpec>) -> Self {
        Self { inputs, outputs }
    }

    pub fn input(&self, name: &str) -> Option<&TensorSpec> {
        self.inputs.iter().find(|s| s.name == name)
    }

    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|s| s.name.as_str()).collect()
    }

    /// Fail unless `self` accepts exactly the inputs listed in `expected`,
    /// in the same order and with the same per-sample shapes.
    pub fn check_inputs(&self, expected: &[TensorSpec]) -> Result<(), ArchError> {
        if self.inputs.len() != expected.len() {
            return Err(ArchError::ShapeMismatch(format!(
                "expected {} inputs [{}], found {} [{}]",
                expected.len(),
                join_specs(expected),
                self.inputs.len(),
                join_specs(&self.inputs),
            )));
        }

        let wrong: Vec<String> = self.inputs
            .iter()
            .zip(expected)
            .filter(|(found, want)| found != want)
            .map(|(found, want)| format!("'{}' where '{}' was expected", found, want))
            .collect();

        if wrong.is_empty() {
            Ok(())
        } else {
            Err(ArchError::ShapeMismatch(wrong.join("; ")))
        }
    }
}

/// What a layer table entry does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    Input,
    Dense,
    Lstm,
    Dropout,
    Concatenate,
    Flatten,
    /// A whole pretrained sub-graph embedded as one layer.
    Model,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LayerKind::Input       => "InputLayer",
            LayerKind::Dense       => "Dense",
            LayerKind::Lstm        => "LSTM",
            LayerKind::Dropout     => "Dropout",
            LayerKind::Concatenate => "Concatenate",
            LayerKind::Flatten     => "Flatten",
            LayerKind::Model       => "Functional",
        };
        f.write_str(s)
    }
}

/// One row of a layer table. Shared layers appear once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name:   String,
    pub kind:   LayerKind,
    pub shape:  Vec<usize>,
    pub params: usize,
}

impl LayerSpec {
    pub fn new(name: impl Into<String>, kind: LayerKind, shape: impl Into<Vec<usize>>, params: usize) -> Self {
        Self { name: name.into(), kind, shape: shape.into(), params }
    }

    pub fn input(spec: &TensorSpec) -> Self {
        Self::new(spec.name.clone(), LayerKind::Input, spec.shape.clone(), 0)
    }
}

/// Printable overview of a constructed graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    pub name:      String,
    pub signature: ModelSignature,
    pub layers:    Vec<LayerSpec>,
}

impl GraphSummary {
    pub fn new(name: impl Into<String>, signature: ModelSignature, layers: Vec<LayerSpec>) -> Self {
        Self { name: name.into(), signature, layers }
    }

    pub fn total_params(&self) -> usize {
        self.layers.iter().map(|l| l.params).sum()
    }
}

impl fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: \"{}\"", self.name)?;
        writeln!(f, "{:<28} {:<12} {:<14} {:>10}", "Layer", "Type", "Output", "Params")?;
        writeln!(f, "{}", "─".repeat(67))?;
        for layer in &self.layers {
            writeln!(
                f,
                "{:<28} {:<12} {:<14} {:>10}",
                layer.name,
                layer.kind.to_string(),
                format_shape(&layer.shape),
                layer.params,
            )?;
        }
        writeln!(f, "{}", "─".repeat(67))?;
        writeln!(f, "Inputs:  {}", join_specs(&self.signature.inputs))?;
        writeln!(f, "Outputs: {}", join_specs(&self.signature.outputs))?;
        write!(f, "Total params: {}", self.total_params())
    }
}

/// Keras-style shape text: `(30, 50)`, `(2,)`.
pub fn format_shape(shape: &[usize]) -> String {
    match shape {
        [single] => format!("({single},)"),
        dims => format!(
            "({})",
            dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn join_specs(specs: &[TensorSpec]) -> String {
    specs.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn group_inputs() -> Vec<TensorSpec> {
        vec![
            TensorSpec::new("p0", [30, 50]),
            TensorSpec::new("p1", [30, 50]),
            TensorSpec::new("p2", [30, 50]),
            TensorSpec::new("Group", [30, 41]),
        ]
    }

    #[test]
    fn test_format_shape() {
        assert_eq!(format_shape(&[30, 191]), "(30, 191)");
        assert_eq!(format_shape(&[2]), "(2,)");
    }

    #[test]
    fn test_matching_inputs_pass() {
        let sig = ModelSignature::new(group_inputs(), vec![]);
        assert!(sig.check_inputs(&group_inputs()).is_ok());
    }

    #[test]
    fn test_input_count_mismatch_is_descriptive() {
        let sig = ModelSignature::new(vec![TensorSpec::new("Input_x", [30, 191])], vec![]);
        let err = sig.check_inputs(&group_inputs()).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, ArchError::ShapeMismatch(_)));
        assert!(msg.contains("expected 4 inputs"));
        assert!(msg.contains("Input_x (30, 191)"));
    }

    #[test]
    fn test_feature_width_mismatch_names_input() {
        let mut inputs = group_inputs();
        inputs[3] = TensorSpec::new("Group", [30, 40]);
        let sig = ModelSignature::new(inputs, vec![]);
        let msg = sig.check_inputs(&group_inputs()).unwrap_err().to_string();
        assert!(msg.contains("'Group (30, 40)' where 'Group (30, 41)' was expected"));
    }

    #[test]
    fn test_summary_totals_params() {
        let summary = GraphSummary::new(
            "toy",
            ModelSignature::new(vec![], vec![]),
            vec![
                LayerSpec::new("a", LayerKind::Dense, [4], 10),
                LayerSpec::new("b", LayerKind::Dense, [2], 5),
            ],
        );
        assert_eq!(summary.total_params(), 15);
        assert!(summary.to_string().contains("Total params: 15"));
    }
}
