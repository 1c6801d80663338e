// ============================================================
// Layer 2 — Summary Use Case
// ============================================================
// Builds a graph and reports its layer table. With a probe batch
// it also runs one zero-input forward pass, which checks the
// wiring end to end and reports every output's shape.

use anyhow::{Context, Result};

use crate::application::build_use_case::{BuildRequest, BuildUseCase};
use crate::domain::signature::GraphSummary;
use crate::ml::{io::ModelInputs, DefaultBackend};

#[derive(Debug)]
pub struct SummaryReport {
    pub summary: GraphSummary,
    /// (output name, [batch, units]) from the probe pass
    pub probe:   Option<Vec<(String, Vec<usize>)>>,
}

pub struct SummaryUseCase {
    request:     BuildRequest,
    probe_batch: Option<usize>,
}

impl SummaryUseCase {
    pub fn new(request: BuildRequest, probe_batch: Option<usize>) -> Self {
        Self { request, probe_batch }
    }

    pub fn execute(&self) -> Result<SummaryReport> {
        let built = BuildUseCase::new(self.request.clone()).execute()?;
        let graph = built.as_graph();

        let probe = match self.probe_batch {
            None        => None,
            Some(0)     => anyhow::bail!("--probe-batch must be at least 1"),
            Some(batch) => {
                let device  = Default::default();
                let inputs  = ModelInputs::<DefaultBackend>::zeros(&graph.signature(), batch, &device);
                let outputs = graph
                    .forward_named(&inputs)
                    .with_context(|| format!("Probe pass through {} failed", graph.name()))?;
                tracing::info!("Probe pass produced {} outputs", outputs.len());
                Some(
                    outputs
                        .iter()
                        .map(|(name, t)| (name.to_string(), t.dims().to_vec()))
                        .collect(),
                )
            }
        };

        Ok(SummaryReport { summary: graph.summary(), probe })
    }
}
