use crate::error::PipelineError;
use crate::schema::{TaskSpec, Verdict};
use crate::workspace::ArtifactPaths;

use super::types::Phase;

/// Everything a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub spec: TaskSpec,
    pub initial_verdict: Verdict,
    pub final_verdict: Verdict,
    /// The initial run failed, i.e. the planted defect was caught.
    pub defect_detected: bool,
    pub artifacts: ArtifactPaths,
}

impl PipelineReport {
    pub fn passed(&self) -> bool {
        self.final_verdict.passed
    }
}

/// Terminal result returned by the pipeline.
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed(PipelineReport),
    Failed { phase: Phase, error: PipelineError },
}

impl PipelineOutcome {
    pub fn failed(phase: Phase, error: PipelineError) -> Self {
        Self::Failed { phase, error }
    }

    pub fn report(&self) -> Option<&PipelineReport> {
        match self {
            PipelineOutcome::Completed(report) => Some(report),
            PipelineOutcome::Failed { .. } => None,
        }
    }
}
