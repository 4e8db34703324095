use std::path::PathBuf;

use crate::schema::{RunOrdinal, Verdict};

use super::outcome::PipelineOutcome;
use super::types::Phase;

/// Mutable state threaded through one pipeline run.
#[derive(Debug, Default)]
pub struct RunContext {
    phase: Option<Phase>,
    events: Vec<PipelineEvent>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase currently in progress, if any has started.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn record_event(&mut self, event: PipelineEvent) {
        self.events.push(event);
    }

    pub fn record_phase_start(&mut self, phase: Phase) {
        self.phase = Some(phase);
        self.record_event(PipelineEvent::PhaseStarted(phase));
    }

    pub fn record_phase_end(&mut self, phase: Phase) {
        self.record_event(PipelineEvent::PhaseCompleted(phase));
    }

    pub fn record_phase_failure(&mut self, phase: Phase, error: impl Into<String>) {
        self.record_event(PipelineEvent::PhaseFailed {
            phase,
            error: error.into(),
        });
    }

    pub fn record_artifact(&mut self, path: PathBuf) {
        self.record_event(PipelineEvent::ArtifactPersisted(path));
    }

    pub fn record_test_run(&mut self, run: RunOrdinal, output_len: usize) {
        self.record_event(PipelineEvent::TestRunFinished { run, output_len });
    }

    pub fn record_verdict(&mut self, verdict: &Verdict) {
        self.record_event(PipelineEvent::VerdictIssued(verdict.clone()));
    }

    pub fn record_anomaly(&mut self, message: impl Into<String>) {
        self.record_event(PipelineEvent::Anomaly(message.into()));
    }

    pub fn into_run(self, outcome: PipelineOutcome) -> PipelineRun {
        let RunContext { events, .. } = self;
        PipelineRun { outcome, events }
    }
}

#[derive(Debug)]
pub struct PipelineRun {
    pub outcome: PipelineOutcome,
    pub events: Vec<PipelineEvent>,
}

impl PipelineRun {
    /// Completed with a passing final verdict.
    pub fn succeeded(&self) -> bool {
        self.outcome.report().is_some_and(|report| report.passed())
    }
}

/// Audit trail of a run, in the order things happened.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    PhaseStarted(Phase),
    PhaseCompleted(Phase),
    PhaseFailed { phase: Phase, error: String },
    ArtifactPersisted(PathBuf),
    TestRunFinished { run: RunOrdinal, output_len: usize },
    VerdictIssued(Verdict),
    Anomaly(String),
}
