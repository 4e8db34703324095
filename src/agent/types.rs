use std::fmt;

/// Phases of a pipeline run, in the only order they are ever visited.
///
/// There is no `Done` phase: a run that gets past `FinalJudging` ends as
/// `PipelineOutcome::Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Planning,
    Coding,
    TestAuthoring,
    InitialRun,
    InitialJudging,
    Fixing,
    VerificationRun,
    FinalJudging,
}

impl Phase {
    pub const ALL: [Phase; 8] = [
        Phase::Planning,
        Phase::Coding,
        Phase::TestAuthoring,
        Phase::InitialRun,
        Phase::InitialJudging,
        Phase::Fixing,
        Phase::VerificationRun,
        Phase::FinalJudging,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Planning => "planning",
            Phase::Coding => "coding",
            Phase::TestAuthoring => "test authoring",
            Phase::InitialRun => "initial run",
            Phase::InitialJudging => "initial judging",
            Phase::Fixing => "fixing",
            Phase::VerificationRun => "verification run",
            Phase::FinalJudging => "final judging",
        };
        write!(f, "{label}")
    }
}
