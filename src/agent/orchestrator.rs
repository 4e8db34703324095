use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::DynLlmClient;
use crate::error::PipelineError;
use crate::exec::DynTestRunner;
use crate::roles::{Coder, FixRequest, Fixer, Judge, Planner, RoleAgent, TestAuthor};
use crate::schema::{ArtifactOrigin, ArtifactVersion, ExecutionResult, RunOrdinal, TaskSpec, Verdict};
use crate::workspace::Workspace;

use super::context::{PipelineRun, RunContext};
use super::outcome::{PipelineOutcome, PipelineReport};
use super::types::Phase;

/// Characters of test output echoed to the log per run.
const OUTPUT_PREVIEW_CHARS: usize = 500;

/// Plan, write defective code, test it, fix it once, test again.
pub struct Pipeline {
    planner: RoleAgent<Planner>,
    coder: RoleAgent<Coder>,
    tester: RoleAgent<TestAuthor>,
    judge: RoleAgent<Judge>,
    fixer: RoleAgent<Fixer>,
    runner: Arc<DynTestRunner>,
    workspace: Workspace,
}

impl Pipeline {
    pub fn new(client: Arc<DynLlmClient>, runner: Arc<DynTestRunner>, workspace: Workspace) -> Self {
        Self {
            planner: RoleAgent::new(Planner, client.clone()),
            coder: RoleAgent::new(Coder, client.clone()),
            tester: RoleAgent::new(TestAuthor, client.clone()),
            judge: RoleAgent::new(Judge, client.clone()),
            fixer: RoleAgent::new(Fixer, client),
            runner,
            workspace,
        }
    }

    /// Run every phase for `goal`. Stops at the first error; a failing final
    /// verdict still counts as a completed run.
    pub async fn run(&self, goal: &str) -> PipelineRun {
        let mut context = RunContext::new();
        match self.drive(goal, &mut context).await {
            Ok(report) => context.into_run(PipelineOutcome::Completed(report)),
            Err(error) => {
                let phase = context.phase().unwrap_or(Phase::Planning);
                warn!(%phase, error = %error, "pipeline stopped");
                context.record_phase_failure(phase, error.to_string());
                context.into_run(PipelineOutcome::failed(phase, error))
            }
        }
    }

    async fn drive(
        &self,
        goal: &str,
        context: &mut RunContext,
    ) -> Result<PipelineReport, PipelineError> {
        context.record_phase_start(Phase::Planning);
        info!(goal = %goal.trim(), "planning task");
        let spec = self.planner.run(goal).await?;
        info!(
            filename = %spec.filename,
            entry_point = %spec.entry_point_name,
            "task planned"
        );
        context.record_phase_end(Phase::Planning);

        context.record_phase_start(Phase::Coding);
        let artifact = self.coder.run(&spec).await?;
        self.workspace.ensure()?;
        self.persist_artifact(context, &spec, &artifact)?;
        context.record_phase_end(Phase::Coding);

        context.record_phase_start(Phase::TestAuthoring);
        let suite = self.tester.run(&spec).await?;
        self.persist(context, self.workspace.test_path(&spec), &suite.content)?;
        context.record_phase_end(Phase::TestAuthoring);

        context.record_phase_start(Phase::InitialRun);
        let first = self.execute(context, &spec, RunOrdinal::First).await;
        context.record_phase_end(Phase::InitialRun);

        context.record_phase_start(Phase::InitialJudging);
        let initial_verdict = self.issue_verdict(context, &first).await?;
        if initial_verdict.passed {
            warn!(reason = %initial_verdict.reason, "initial run passed; the coder failed to insert a detectable defect");
            context.record_anomaly("initial run passed: the coder failed to insert a detectable defect");
        }
        context.record_phase_end(Phase::InitialJudging);

        context.record_phase_start(Phase::Fixing);
        let current = ArtifactVersion {
            content: self.workspace.read(&self.workspace.live_path(&spec))?,
            origin: ArtifactOrigin::Code,
        };
        let fixed = self
            .fixer
            .run(FixRequest {
                spec: &spec,
                current: &current,
                failure: &first,
            })
            .await?;
        self.persist_artifact(context, &spec, &fixed)?;
        context.record_phase_end(Phase::Fixing);

        context.record_phase_start(Phase::VerificationRun);
        let second = self.execute(context, &spec, RunOrdinal::Second).await;
        context.record_phase_end(Phase::VerificationRun);

        context.record_phase_start(Phase::FinalJudging);
        let final_verdict = self.issue_verdict(context, &second).await?;
        context.record_phase_end(Phase::FinalJudging);

        Ok(PipelineReport {
            defect_detected: !initial_verdict.passed,
            artifacts: self.workspace.artifact_paths(&spec),
            spec,
            initial_verdict,
            final_verdict,
        })
    }

    /// Overwrite the live module and write the matching snapshot.
    fn persist_artifact(
        &self,
        context: &mut RunContext,
        spec: &TaskSpec,
        artifact: &ArtifactVersion,
    ) -> Result<(), PipelineError> {
        self.persist(context, self.workspace.live_path(spec), &artifact.content)?;
        let snapshot = self
            .workspace
            .snapshot_path(spec, artifact.origin.snapshot_tag());
        self.persist(context, snapshot, &artifact.content)
    }

    fn persist(
        &self,
        context: &mut RunContext,
        path: PathBuf,
        content: &str,
    ) -> Result<(), PipelineError> {
        self.workspace.write(&path, content)?;
        info!(path = %path.display(), "saved");
        context.record_artifact(path);
        Ok(())
    }

    async fn execute(
        &self,
        context: &mut RunContext,
        spec: &TaskSpec,
        run: RunOrdinal,
    ) -> ExecutionResult {
        info!(%run, test_file = %spec.test_filename(), "running tests");
        let output = self
            .runner
            .run(self.workspace.root(), &spec.test_filename())
            .await;
        info!(%run, output = %preview(&output, OUTPUT_PREVIEW_CHARS), "test output");
        debug!(%run, output = %output, "full test output");
        context.record_test_run(run, output.len());
        ExecutionResult {
            combined_output: output,
            produced_at: run,
        }
    }

    async fn issue_verdict(
        &self,
        context: &mut RunContext,
        result: &ExecutionResult,
    ) -> Result<Verdict, PipelineError> {
        let verdict = self.judge.run(result).await?;
        info!(
            run = %verdict.run,
            passed = verdict.passed,
            reason = %verdict.reason,
            "verdict"
        );
        context.record_verdict(&verdict);
        Ok(verdict)
    }
}

/// First `limit` characters of `text`.
fn preview(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("abc", 5), "abc");
        assert_eq!(preview("abcdef", 3), "abc");
        assert_eq!(preview("ééé", 2), "éé");
    }
}
