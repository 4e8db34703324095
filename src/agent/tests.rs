use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::client::{LlmClient, OfflineClient, ProviderError};
use crate::error::PipelineError;
use crate::exec::TestRunner;
use crate::roles::RoleKind;
use crate::schema::RunOrdinal;
use crate::workspace::Workspace;

use super::context::PipelineEvent;
use super::outcome::PipelineOutcome;
use super::types::Phase;
use super::Pipeline;

const GOAL: &str = "compute a non-negative integer's factorial, rejecting negative input";

/// Pretends to be pytest: fails while the live module still returns 0 for
/// the base case.
#[derive(Default)]
struct FakePytest {
    invocations: Mutex<Vec<String>>,
    always_pass: bool,
}

impl FakePytest {
    fn passing() -> Self {
        Self {
            always_pass: true,
            ..Self::default()
        }
    }

    fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestRunner for FakePytest {
    async fn run(&self, workdir: &Path, test_file: &str) -> String {
        self.invocations.lock().unwrap().push(test_file.to_string());
        let live = std::fs::read_to_string(workdir.join("math_ops.py")).unwrap_or_default();
        if !self.always_pass && live.contains("return 0") {
            "F.\nE       assert 0 == 120\n1 failed, 1 passed in 0.02s\n".to_string()
        } else {
            "..\n2 passed in 0.01s\n".to_string()
        }
    }
}

/// Offline answers, except for one role which gets a fixed reply or error.
struct Sabotaged {
    inner: OfflineClient,
    target: RoleKind,
    reply: Result<String, ProviderError>,
}

#[async_trait]
impl LlmClient for Sabotaged {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        structured: bool,
    ) -> Result<String, ProviderError> {
        if RoleKind::identify(system) == Some(self.target) {
            return self.reply.clone();
        }
        self.inner.complete(system, user, structured).await
    }
}

fn phases_started(events: &[PipelineEvent]) -> Vec<Phase> {
    events
        .iter()
        .filter_map(|event| match event {
            PipelineEvent::PhaseStarted(phase) => Some(*phase),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn offline_factorial_run_plants_and_fixes_defect() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(OfflineClient::new());
    let runner = Arc::new(FakePytest::default());
    let pipeline = Pipeline::new(client.clone(), runner.clone(), Workspace::new(temp.path()));

    let run = pipeline.run(GOAL).await;

    let report = match &run.outcome {
        PipelineOutcome::Completed(report) => report,
        PipelineOutcome::Failed { phase, error } => panic!("failed during {phase}: {error}"),
    };
    assert!(run.succeeded());
    assert_eq!(report.spec.filename, "math_ops.py");
    assert_eq!(report.spec.entry_point_name, "factorial");
    assert!(!report.initial_verdict.passed);
    assert_eq!(report.initial_verdict.run, RunOrdinal::First);
    assert!(report.final_verdict.passed);
    assert_eq!(report.final_verdict.run, RunOrdinal::Second);
    assert!(report.defect_detected);

    // plan, code, tests, judge, fix, judge
    assert_eq!(client.call_count(), 6);
    assert_eq!(
        runner.invocations(),
        vec!["test_math_ops.py".to_string(), "test_math_ops.py".to_string()]
    );

    let buggy = std::fs::read_to_string(temp.path().join("math_ops_buggy.py")).unwrap();
    let fixed = std::fs::read_to_string(temp.path().join("math_ops_fixed.py")).unwrap();
    let live = std::fs::read_to_string(temp.path().join("math_ops.py")).unwrap();
    assert!(buggy.contains("return 0"));
    assert!(fixed.contains("return 1"));
    assert_eq!(live, fixed);
    assert!(temp.path().join("test_math_ops.py").exists());
    assert!(report.artifacts.buggy.ends_with("math_ops_buggy.py"));

    assert_eq!(phases_started(&run.events), Phase::ALL.to_vec());
    let persisted = run
        .events
        .iter()
        .filter(|event| matches!(event, PipelineEvent::ArtifactPersisted(_)))
        .count();
    // live + buggy, tests, live + fixed
    assert_eq!(persisted, 5);
    assert!(!run
        .events
        .iter()
        .any(|event| matches!(event, PipelineEvent::Anomaly(_))));
}

#[tokio::test]
async fn test_file_is_written_once() {
    let temp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        Arc::new(OfflineClient::new()),
        Arc::new(FakePytest::default()),
        Workspace::new(temp.path()),
    );

    let run = pipeline.run(GOAL).await;

    let test_writes = run
        .events
        .iter()
        .filter(|event| match event {
            PipelineEvent::ArtifactPersisted(path) => path.ends_with("test_math_ops.py"),
            _ => false,
        })
        .count();
    assert_eq!(test_writes, 1);
}

#[tokio::test]
async fn passing_initial_run_is_an_anomaly_not_a_stop() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(OfflineClient::new());
    let pipeline = Pipeline::new(
        client.clone(),
        Arc::new(FakePytest::passing()),
        Workspace::new(temp.path()),
    );

    let run = pipeline.run(GOAL).await;

    let report = run.outcome.report().expect("run should complete");
    assert!(report.initial_verdict.passed);
    assert!(!report.defect_detected);
    assert!(report.final_verdict.passed);
    assert_eq!(client.call_count(), 6);
    assert!(run
        .events
        .iter()
        .any(|event| matches!(event, PipelineEvent::Anomaly(_))));
    assert!(temp.path().join("math_ops_fixed.py").exists());
}

#[tokio::test]
async fn provider_error_stops_in_its_phase() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(Sabotaged {
        inner: OfflineClient::new(),
        target: RoleKind::Code,
        reply: Err(ProviderError::Unauthorized),
    });
    let pipeline = Pipeline::new(
        client,
        Arc::new(FakePytest::default()),
        Workspace::new(temp.path()),
    );

    let run = pipeline.run(GOAL).await;

    match &run.outcome {
        PipelineOutcome::Failed { phase, error } => {
            assert_eq!(*phase, Phase::Coding);
            assert!(matches!(
                error,
                PipelineError::Provider(ProviderError::Unauthorized)
            ));
        }
        PipelineOutcome::Completed(_) => panic!("run should fail"),
    }
    assert!(!run.succeeded());
    assert!(matches!(
        run.events.last(),
        Some(PipelineEvent::PhaseFailed {
            phase: Phase::Coding,
            ..
        })
    ));
    assert!(!temp.path().join("math_ops.py").exists());
}

#[tokio::test]
async fn malformed_fix_leaves_buggy_artifacts_in_place() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(Sabotaged {
        inner: OfflineClient::new(),
        target: RoleKind::Fix,
        reply: Ok("Here is the fixed code: def factorial(n): ...".to_string()),
    });
    let runner = Arc::new(FakePytest::default());
    let pipeline = Pipeline::new(client, runner.clone(), Workspace::new(temp.path()));

    let run = pipeline.run(GOAL).await;

    match &run.outcome {
        PipelineOutcome::Failed { phase, error } => {
            assert_eq!(*phase, Phase::Fixing);
            assert!(matches!(
                error,
                PipelineError::MalformedResponse {
                    role: RoleKind::Fix,
                    ..
                }
            ));
        }
        PipelineOutcome::Completed(_) => panic!("run should fail"),
    }
    assert_eq!(runner.invocations().len(), 1);
    assert!(temp.path().join("math_ops_buggy.py").exists());
    assert!(!temp.path().join("math_ops_fixed.py").exists());
}

#[tokio::test]
async fn fixer_sees_live_copy_from_disk() {
    struct EditingRunner;

    #[async_trait]
    impl TestRunner for EditingRunner {
        async fn run(&self, workdir: &Path, _test_file: &str) -> String {
            let live = workdir.join("math_ops.py");
            let content = std::fs::read_to_string(&live).unwrap();
            if !content.contains("# touched") {
                std::fs::write(&live, format!("{content}# touched\n")).unwrap();
            }
            "1 failed in 0.01s\n".to_string()
        }
    }

    struct RecordingFixPrompt {
        inner: OfflineClient,
        fix_prompt: Mutex<Option<String>>,
    }

    #[async_trait]
    impl LlmClient for RecordingFixPrompt {
        async fn complete(
            &self,
            system: &str,
            user: &str,
            structured: bool,
        ) -> Result<String, ProviderError> {
            if RoleKind::identify(system) == Some(RoleKind::Fix) {
                *self.fix_prompt.lock().unwrap() = Some(user.to_string());
            }
            self.inner.complete(system, user, structured).await
        }
    }

    let temp = TempDir::new().unwrap();
    let client = Arc::new(RecordingFixPrompt {
        inner: OfflineClient::new(),
        fix_prompt: Mutex::new(None),
    });
    let pipeline = Pipeline::new(
        client.clone(),
        Arc::new(EditingRunner),
        Workspace::new(temp.path()),
    );

    let run = pipeline.run(GOAL).await;

    assert!(!run.succeeded());
    let prompt = client.fix_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("# touched"));
}

#[tokio::test]
async fn timed_out_verification_run_fails_the_pipeline() {
    struct TimingOut;

    #[async_trait]
    impl TestRunner for TimingOut {
        async fn run(&self, _workdir: &Path, _test_file: &str) -> String {
            "[test command timed out after 120s]\n".to_string()
        }
    }

    let temp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        Arc::new(OfflineClient::new()),
        Arc::new(TimingOut),
        Workspace::new(temp.path()),
    );

    let run = pipeline.run(GOAL).await;

    let report = run.outcome.report().expect("run should complete");
    assert!(report.defect_detected);
    assert!(!report.final_verdict.passed);
    assert!(!run.succeeded());
}
