use serde::Deserialize;

use crate::exec::{
    COLLECT_FAILURE_NOTE, EXIT_STATUS_NOTE, LAUNCH_FAILURE_NOTE, SIGNAL_NOTE, TIMEOUT_NOTE,
};
use crate::schema::{ExecutionResult, Verdict};

use super::{Role, RoleKind};

pub const JUDGE_SYSTEM_PROMPT: &str = r#"You are a CI/CD Judge. Analyze the pytest output to determine if the tests PASSED or FAILED.

RULES
- Success = every test passed and there were no errors.
- Any failing test, uncaught exception traceback, collection error, or missing tests means FAILURE.
- "reason" is a one-sentence summary in your own words; do not paste the raw output.

OUTPUT FORMAT (STRICT JSON ONLY)
- Return exactly one JSON object with "success" (boolean) and "reason" (string):

{
  "success": true,
  "reason": "All 3 tests passed."
}"#;

const NO_TESTS_REASON: &str = "no tests detected";

/// pytest's exit code when it collected nothing; the short-circuit covers it.
const NO_TESTS_EXIT_CODE: i32 = 5;

#[derive(Debug, Deserialize)]
pub struct VerdictPayload {
    success: bool,
    reason: String,
}

/// Reads one test run's output and decides whether it passed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Judge;

impl Role for Judge {
    type Input<'a> = &'a ExecutionResult;
    type Payload = VerdictPayload;
    type Output = Verdict;

    fn kind(&self) -> RoleKind {
        RoleKind::Judge
    }

    fn user_prompt(&self, result: &Self::Input<'_>) -> String {
        format!("Pytest Output:\n{}", result.combined_output)
    }

    fn short_circuit(&self, result: &Self::Input<'_>) -> Option<Verdict> {
        let output = result.combined_output.trim();
        if output.is_empty() || output.contains("no tests ran") {
            return Some(Verdict {
                passed: false,
                reason: NO_TESTS_REASON.to_string(),
                run: result.produced_at,
            });
        }
        None
    }

    fn finalize(
        &self,
        result: &Self::Input<'_>,
        payload: VerdictPayload,
    ) -> Result<Verdict, String> {
        let mut verdict = Verdict {
            passed: payload.success,
            reason: payload.reason.trim().to_string(),
            run: result.produced_at,
        };

        if verdict.passed {
            if let Some(marker) = failure_marker(&result.combined_output) {
                verdict.passed = false;
                verdict.reason = format!("Test output reports a failure ({marker}).");
            }
        }
        Ok(verdict)
    }
}

/// First sign of failure in runner output, if any.
pub(crate) fn failure_marker(output: &str) -> Option<&'static str> {
    if let Some(marker) = runner_note(output) {
        return Some(marker);
    }
    let lowered = output.to_lowercase();
    if lowered.contains("failed") {
        return Some("failed tests");
    }
    if output.contains("Traceback (most recent call last)") {
        return Some("uncaught exception");
    }
    if lowered.contains(" error in ") || lowered.contains(" errors in ") {
        return Some("errors during the run");
    }
    for line in output.lines() {
        if line.starts_with("INTERNALERROR>") {
            return Some("pytest internal error");
        }
        if line.starts_with("ERROR") {
            return Some("collection or setup error");
        }
        if line.starts_with("E ") {
            return Some("assertion error");
        }
    }
    None
}

/// Notes the test runner appends when the command did not finish cleanly.
fn runner_note(output: &str) -> Option<&'static str> {
    for line in output.lines().map(str::trim) {
        if line.starts_with(TIMEOUT_NOTE) {
            return Some("test command timed out");
        }
        if line.starts_with(SIGNAL_NOTE) {
            return Some("test command was killed");
        }
        if line.starts_with(LAUNCH_FAILURE_NOTE) || line.starts_with(COLLECT_FAILURE_NOTE) {
            return Some("test command did not run");
        }
        if let Some(code) = exit_status(line) {
            if code != 0 && code != NO_TESTS_EXIT_CODE {
                return Some("non-zero exit status");
            }
        }
    }
    None
}

fn exit_status(line: &str) -> Option<i32> {
    line.strip_prefix(EXIT_STATUS_NOTE)?
        .strip_suffix(']')?
        .trim()
        .parse()
        .ok()
}
