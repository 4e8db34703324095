use serde::Deserialize;

use crate::schema::{TaskSpec, TestSuite};

use super::{Role, RoleKind};

pub const TESTER_SYSTEM_PROMPT: &str = r#"You are a QA Engineer. Write a pytest compatible test file for the given specification.

RULES
1. The test MUST import the function from the specified module (e.g. `from my_module import my_function`).
2. Assert the CORRECT behavior described by the specification, including success cases and every error the description says must be raised (use `pytest.raises`).
3. The implementation may contain a bug. Do NOT assume the code is buggy and do NOT adapt assertions to any implementation; a bug is detected when your correct test FAILS.

OUTPUT FORMAT (STRICT JSON ONLY)
- Return exactly one JSON object with a single key "test_content":

{
  "test_content": "import pytest\n..."
}"#;

#[derive(Debug, Deserialize)]
pub struct TestPayload {
    test_content: String,
}

/// Writes the test suite from the `TaskSpec` alone, never the code.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestAuthor;

impl Role for TestAuthor {
    type Input<'a> = &'a TaskSpec;
    type Payload = TestPayload;
    type Output = TestSuite;

    fn kind(&self) -> RoleKind {
        RoleKind::TestAuthor
    }

    fn user_prompt(&self, spec: &Self::Input<'_>) -> String {
        format!(
            "Module to import: {}\nFunction Name: {}\nExpected Behavior: {}\nLogic Steps: {}",
            spec.module_name(),
            spec.entry_point_name,
            spec.description,
            spec.steps_json()
        )
    }

    fn finalize(&self, _spec: &Self::Input<'_>, payload: TestPayload) -> Result<TestSuite, String> {
        if payload.test_content.trim().is_empty() {
            return Err("test_content is empty".to_string());
        }
        Ok(TestSuite {
            content: payload.test_content,
        })
    }
}
