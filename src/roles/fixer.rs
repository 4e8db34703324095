use crate::schema::{ArtifactOrigin, ArtifactVersion, ExecutionResult, TaskSpec};
use crate::source::{defines_entry_point, entry_point_signature};

use super::coder::SourcePayload;
use super::{Role, RoleKind};

pub const FIXER_SYSTEM_PROMPT: &str = r#"You are a Senior Python Developer. Your task is to FIX a bug in the provided code.

You have the original specification, the current buggy code, and the test failure output.

RULES
1. YOU MUST NOT CHANGE the function signature (name, arguments) or the file name. The test suite is fixed and binds to the original signature.
2. Analyze the test failure to understand the logic error, then correct it.
3. Return the complete file, not a diff.

OUTPUT FORMAT (STRICT JSON ONLY)
- Return exactly one JSON object with "file_content" containing the FIXED Python code:

{
  "file_content": "def foo():\n    # fixed logic..."
}"#;

/// Everything the fixer sees: the plan, the broken code and why it failed.
#[derive(Debug, Clone, Copy)]
pub struct FixRequest<'a> {
    pub spec: &'a TaskSpec,
    pub current: &'a ArtifactVersion,
    pub failure: &'a ExecutionResult,
}

/// Repairs the defective module without touching its interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fixer;

impl Role for Fixer {
    type Input<'a> = FixRequest<'a>;
    type Payload = SourcePayload;
    type Output = ArtifactVersion;

    fn kind(&self) -> RoleKind {
        RoleKind::Fix
    }

    fn user_prompt(&self, request: &Self::Input<'_>) -> String {
        format!(
            "Spec: {}\nFunction: {}\nLogic: {}\n\nCurrent Code:\n```python\n{}\n```\n\nTest Output:\n{}",
            request.spec.description,
            request.spec.entry_point_name,
            request.spec.steps_json(),
            request.current.content,
            request.failure.combined_output
        )
    }

    fn finalize(
        &self,
        request: &Self::Input<'_>,
        payload: SourcePayload,
    ) -> Result<ArtifactVersion, String> {
        let name = &request.spec.entry_point_name;
        if !defines_entry_point(&payload.file_content, name) {
            return Err(format!(
                "file_content no longer defines top-level function '{name}'"
            ));
        }

        if let Some(original) = entry_point_signature(&request.current.content, name) {
            let fixed = entry_point_signature(&payload.file_content, name).unwrap_or_default();
            if fixed != original {
                return Err(format!(
                    "fix changed the signature of '{name}' from ({original}) to ({fixed})"
                ));
            }
        }

        Ok(ArtifactVersion {
            content: payload.file_content,
            origin: ArtifactOrigin::Fix,
        })
    }
}
