use serde::Deserialize;

use crate::schema::{ArtifactOrigin, ArtifactVersion, TaskSpec};
use crate::source::defines_entry_point;

use super::{Role, RoleKind};

pub const CODER_SYSTEM_PROMPT: &str = r#"You are a Senior Python Developer. Write a Python file based EXACTLY on the provided specification.

HOWEVER, you must introduce a SUBTLE BUG in the logic.
- Exactly one defect.
- It must NOT be a syntax error; it must be a logic error (e.g., off-by-one, inverted condition, wrong variable usage).
- The code must otherwise be clean and runnable.
- Define the function at module top level with the exact function name and inputs from the spec.

OUTPUT FORMAT (STRICT JSON ONLY)
- Return exactly one JSON object with a single key "file_content" containing the Python code:

{
  "file_content": "def foo():\n    pass"
}"#;

#[derive(Debug, Deserialize)]
pub struct SourcePayload {
    pub(super) file_content: String,
}

/// Writes the first, deliberately defective version of the module.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coder;

impl Role for Coder {
    type Input<'a> = &'a TaskSpec;
    type Payload = SourcePayload;
    type Output = ArtifactVersion;

    fn kind(&self) -> RoleKind {
        RoleKind::Code
    }

    fn user_prompt(&self, spec: &Self::Input<'_>) -> String {
        format!(
            "Filename: {}\nFunction Name: {}\nDescription: {}\nSteps: {}",
            spec.filename,
            spec.entry_point_name,
            spec.description,
            spec.steps_json()
        )
    }

    fn finalize(
        &self,
        spec: &Self::Input<'_>,
        payload: SourcePayload,
    ) -> Result<ArtifactVersion, String> {
        if !defines_entry_point(&payload.file_content, &spec.entry_point_name) {
            return Err(format!(
                "file_content does not define top-level function '{}'",
                spec.entry_point_name
            ));
        }
        Ok(ArtifactVersion {
            content: payload.file_content,
            origin: ArtifactOrigin::Code,
        })
    }
}
