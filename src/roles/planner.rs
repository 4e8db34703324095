use crate::schema::TaskSpec;
use crate::source::{SOURCE_EXTENSION, is_identifier};

use super::{Role, RoleKind};

pub const PLANNER_SYSTEM_PROMPT: &str = r#"You are a Senior Software Architect. Break the user's goal down into a precise single-file Python module specification.

YOU MUST DEFINE
1. The filename (a bare file name, always ending in .py, usable as a Python module name).
2. The main function name (the single entry point the module exposes).
3. A description of what the function does, including any errors it must raise.
4. A list of step-by-step logic instructions for the developer.

Do NOT write any code at this stage.

OUTPUT FORMAT (STRICT JSON ONLY)
- Return exactly one JSON object with these EXACT keys:

{
  "filename": "example.py",
  "function_name": "my_function",
  "description": "Brief summary...",
  "steps": ["Step 1", "Step 2"]
}"#;

/// Turns a free-text goal into a `TaskSpec`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Planner;

impl Role for Planner {
    type Input<'a> = &'a str;
    type Payload = TaskSpec;
    type Output = TaskSpec;

    fn kind(&self) -> RoleKind {
        RoleKind::Plan
    }

    fn user_prompt(&self, goal: &Self::Input<'_>) -> String {
        format!("Goal: {}", goal.trim())
    }

    fn finalize(&self, _goal: &Self::Input<'_>, mut spec: TaskSpec) -> Result<TaskSpec, String> {
        spec.filename = normalize_filename(&spec.filename)?;
        spec.entry_point_name = spec.entry_point_name.trim().to_string();
        if !is_identifier(&spec.entry_point_name) {
            return Err(format!(
                "function_name '{}' is not a valid identifier",
                spec.entry_point_name
            ));
        }
        Ok(spec)
    }
}

fn normalize_filename(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(format!("filename '{trimmed}' must be a single file, not a path"));
    }

    let suffix = format!(".{SOURCE_EXTENSION}");
    let stem = trimmed.strip_suffix(&suffix).unwrap_or(trimmed);
    if !is_identifier(stem) {
        return Err(format!(
            "filename '{trimmed}' does not name an importable module"
        ));
    }
    Ok(format!("{stem}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_missing_extension() {
        assert_eq!(normalize_filename("math_ops").unwrap(), "math_ops.py");
        assert_eq!(normalize_filename(" math_ops.py ").unwrap(), "math_ops.py");
    }

    #[test]
    fn rejects_paths_and_unimportable_names() {
        assert!(normalize_filename("src/math_ops.py").is_err());
        assert!(normalize_filename("math-ops.py").is_err());
        assert!(normalize_filename(".py").is_err());
    }
}
