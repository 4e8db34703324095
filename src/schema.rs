//! Records exchanged between the pipeline roles.
//!
//! `TaskSpec` doubles as the planner's wire payload, so its serde layout is the
//! JSON shape the planner prompt asks for.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::source::SOURCE_EXTENSION;

/// Single-module task produced by the planner and shared by every later role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub filename: String,
    #[serde(rename = "function_name")]
    pub entry_point_name: String,
    pub description: String,
    pub steps: Vec<String>,
}

impl TaskSpec {
    /// Import name of the module, i.e. the filename without its extension.
    pub fn module_name(&self) -> &str {
        self.filename
            .strip_suffix(SOURCE_EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
            .unwrap_or(&self.filename)
    }

    pub fn test_filename(&self) -> String {
        format!("test_{}.{SOURCE_EXTENSION}", self.module_name())
    }

    pub fn snapshot_filename(&self, tag: SnapshotTag) -> String {
        format!("{}_{}.{SOURCE_EXTENSION}", self.module_name(), tag.suffix())
    }

    /// Steps rendered as a JSON array, the form every prompt embeds them in.
    pub fn steps_json(&self) -> String {
        serde_json::to_string(&self.steps).unwrap_or_else(|_| format!("{:?}", self.steps))
    }
}

/// Version tag appended to the module stem for the immutable snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotTag {
    Buggy,
    Fixed,
}

impl SnapshotTag {
    pub fn suffix(self) -> &'static str {
        match self {
            SnapshotTag::Buggy => "buggy",
            SnapshotTag::Fixed => "fixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOrigin {
    Code,
    Fix,
}

impl ArtifactOrigin {
    pub fn snapshot_tag(self) -> SnapshotTag {
        match self {
            ArtifactOrigin::Code => SnapshotTag::Buggy,
            ArtifactOrigin::Fix => SnapshotTag::Fixed,
        }
    }
}

/// Full source text of the module under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactVersion {
    pub content: String,
    pub origin: ArtifactOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuite {
    pub content: String,
}

/// Which of the two test runs an output or verdict belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunOrdinal {
    First,
    Second,
}

impl fmt::Display for RunOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOrdinal::First => write!(f, "initial"),
            RunOrdinal::Second => write!(f, "verification"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub combined_output: String,
    pub produced_at: RunOrdinal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub reason: String,
    pub run: RunOrdinal,
}
