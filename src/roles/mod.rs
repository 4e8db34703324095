//! The five pipeline roles and the agent that drives any one of them.

mod coder;
mod fixer;
mod judge;
mod planner;
mod tester;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::DynLlmClient;
use crate::contract;
use crate::error::PipelineError;

pub use coder::{CODER_SYSTEM_PROMPT, Coder};
pub use fixer::{FIXER_SYSTEM_PROMPT, FixRequest, Fixer};
pub use judge::{JUDGE_SYSTEM_PROMPT, Judge};
pub(crate) use judge::failure_marker;
pub use planner::{PLANNER_SYSTEM_PROMPT, Planner};
pub use tester::{TESTER_SYSTEM_PROMPT, TestAuthor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Plan,
    Code,
    TestAuthor,
    Judge,
    Fix,
}

impl RoleKind {
    pub const ALL: [RoleKind; 5] = [
        RoleKind::Plan,
        RoleKind::Code,
        RoleKind::TestAuthor,
        RoleKind::Judge,
        RoleKind::Fix,
    ];

    pub fn system_prompt(self) -> &'static str {
        match self {
            RoleKind::Plan => PLANNER_SYSTEM_PROMPT,
            RoleKind::Code => CODER_SYSTEM_PROMPT,
            RoleKind::TestAuthor => TESTER_SYSTEM_PROMPT,
            RoleKind::Judge => JUDGE_SYSTEM_PROMPT,
            RoleKind::Fix => FIXER_SYSTEM_PROMPT,
        }
    }

    /// Which role a system prompt belongs to, tolerating provider suffixes.
    pub fn identify(system: &str) -> Option<RoleKind> {
        Self::ALL
            .into_iter()
            .find(|kind| system.starts_with(kind.system_prompt()))
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RoleKind::Plan => "plan",
            RoleKind::Code => "code",
            RoleKind::TestAuthor => "test-author",
            RoleKind::Judge => "judge",
            RoleKind::Fix => "fix",
        };
        write!(f, "{label}")
    }
}

/// Behavioral contract of one role.
///
/// `finalize` turns the decoded wire payload into the role's output record and
/// returns a schema-violation detail when the payload is well-formed but breaks
/// the role's rules.
pub trait Role {
    type Input<'a>;
    type Payload: DeserializeOwned;
    type Output;

    fn kind(&self) -> RoleKind;

    fn system_prompt(&self) -> &'static str {
        self.kind().system_prompt()
    }

    fn user_prompt(&self, input: &Self::Input<'_>) -> String;

    /// Answer without consulting the provider.
    fn short_circuit(&self, _input: &Self::Input<'_>) -> Option<Self::Output> {
        None
    }

    fn finalize(&self, input: &Self::Input<'_>, payload: Self::Payload)
    -> Result<Self::Output, String>;
}

/// Runs a single role against the injected provider. Never retries.
pub struct RoleAgent<R> {
    role: R,
    client: Arc<DynLlmClient>,
}

impl<R: Role> RoleAgent<R> {
    pub fn new(role: R, client: Arc<DynLlmClient>) -> Self {
        Self { role, client }
    }

    pub async fn run(&self, input: R::Input<'_>) -> Result<R::Output, PipelineError> {
        let kind = self.role.kind();
        if let Some(output) = self.role.short_circuit(&input) {
            debug!(role = %kind, "answered without provider call");
            return Ok(output);
        }

        let user = self.role.user_prompt(&input);
        debug!(role = %kind, prompt = %user, "calling provider");
        let raw = self
            .client
            .complete(self.role.system_prompt(), &user, true)
            .await?;
        debug!(role = %kind, response = %raw, "provider responded");

        let payload: R::Payload =
            contract::decode(&raw).map_err(|err| PipelineError::contract(kind, err))?;
        self.role
            .finalize(&input, payload)
            .map_err(|detail| PipelineError::SchemaViolation { role: kind, detail })
    }
}
