use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::client::ProviderError;
use crate::contract::ContractError;
use crate::roles::RoleKind;

/// Every way a pipeline run can stop before reaching a final verdict.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{role} role returned a malformed response: {detail}")]
    MalformedResponse { role: RoleKind, detail: String },

    #[error("{role} role output violates its schema: {detail}")]
    SchemaViolation { role: RoleKind, detail: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("workspace I/O failed for {}: {source}", path.display())]
    WorkspaceIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn contract(role: RoleKind, error: ContractError) -> Self {
        match error {
            ContractError::MalformedResponse(detail) => Self::MalformedResponse { role, detail },
            ContractError::SchemaViolation(detail) => Self::SchemaViolation { role, detail },
        }
    }

    pub fn workspace_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WorkspaceIo {
            path: path.into(),
            source,
        }
    }
}
