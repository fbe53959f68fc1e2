use mapflow_adapters::StepError;
use mapflow_core::WorkflowError;
use thiserror::Error;

use super::domain_error::DomainError;

/// Top-level error of the host.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("internal error: {0}")]
    Internal(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Step(#[from] StepError),
}
