use mapflow_core::WorkflowError;
use thiserror::Error;

use crate::transport::RequestError;
use crate::view::StepView;

/// Failure of a step interaction. Nothing has been written to state and the
/// workflow has not moved when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StepError {
    #[error("session expired, sign in again")]
    AuthExpired,
    #[error("request failed: {status_text}")]
    RequestFailed { status: Option<u16>, status_text: String },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("no function registered as '{0}'")]
    UnknownFunction(String),
    #[error("function '{name}' failed: {message}")]
    FunctionFailed { name: String, message: String },
    #[error("cannot decode response: {0}")]
    Decode(String),
    #[error("'{action}' does not apply to a {step_type} step")]
    NotApplicable { action: &'static str, step_type: String },
    #[error(transparent)]
    Navigation(#[from] WorkflowError),
}

impl From<RequestError> for StepError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::Unauthorized => StepError::AuthExpired,
            RequestError::Status { status, status_text } => StepError::RequestFailed { status: Some(status),
                                                                                       status_text },
            RequestError::Transport(msg) => StepError::RequestFailed { status: None,
                                                                       status_text: msg },
        }
    }
}

impl StepError {
    /// Step-local view for the error: a sign-in prompt for an expired
    /// session, an error message otherwise.
    pub fn to_view(&self) -> StepView {
        match self {
            StepError::AuthExpired => StepView::AuthRequired,
            StepError::RequestFailed { status, .. } => StepView::Error { status: *status,
                                                                         message: self.to_string() },
            other => StepView::Error { status: None,
                                       message: other.to_string() },
        }
    }
}
