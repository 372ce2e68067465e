use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures the conversation and milestone loops know how to name.
///
/// Everything except `BackendUnavailable` and `Storage` is recovered inside
/// the loops: the Display text becomes the observation or notice the user sees.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Invalid function call format")]
    MalformedCall,

    #[error("Unknown function: {0}")]
    UnknownCapability(String),

    #[error("Function call limit of {0} reached for this turn, stopping here")]
    LoopLimitExceeded(usize),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
