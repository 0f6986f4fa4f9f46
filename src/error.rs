//! Error types for the expense agent

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {

    // =============================
    // Extraction Pipeline Errors
    // =============================

    /// Every clause of a message failed extraction.
    /// Clause-level failures are swallowed inside the rule-based parser;
    /// this fires only when nothing at all was understood.
    #[error("no expense found in message")]
    NoExpenseFound,

    /// The model's output violated the structured-output contract.
    /// Always demoted to a Tier 2 fallback attempt, never shown raw to users.
    #[error("model output validation failed: {0}")]
    Validation(String),

    // =============================
    // External Collaborator Errors
    // =============================

    #[error("external call failed: {0}")]
    ExternalCall(String),

    /// Sub-kind of ExternalCall, logged distinctly so operators can tell
    /// "model is down" from "model is out of budget".
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("not configured: {0}")]
    NotConfigured(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Whether a Tier 1 failure with this error should demote to Tier 2.
    /// Persistence failures are fatal to the current message instead.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            AgentError::Validation(_)
                | AgentError::ExternalCall(_)
                | AgentError::QuotaExceeded(_)
                | AgentError::AuthFailure(_)
                | AgentError::NotConfigured(_)
                | AgentError::Http(_)
                | AgentError::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_triggers_fallback() {
        assert!(AgentError::Validation("bad tag".to_string()).triggers_fallback());
        assert!(AgentError::QuotaExceeded("429".to_string()).triggers_fallback());
        assert!(!AgentError::NoExpenseFound.triggers_fallback());
        assert!(!AgentError::Persistence("append failed".to_string()).triggers_fallback());
    }
}
