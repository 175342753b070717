//! Domain error taxonomy (spec §7). Callers distinguish retry-class errors from
//! terminal ones instead of matching on string content wherever possible.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("insufficient confirmations: have {have}, need {need}")]
    InsufficientConfirmations { have: u64, need: u64 },

    #[error("already processed on target chain")]
    AlreadyProcessed,

    #[error("insufficient bridge balance: {0}")]
    InsufficientLiquidity(String),

    #[error("retryable RPC error: {0}")]
    RetryableRpc(String),

    #[error("terminal RPC error: {0}")]
    TerminalRpc(String),

    #[error("store failure: {0}")]
    StoreFailure(#[from] sqlx::Error),

    #[error("shutdown cancelled mid-operation")]
    ShutdownCancelled,
}

impl BridgeError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::RetryableRpc(_) | BridgeError::StoreFailure(_)
        )
    }
}
