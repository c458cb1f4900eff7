//! Lifecycle error taxonomy
//!
//! Protocol violations bubble up unchanged from `lattice-protocol`; adapter
//! failures arrive here only after the retry policy has exhausted transient
//! handling. A transfer queued for lack of corridor capacity is a lifecycle
//! state, not an error.

use lattice_protocol::ProtocolError;
use thiserror::Error;

/// Errors produced while driving a transfer through its lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The attestation was not observed within the caller's deadline.
    /// Nothing was mutated; `resume` picks up from current chain state.
    #[error("timed out waiting for on-chain state")]
    Timeout,

    /// Opaque passthrough from a chain adapter after retries were exhausted.
    #[error("chain adapter error: {0}")]
    Adapter(String),

    /// A protocol-level failure: malformed bytes, bad attestation, precision
    /// violation, or an amount above the corridor limit.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// `finalize` called before the queued transfer's release time.
    #[error("queued transfer not releasable until {release_time} (now {now})")]
    QueueNotReady { release_time: i64, now: i64 },

    /// The receipt is not in a state the requested operation accepts.
    #[error("cannot {operation} a transfer in state {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

impl LifecycleError {
    /// Wrap an exhausted adapter failure
    pub fn adapter(err: impl std::fmt::Display) -> Self {
        LifecycleError::Adapter(err.to_string())
    }
}
