//! Protocol error taxonomy
//!
//! Codec and verification failures are always surfaced to the caller — a
//! malformed message or a bad attestation indicates either a protocol
//! violation or a forged input, never something to retry or swallow.
//! Exceeding rate-limit *capacity* is not an error (transfers queue instead);
//! only an amount larger than the limit itself is rejected.

use thiserror::Error;

/// Errors produced by the protocol core.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Malformed bytes: bad length prefix, trailing bytes, unknown payload
    /// prefix, or out-of-order/duplicate guardian signature indices.
    #[error("parse error: {0}")]
    Parse(String),

    /// Too few valid guardian signatures to meet the threshold.
    #[error("quorum not met: {valid} valid signatures, threshold {threshold}")]
    Quorum { valid: usize, threshold: usize },

    /// The attestation references a guardian set this verifier does not know.
    #[error("unknown guardian set index {0}")]
    UnknownGuardianSet(u32),

    /// Decimal precision violation: trimmed decimals above the maximum, a
    /// scaling overflow, or a limit string not matching the required
    /// fractional-digit count.
    #[error("precision error: {0}")]
    Precision(String),

    /// The requested amount exceeds the corridor limit itself, so no amount
    /// of replenishment can ever satisfy it.
    #[error("amount {amount} exceeds corridor limit {limit}")]
    RateLimitExceeded { amount: u64, limit: u64 },
}

impl ProtocolError {
    /// Shorthand for a `Parse` error from anything displayable.
    pub fn parse(msg: impl Into<String>) -> Self {
        ProtocolError::Parse(msg.into())
    }

    /// Shorthand for a `Precision` error from anything displayable.
    pub fn precision(msg: impl Into<String>) -> Self {
        ProtocolError::Precision(msg.into())
    }
}
