//! Chain adapter and guardian network boundaries
//!
//! All chain-specific behavior lives behind [`ChainAdapter`] — one
//! implementation per platform (EVM, Solana, Sui, Stacks, ...), selected by
//! interface dispatch. The adapter owns transaction construction, fee/gas
//! estimation, signing, and RPC handling; the lifecycle core only ever sees
//! wire bytes, transaction IDs, and rate-limiter snapshots.
//!
//! The guardian network is likewise a read-only boundary: the core fetches
//! raw signed attestations and verifies them, it never produces signatures.

use std::fmt;

use async_trait::async_trait;
use eyre::Result;
use lattice_protocol::{
    rate_limit::{Corridor, Direction, RateLimitState},
    types::{ChainId, UniversalAddress},
};
use serde::{Deserialize, Serialize};

/// Chain-native transaction identifier, opaque to the core
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        TxId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The chain-native event a submitted message produces once finalized
///
/// This triple is also the lookup key for the guardian network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeEvent {
    pub emitter_chain: ChainId,
    pub emitter_address: [u8; 32],
    pub sequence: u64,
}

/// Per-platform chain access, dispatched through this interface only
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Submit an encoded manager message; returns the chain-native tx id
    async fn submit_message(&self, wire_bytes: &[u8]) -> Result<TxId>;

    /// Query the native event for a submitted transaction
    ///
    /// `None` until the transaction is finalized on its chain.
    async fn query_native_event(&self, tx: &TxId) -> Result<Option<NativeEvent>>;

    /// Read the current rate-limiter snapshot for a corridor direction
    async fn query_rate_limit_state(
        &self,
        corridor: Corridor,
        direction: Direction,
    ) -> Result<RateLimitState>;

    /// Persist a committed rate-limiter state on chain; returns the tx id
    /// of the transaction that carried the release
    async fn commit_rate_limit_state(
        &self,
        corridor: Corridor,
        direction: Direction,
        state: RateLimitState,
    ) -> Result<TxId>;

    /// Native decimal precision of a token on this chain
    async fn token_decimals(&self, token: &UniversalAddress) -> Result<u8>;
}

/// Read-only access to the guardian network
#[async_trait]
pub trait GuardianClient: Send + Sync {
    /// Fetch the raw signed attestation for an emitted message
    ///
    /// `None` until the guardian network has observed and signed it.
    async fn fetch_attestation(
        &self,
        emitter_chain: ChainId,
        emitter_address: [u8; 32],
        sequence: u64,
    ) -> Result<Option<Vec<u8>>>;
}
