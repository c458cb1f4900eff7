//! Lattice Protocol: Core of the Lattice Cross-Chain Token Bridge
//!
//! This crate is the pure protocol core shared by every service that speaks
//! the bridge's wire format:
//!
//! - **Amount Trimming** - Lossy decimal normalization across chains with
//!   differing native precisions, and the inverse scaling
//! - **Wire Layouts** - Manager message envelope and tagged payload variants,
//!   deterministic big-endian encode/decode
//! - **Attestation Verification** - Guardian-signed VAA parsing, double-hash
//!   digests, threshold signature verification
//! - **Rate Limiting** - Per-corridor capacity with linear replenishment and
//!   queue-with-delayed-release
//! - **Types & Hashing** - Chain IDs, universal addresses, keccak helpers
//!
//! Everything here is synchronous and I/O-free; chain interaction lives in
//! the `lattice-client` package.

pub mod amount;
pub mod attestation;
pub mod error;
pub mod hash;
pub mod rate_limit;
pub mod types;
pub mod wire;

// Re-export commonly used items at the crate root
pub use amount::{
    format_units, parse_units, remove_dust, TrimmedAmount, TRIMMED_DECIMALS,
};
pub use attestation::{
    guardian_address, GuardianSet, GuardianSignature, Vaa, VaaBody, VAA_VERSION,
};
pub use error::ProtocolError;
pub use hash::{bytes32_to_hex, double_keccak256, keccak256};
pub use rate_limit::{
    ConsumeOutcome, Corridor, CorridorRateLimiter, Direction, RateLimitState,
    RATE_LIMIT_DURATION,
};
pub use types::{ChainId, UniversalAddress};
pub use wire::{message_digest, ManagerMessage, Payload, TokenIdentity};
