//! Lattice Client: Transfer Orchestration for the Lattice Bridge
//!
//! Async orchestration layer over the pure `lattice-protocol` core:
//!
//! - **Lifecycle** - Drives a transfer from source-chain submission through
//!   attestation to destination release, re-derivable from chain state
//! - **Adapters** - Per-platform chain access and guardian network access
//!   behind trait boundaries
//! - **Retry** - Exponential backoff with transient/permanent classification
//!   for adapter calls
//! - **Pool** - Bounded-concurrency batch queries with order preservation
//! - **Limits** - Operator-facing rate-limit configuration and snapshots
//! - **Relay** - Fee quote requests and relayer instruction blobs
//!
//! # Flow
//!
//! ```text
//! initiate ─► track/resume ─► redeem ─┬─► finalize (released)
//!                                     └─► queued ─► finalize (after release time)
//! ```

pub mod adapter;
pub mod error;
pub mod lifecycle;
pub mod limits;
pub mod pool;
pub mod relay;
pub mod retry;

// Re-export commonly used items at the crate root
pub use adapter::{ChainAdapter, GuardianClient, NativeEvent, TxId};
pub use error::LifecycleError;
pub use lifecycle::{TransferLifecycle, TransferParams, TransferReceipt, TransferState};
pub use limits::{fetch_inbound_limits, format_corridor_limit, parse_corridor_limit};
pub use pool::{join_lanes, map_ordered, map_ordered_settled, DEFAULT_CONCURRENCY};
pub use relay::{
    decode_relay_instructions, encode_relay_instructions, FeeQuoteRequest, RelayInstruction,
};
pub use retry::{classify_error, with_retry, ErrorClass, RetryConfig};
