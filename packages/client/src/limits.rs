//! Rate-limit configuration surface
//!
//! Limit values cross the operator boundary as decimal strings whose
//! fractional part must exactly match the corridor's configured precision
//! (a 2-decimal corridor takes `"1000.00"`, nothing else). A value that
//! normalizes to zero means "unset" and is flagged to the operator rather
//! than silently configuring a zero limit.

use std::sync::Arc;

use eyre::Result;
use lattice_protocol::{
    amount::{format_units, parse_units},
    error::ProtocolError,
    rate_limit::{Corridor, Direction, RateLimitState},
};
use tracing::warn;

use crate::adapter::ChainAdapter;
use crate::pool;

/// Parse a corridor limit string at the corridor's exact decimal precision
///
/// Returns `None` (with an operator warning) when the value normalizes to
/// zero; strings with the wrong fractional width are a `Precision` error.
pub fn parse_corridor_limit(s: &str, decimals: u8) -> Result<Option<u64>, ProtocolError> {
    let value = parse_units(s, decimals)?;
    if value == 0 {
        warn!(
            limit = s,
            decimals, "corridor limit normalizes to zero, treating as unset"
        );
        return Ok(None);
    }
    Ok(Some(value))
}

/// Render a raw limit back to the corridor's decimal-string form
pub fn format_corridor_limit(limit: u64, decimals: u8) -> String {
    format_units(limit, decimals)
}

/// Pull inbound limiter snapshots across many corridors
///
/// Partial-tolerant: each corridor's failure is reported alongside its
/// siblings' successes instead of aborting the batch. Results preserve the
/// input corridor order.
pub async fn fetch_inbound_limits(
    adapter: Arc<dyn ChainAdapter>,
    corridors: Vec<Corridor>,
    concurrency: usize,
) -> Vec<(Corridor, Result<RateLimitState>)> {
    let results = pool::map_ordered_settled(corridors.clone(), concurrency, |corridor| {
        let adapter = adapter.clone();
        async move {
            adapter
                .query_rate_limit_state(corridor, Direction::Inbound)
                .await
        }
    })
    .await;

    corridors.into_iter().zip(results).collect()
}
