//! Bounded concurrent query batches
//!
//! Read-only batch queries (token decimals, peer configuration, rate-limiter
//! snapshots across many corridors) run through a bounded pool with a fixed
//! concurrency cap. Results always preserve the input ordering regardless of
//! completion order.
//!
//! Two lanes can run at once: a strictly sequential lane for resources that
//! are unsafe to access concurrently (chains whose submission model allows a
//! single in-flight transaction per account), and a parallel lane bounded by
//! the cap. Both execute simultaneously, so total latency is bounded by the
//! slower lane, not their sum.

use eyre::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;

/// Default concurrency cap for batch queries
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Run `f` over every item with bounded concurrency, preserving input order
///
/// Fail-fast: the first error aborts the batch, dropping in-flight siblings.
pub async fn map_ordered<T, U, F, Fut>(items: Vec<T>, cap: usize, f: F) -> Result<Vec<U>>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<U>>,
{
    stream::iter(items.into_iter().map(f))
        .buffered(cap.max(1))
        .try_collect()
        .await
}

/// Run `f` over every item with bounded concurrency, collecting every
/// per-item result in input order
///
/// Partial-tolerant: one failure never aborts its siblings; callers get
/// successes and failures side by side.
pub async fn map_ordered_settled<T, U, F, Fut>(
    items: Vec<T>,
    cap: usize,
    f: F,
) -> Vec<Result<U>>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<U>>,
{
    stream::iter(items.into_iter().map(f))
        .buffered(cap.max(1))
        .collect()
        .await
}

/// Run a sequential lane and a bounded parallel lane at the same time
///
/// The sequential futures execute strictly one after another; the parallel
/// futures run through the bounded pool. Either lane's first error aborts
/// both.
pub async fn join_lanes<A, B, FutA, FutB>(
    sequential: Vec<FutA>,
    parallel: Vec<FutB>,
    cap: usize,
) -> Result<(Vec<A>, Vec<B>)>
where
    FutA: Future<Output = Result<A>>,
    FutB: Future<Output = Result<B>>,
{
    let sequential_lane = async {
        let mut out = Vec::with_capacity(sequential.len());
        for fut in sequential {
            out.push(fut.await?);
        }
        Ok::<_, eyre::Report>(out)
    };

    let parallel_lane = stream::iter(parallel).buffered(cap.max(1)).try_collect();

    tokio::try_join!(sequential_lane, parallel_lane)
}
