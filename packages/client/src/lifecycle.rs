//! Transfer lifecycle state machine
//!
//! Sequences the protocol core across a source and a destination chain:
//!
//! 1. `initiate` — trim the amount, build and encode the manager message,
//!    hand it to the source chain adapter
//! 2. `track`/`resume` — wait for the native event, fetch the guardian
//!    attestation, verify quorum
//! 3. `redeem` — consume destination corridor capacity: immediate release
//!    or queue with a computed release time
//! 4. `finalize` — complete a queued release once its time has come
//!
//! Receipts are rebuilt from chain queries plus the attestation on every
//! call — there is no private store of in-flight transfers, so a process
//! restart loses nothing and re-querying is idempotent.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use lattice_protocol::{
    attestation::{GuardianSet, Vaa},
    rate_limit::{ConsumeOutcome, Corridor, Direction},
    types::{ChainId, UniversalAddress},
    wire::{ManagerMessage, Payload},
    TrimmedAmount,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adapter::{ChainAdapter, GuardianClient, TxId};
use crate::error::LifecycleError;
use crate::retry::{with_retry, RetryConfig};

/// Lifecycle states, in forward order
///
/// No state regresses except by re-derivation from a more advanced chain
/// observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferState {
    /// Submitted on the source chain, native event not yet observed
    SourceInitiated,
    /// Native event observed, attestation not yet available
    SourceFinalized,
    /// Attestation fetched and verified against the guardian set
    Attested,
    /// Destination corridor lacked capacity; queued until release time
    DestinationQueued,
    /// Destination capacity consumed, release committed
    Redeemed,
    /// Release complete on the destination chain
    DestinationFinalized,
}

impl TransferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::SourceInitiated => "source_initiated",
            TransferState::SourceFinalized => "source_finalized",
            TransferState::Attested => "attested",
            TransferState::DestinationQueued => "destination_queued",
            TransferState::Redeemed => "redeemed",
            TransferState::DestinationFinalized => "destination_finalized",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Re-derivable snapshot of a transfer's progress
///
/// Every field is recomputable from chain-native queries and the
/// attestation; this struct is never an authoritative store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub state: TransferState,
    pub origin_tx: Option<TxId>,
    pub attestation: Option<Vaa>,
    pub queue_release_time: Option<i64>,
    pub destination_tx: Option<TxId>,
}

impl TransferReceipt {
    fn at_state(state: TransferState, origin_tx: Option<TxId>) -> Self {
        Self {
            state,
            origin_tx,
            attestation: None,
            queue_release_time: None,
            destination_tx: None,
        }
    }
}

/// Caller-supplied parameters for a new transfer
#[derive(Debug, Clone)]
pub struct TransferParams {
    /// Caller-chosen message id, unique per (source chain, manager)
    pub id: [u8; 32],
    /// Originating contract/program, left-padded
    pub sender: UniversalAddress,
    /// Token being transferred, in source-chain form
    pub source_token: UniversalAddress,
    pub recipient: UniversalAddress,
    pub recipient_chain: ChainId,
    /// Raw amount in the source token's native precision
    pub amount: u64,
    /// Opaque extra bytes carried with the transfer
    pub additional_payload: Vec<u8>,
}

/// Drives transfers between one source and one destination chain
pub struct TransferLifecycle {
    source: Arc<dyn ChainAdapter>,
    destination: Arc<dyn ChainAdapter>,
    guardians: Arc<dyn GuardianClient>,
    guardian_sets: Vec<GuardianSet>,
    threshold: usize,
    source_chain: ChainId,
    destination_chain: ChainId,
    retry: RetryConfig,
    poll_interval: Duration,
}

impl TransferLifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn ChainAdapter>,
        destination: Arc<dyn ChainAdapter>,
        guardians: Arc<dyn GuardianClient>,
        guardian_sets: Vec<GuardianSet>,
        threshold: usize,
        source_chain: ChainId,
        destination_chain: ChainId,
    ) -> Self {
        Self {
            source,
            destination,
            guardians,
            guardian_sets,
            threshold,
            source_chain,
            destination_chain,
            retry: RetryConfig::default(),
            poll_interval: Duration::from_secs(2),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The directed corridor this lifecycle operates over
    pub fn corridor(&self) -> Corridor {
        Corridor::new(self.source_chain, self.destination_chain)
    }

    /// Build, encode and submit a transfer message on the source chain
    pub async fn initiate(
        &self,
        params: &TransferParams,
    ) -> Result<TransferReceipt, LifecycleError> {
        let decimals = with_retry(&self.retry, |_| {
            self.source.token_decimals(&params.source_token)
        })
        .await
        .map_err(LifecycleError::adapter)?;

        let amount = TrimmedAmount::trim(params.amount, decimals);
        let message = ManagerMessage {
            id: params.id,
            sender: params.sender,
            payload: Payload::NativeTokenTransfer {
                amount,
                source_token: params.source_token,
                recipient: params.recipient,
                recipient_chain: params.recipient_chain,
                additional_payload: params.additional_payload.clone(),
            },
        };
        let wire = message.encode()?;

        let tx = with_retry(&self.retry, |_| self.source.submit_message(&wire))
            .await
            .map_err(LifecycleError::adapter)?;

        info!(
            tx = %tx,
            amount = %amount,
            recipient_chain = %params.recipient_chain,
            "transfer initiated on source chain"
        );
        Ok(TransferReceipt::at_state(
            TransferState::SourceInitiated,
            Some(tx),
        ))
    }

    /// Re-derive a receipt from wherever on-chain state now stands
    ///
    /// Single-shot: never waits. Verification failures surface as-is — a
    /// sub-quorum attestation is a `Quorum` error, never a partial receipt.
    pub async fn resume(&self, tx: &TxId) -> Result<TransferReceipt, LifecycleError> {
        let event = with_retry(&self.retry, |_| self.source.query_native_event(tx))
            .await
            .map_err(LifecycleError::adapter)?;

        let Some(event) = event else {
            debug!(tx = %tx, "native event not yet observed");
            return Ok(TransferReceipt::at_state(
                TransferState::SourceInitiated,
                Some(tx.clone()),
            ));
        };

        let raw = with_retry(&self.retry, |_| {
            self.guardians.fetch_attestation(
                event.emitter_chain,
                event.emitter_address,
                event.sequence,
            )
        })
        .await
        .map_err(LifecycleError::adapter)?;

        let Some(raw) = raw else {
            debug!(tx = %tx, sequence = event.sequence, "attestation not yet available");
            return Ok(TransferReceipt::at_state(
                TransferState::SourceFinalized,
                Some(tx.clone()),
            ));
        };

        let vaa = Vaa::decode(&raw)?;
        vaa.verify(&self.guardian_sets, self.threshold)?;

        info!(
            tx = %tx,
            sequence = event.sequence,
            guardian_set = vaa.guardian_set_index,
            "attestation verified"
        );
        let mut receipt = TransferReceipt::at_state(TransferState::Attested, Some(tx.clone()));
        receipt.attestation = Some(vaa);
        Ok(receipt)
    }

    /// Poll until the transfer is attested or the deadline passes
    ///
    /// A timeout mutates nothing; call `resume` later to continue.
    pub async fn track(
        &self,
        tx: &TxId,
        timeout: Duration,
    ) -> Result<TransferReceipt, LifecycleError> {
        let poll = async {
            loop {
                let receipt = self.resume(tx).await?;
                if receipt.state == TransferState::Attested {
                    return Ok(receipt);
                }
                debug!(tx = %tx, state = %receipt.state, "not yet attested, polling");
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| LifecycleError::Timeout)?
    }

    /// Process an attested transfer on the destination corridor
    ///
    /// Consumes inbound capacity: immediate release yields `Redeemed`;
    /// insufficient capacity yields `DestinationQueued` with a release time
    /// and commits nothing.
    pub async fn redeem(
        &self,
        receipt: &TransferReceipt,
        now: i64,
    ) -> Result<TransferReceipt, LifecycleError> {
        if receipt.state != TransferState::Attested {
            return Err(LifecycleError::InvalidState {
                operation: "redeem",
                state: receipt.state.as_str(),
            });
        }
        let vaa = receipt.attestation.as_ref().ok_or(LifecycleError::InvalidState {
            operation: "redeem",
            state: "attested without attestation",
        })?;
        let amount = attested_amount(vaa)?;

        let corridor = self.corridor();
        let mut state = with_retry(&self.retry, |_| {
            self.destination
                .query_rate_limit_state(corridor, Direction::Inbound)
        })
        .await
        .map_err(LifecycleError::adapter)?;

        match state.consume(amount, now)? {
            ConsumeOutcome::Released => {
                let tx = with_retry(&self.retry, |_| {
                    self.destination
                        .commit_rate_limit_state(corridor, Direction::Inbound, state)
                })
                .await
                .map_err(LifecycleError::adapter)?;

                info!(amount, tx = %tx, "transfer redeemed on destination chain");
                let mut next = receipt.clone();
                next.state = TransferState::Redeemed;
                next.destination_tx = Some(tx);
                Ok(next)
            }
            ConsumeOutcome::Queued { release_time } => {
                info!(amount, release_time, "destination capacity exhausted, transfer queued");
                let mut next = receipt.clone();
                next.state = TransferState::DestinationQueued;
                next.queue_release_time = Some(release_time);
                Ok(next)
            }
        }
    }

    /// Complete a transfer: immediately for `Redeemed` receipts, or by
    /// performing the deferred capacity commit for queued ones once
    /// `now ≥ queue_release_time`
    pub async fn finalize(
        &self,
        receipt: &TransferReceipt,
        now: i64,
    ) -> Result<TransferReceipt, LifecycleError> {
        match receipt.state {
            TransferState::Redeemed => {
                let mut next = receipt.clone();
                next.state = TransferState::DestinationFinalized;
                Ok(next)
            }
            TransferState::DestinationQueued => {
                let release_time =
                    receipt
                        .queue_release_time
                        .ok_or(LifecycleError::InvalidState {
                            operation: "finalize",
                            state: "queued without release time",
                        })?;
                if now < release_time {
                    return Err(LifecycleError::QueueNotReady { release_time, now });
                }

                let vaa = receipt.attestation.as_ref().ok_or(LifecycleError::InvalidState {
                    operation: "finalize",
                    state: "queued without attestation",
                })?;
                let amount = attested_amount(vaa)?;

                let corridor = self.corridor();
                let mut state = with_retry(&self.retry, |_| {
                    self.destination
                        .query_rate_limit_state(corridor, Direction::Inbound)
                })
                .await
                .map_err(LifecycleError::adapter)?;

                match state.consume(amount, now)? {
                    ConsumeOutcome::Released => {
                        let tx = with_retry(&self.retry, |_| {
                            self.destination
                                .commit_rate_limit_state(corridor, Direction::Inbound, state)
                        })
                        .await
                        .map_err(LifecycleError::adapter)?;

                        info!(amount, tx = %tx, "queued transfer released");
                        let mut next = receipt.clone();
                        next.state = TransferState::DestinationFinalized;
                        next.destination_tx = Some(tx);
                        Ok(next)
                    }
                    ConsumeOutcome::Queued {
                        release_time: pushed_back,
                    } => {
                        // Competing transfers drained the corridor since the
                        // release time was computed; stay queued with the
                        // recomputed time.
                        warn!(
                            amount,
                            release_time = pushed_back,
                            "capacity consumed by competing transfers, release pushed back"
                        );
                        let mut next = receipt.clone();
                        next.queue_release_time = Some(pushed_back);
                        Ok(next)
                    }
                }
            }
            other => Err(LifecycleError::InvalidState {
                operation: "finalize",
                state: other.as_str(),
            }),
        }
    }
}

/// Extract the rate-limited amount from a verified attestation's payload
///
/// Generic messages carry no token value and consume no corridor capacity.
fn attested_amount(vaa: &Vaa) -> Result<u64, LifecycleError> {
    let message = ManagerMessage::decode(&vaa.body.payload)?;
    Ok(match message.payload {
        Payload::NativeTokenTransfer { amount, .. }
        | Payload::MultiTokenTransfer { amount, .. } => amount.amount,
        Payload::GenericMessage { .. } => 0,
    })
}
