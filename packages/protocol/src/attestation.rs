//! Guardian attestation (VAA) parsing and threshold verification
//!
//! An attestation certifies that a specific message was emitted on a
//! specific chain. This module only verifies attestations — it never
//! produces them, and it treats guardian-set membership as an input.
//!
//! # Verification Flow
//!
//! 1. Look up the guardian set referenced by `guardian_set_index`
//! 2. Compute the body digest: `keccak256(keccak256(body))`
//! 3. Recover each signer from `(digest, r, s, recovery_id)` and compare
//!    against the guardian key at the signature's claimed index
//! 4. Require strictly increasing guardian indices (duplicates and
//!    out-of-order entries are malformed, not skipped) and at least
//!    `threshold` valid signatures

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::hash::{double_keccak256, keccak256};
use crate::types::ChainId;
use crate::wire::{Reader, Writer};

/// The only VAA version this implementation understands
pub const VAA_VERSION: u8 = 1;

/// Wire width of a single guardian signature entry
const SIGNATURE_BYTES: usize = 66;

/// Minimum body width: timestamp(4) + nonce(4) + chain(2) + emitter(32) +
/// sequence(8) + consistency(1)
const BODY_HEADER_BYTES: usize = 51;

// ============================================================================
// Guardian sets
// ============================================================================

/// A versioned, indexed list of guardian identities
///
/// Guardian identities are EVM-style addresses: the last 20 bytes of
/// `keccak256` over the uncompressed secp256k1 public key (tag byte dropped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianSet {
    pub index: u32,
    pub keys: Vec<[u8; 20]>,
}

impl GuardianSet {
    pub fn new(index: u32, keys: Vec<[u8; 20]>) -> Self {
        Self { index, keys }
    }

    /// Standard quorum for this set: strictly more than two thirds
    pub fn quorum(&self) -> usize {
        self.keys.len() * 2 / 3 + 1
    }
}

/// Derive the guardian address for a secp256k1 verifying key
pub fn guardian_address(key: &VerifyingKey) -> [u8; 20] {
    let point = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    addr
}

// ============================================================================
// Attestation structure
// ============================================================================

/// One guardian signature inside an attestation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSignature {
    pub guardian_index: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_id: u8,
}

/// The signed body of an attestation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaaBody {
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: ChainId,
    pub emitter_address: [u8; 32],
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: Vec<u8>,
}

impl VaaBody {
    /// Serialize: timestamp(4) ‖ nonce(4) ‖ emitter_chain(2) ‖
    /// emitter_address(32) ‖ sequence(8) ‖ consistency_level(1) ‖ payload
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_u32(self.timestamp);
        w.write_u32(self.nonce);
        w.write_u16(self.emitter_chain.to_u16());
        w.write_bytes(&self.emitter_address);
        w.write_u64(self.sequence);
        w.write_u8(self.consistency_level);
        w.write_bytes(&self.payload);
        w.into_bytes()
    }

    /// The digest guardians sign: a double keccak256 over the body.
    /// The single hash is a different value and is never accepted.
    pub fn digest(&self) -> [u8; 32] {
        double_keccak256(&self.serialize())
    }
}

/// A guardian-signed attestation bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vaa {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<GuardianSignature>,
    pub body: VaaBody,
}

impl Vaa {
    /// Encode the envelope: version(1) ‖ set_index(4) ‖ sig_count(1) ‖
    /// signatures(66 each) ‖ body
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let count = u8::try_from(self.signatures.len()).map_err(|_| {
            ProtocolError::parse(format!(
                "{} signatures exceed the u8 signature count",
                self.signatures.len()
            ))
        })?;

        let mut w = Writer::new();
        w.write_u8(self.version);
        w.write_u32(self.guardian_set_index);
        w.write_u8(count);
        for sig in &self.signatures {
            w.write_u8(sig.guardian_index);
            w.write_bytes(&sig.r);
            w.write_bytes(&sig.s);
            w.write_u8(sig.recovery_id);
        }
        w.write_bytes(&self.body.serialize());
        Ok(w.into_bytes())
    }

    /// Decode a raw attestation
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = Reader::new(bytes);

        let version = r.read_u8()?;
        if version != VAA_VERSION {
            return Err(ProtocolError::parse(format!(
                "unsupported attestation version {version}"
            )));
        }

        let guardian_set_index = r.read_u32()?;
        let sig_count = r.read_u8()? as usize;
        if r.remaining() < sig_count * SIGNATURE_BYTES {
            return Err(ProtocolError::parse(format!(
                "attestation truncated inside signature block: {} signatures claimed, {} bytes left",
                sig_count,
                r.remaining()
            )));
        }

        let mut signatures = Vec::with_capacity(sig_count);
        for _ in 0..sig_count {
            let guardian_index = r.read_u8()?;
            let sig_r = r.read_bytes32()?;
            let sig_s = r.read_bytes32()?;
            let recovery_id = r.read_u8()?;
            if recovery_id > 1 {
                return Err(ProtocolError::parse(format!(
                    "invalid signature recovery id {recovery_id}"
                )));
            }
            signatures.push(GuardianSignature {
                guardian_index,
                r: sig_r,
                s: sig_s,
                recovery_id,
            });
        }

        if r.remaining() < BODY_HEADER_BYTES {
            return Err(ProtocolError::parse(format!(
                "attestation body truncated: {} bytes left, need at least {BODY_HEADER_BYTES}",
                r.remaining()
            )));
        }

        let timestamp = r.read_u32()?;
        let nonce = r.read_u32()?;
        let emitter_chain = ChainId::from_u16(r.read_u16()?);
        let emitter_address = r.read_bytes32()?;
        let sequence = r.read_u64()?;
        let consistency_level = r.read_u8()?;
        let payload = r.take(r.remaining())?.to_vec();

        Ok(Self {
            version,
            guardian_set_index,
            signatures,
            body: VaaBody {
                timestamp,
                nonce,
                emitter_chain,
                emitter_address,
                sequence,
                consistency_level,
                payload,
            },
        })
    }

    /// Verify this attestation against a known guardian set
    ///
    /// Counts only signatures whose guardian index strictly increases and
    /// whose recovered signer matches the key at that index. A signature
    /// that fails recovery or matches the wrong key simply does not count;
    /// index-ordering violations are malformed and fail outright.
    pub fn verify(
        &self,
        guardian_sets: &[GuardianSet],
        threshold: usize,
    ) -> Result<(), ProtocolError> {
        let set = guardian_sets
            .iter()
            .find(|s| s.index == self.guardian_set_index)
            .ok_or(ProtocolError::UnknownGuardianSet(self.guardian_set_index))?;

        let digest = self.body.digest();

        let mut valid = 0usize;
        let mut last_index: Option<u8> = None;
        for sig in &self.signatures {
            if let Some(prev) = last_index {
                if sig.guardian_index <= prev {
                    return Err(ProtocolError::parse(format!(
                        "guardian indices must strictly increase: {} after {prev}",
                        sig.guardian_index
                    )));
                }
            }
            last_index = Some(sig.guardian_index);

            let expected = set.keys.get(sig.guardian_index as usize).ok_or_else(|| {
                ProtocolError::parse(format!(
                    "guardian index {} out of range for set of {}",
                    sig.guardian_index,
                    set.keys.len()
                ))
            })?;

            match recover_signer(&digest, sig) {
                Some(addr) if addr == *expected => valid += 1,
                Some(addr) => {
                    tracing::warn!(
                        guardian_index = sig.guardian_index,
                        recovered = %format!("0x{}", hex::encode(addr)),
                        "signature recovered to a different guardian, not counting"
                    );
                }
                None => {
                    tracing::warn!(
                        guardian_index = sig.guardian_index,
                        "unrecoverable signature, not counting"
                    );
                }
            }
        }

        if valid < threshold {
            return Err(ProtocolError::Quorum { valid, threshold });
        }
        Ok(())
    }
}

/// Recover the guardian address from a signature over `digest`
fn recover_signer(digest: &[u8; 32], sig: &GuardianSignature) -> Option<[u8; 20]> {
    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&sig.r);
    compact[32..].copy_from_slice(&sig.s);

    let signature = Signature::from_slice(&compact).ok()?;
    let recovery_id = RecoveryId::from_byte(sig.recovery_id)?;
    let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id).ok()?;
    Some(guardian_address(&key))
}
