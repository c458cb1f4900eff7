//! Binary envelope encode/decode for manager messages
//!
//! Every layout in this module is the binary contract with other
//! implementations of the protocol: deterministic big-endian, fixed field
//! widths, `u16` length prefixes, no padding. Decoding rejects trailing
//! unconsumed bytes and any length-prefix mismatch.
//!
//! Payload families share one tagged enum selected by a 4-byte magic prefix
//! at decode time, so near-duplicate formats cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::amount::TrimmedAmount;
use crate::error::ProtocolError;
use crate::hash::keccak256;
use crate::types::{ChainId, UniversalAddress};

/// Magic prefix for native token transfer payloads ("\x99NTT")
pub const PREFIX_NATIVE_TOKEN_TRANSFER: [u8; 4] = [0x99, 0x4e, 0x54, 0x54];
/// Magic prefix for multi-token transfer payloads ("\x99MTT")
pub const PREFIX_MULTI_TOKEN_TRANSFER: [u8; 4] = [0x99, 0x4d, 0x54, 0x54];
/// Magic prefix for generic message payloads ("\x99GMP")
pub const PREFIX_GENERIC_MESSAGE: [u8; 4] = [0x99, 0x47, 0x4d, 0x50];

// ============================================================================
// Cursor helpers
// ============================================================================

/// Append-only big-endian byte writer shared by all layouts
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a u16 length prefix followed by the bytes
    pub fn write_prefixed(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        let len = u16::try_from(bytes.len()).map_err(|_| {
            ProtocolError::parse(format!(
                "variable field of {} bytes exceeds u16 length prefix",
                bytes.len()
            ))
        })?;
        self.write_u16(len);
        self.write_bytes(bytes);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Big-endian byte reader over a borrowed slice
///
/// Callers must invoke [`Reader::finish`] after decoding; leftover bytes are
/// a parse error, never silently ignored.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::parse(format!(
                "unexpected end of input: wanted {n} bytes, {} left",
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().expect("4 bytes")))
    }

    pub fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        let bytes = self.take(8)?;
        Ok(u64::from_be_bytes(bytes.try_into().expect("8 bytes")))
    }

    pub fn read_bytes32(&mut self) -> Result<[u8; 32], ProtocolError> {
        let bytes = self.take(32)?;
        Ok(bytes.try_into().expect("32 bytes"))
    }

    /// Read a u16 length prefix followed by that many bytes
    pub fn read_prefixed(&mut self) -> Result<&'a [u8], ProtocolError> {
        let len = self.read_u16()? as usize;
        self.take(len)
    }

    /// Assert every input byte was consumed
    pub fn finish(&self) -> Result<(), ProtocolError> {
        if self.remaining() != 0 {
            return Err(ProtocolError::parse(format!(
                "{} trailing bytes after message",
                self.remaining()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Payload variants
// ============================================================================

/// Identity of a token on its home chain (multi-token transfers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenIdentity {
    pub chain: ChainId,
    pub address: UniversalAddress,
}

/// Manager message payload, discriminated by a 4-byte magic prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Transfer of the manager's own token
    NativeTokenTransfer {
        amount: TrimmedAmount,
        source_token: UniversalAddress,
        recipient: UniversalAddress,
        recipient_chain: ChainId,
        additional_payload: Vec<u8>,
    },
    /// Transfer of an arbitrary registered token
    MultiTokenTransfer {
        amount: TrimmedAmount,
        token: TokenIdentity,
        sender: UniversalAddress,
        recipient: UniversalAddress,
    },
    /// Arbitrary cross-chain call data
    GenericMessage {
        to_chain: ChainId,
        callee: UniversalAddress,
        sender: UniversalAddress,
        data: Vec<u8>,
    },
}

impl Payload {
    /// The 4-byte magic prefix for this variant
    pub fn prefix(&self) -> [u8; 4] {
        match self {
            Payload::NativeTokenTransfer { .. } => PREFIX_NATIVE_TOKEN_TRANSFER,
            Payload::MultiTokenTransfer { .. } => PREFIX_MULTI_TOKEN_TRANSFER,
            Payload::GenericMessage { .. } => PREFIX_GENERIC_MESSAGE,
        }
    }

    /// Encode to wire bytes, prefix first
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut w = Writer::new();
        w.write_bytes(&self.prefix());
        match self {
            Payload::NativeTokenTransfer {
                amount,
                source_token,
                recipient,
                recipient_chain,
                additional_payload,
            } => {
                w.write_bytes(&amount.pack());
                w.write_bytes(source_token.as_bytes());
                w.write_bytes(recipient.as_bytes());
                w.write_u16(recipient_chain.to_u16());
                w.write_prefixed(additional_payload)?;
            }
            Payload::MultiTokenTransfer {
                amount,
                token,
                sender,
                recipient,
            } => {
                w.write_bytes(&amount.pack());
                w.write_u16(token.chain.to_u16());
                w.write_bytes(token.address.as_bytes());
                w.write_bytes(sender.as_bytes());
                w.write_bytes(recipient.as_bytes());
            }
            Payload::GenericMessage {
                to_chain,
                callee,
                sender,
                data,
            } => {
                w.write_u16(to_chain.to_u16());
                w.write_bytes(callee.as_bytes());
                w.write_bytes(sender.as_bytes());
                w.write_prefixed(data)?;
            }
        }
        Ok(w.into_bytes())
    }

    /// Decode from wire bytes, dispatching on the magic prefix
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = Reader::new(bytes);
        let payload = Self::read(&mut r)?;
        r.finish()?;
        Ok(payload)
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, ProtocolError> {
        let prefix: [u8; 4] = r.take(4)?.try_into().expect("4 bytes");
        match prefix {
            PREFIX_NATIVE_TOKEN_TRANSFER => {
                let amount = TrimmedAmount::unpack(r.take(9)?)?;
                let source_token = UniversalAddress::from_bytes(r.read_bytes32()?);
                let recipient = UniversalAddress::from_bytes(r.read_bytes32()?);
                let recipient_chain = ChainId::from_u16(r.read_u16()?);
                let additional_payload = r.read_prefixed()?.to_vec();
                Ok(Payload::NativeTokenTransfer {
                    amount,
                    source_token,
                    recipient,
                    recipient_chain,
                    additional_payload,
                })
            }
            PREFIX_MULTI_TOKEN_TRANSFER => {
                let amount = TrimmedAmount::unpack(r.take(9)?)?;
                let token = TokenIdentity {
                    chain: ChainId::from_u16(r.read_u16()?),
                    address: UniversalAddress::from_bytes(r.read_bytes32()?),
                };
                let sender = UniversalAddress::from_bytes(r.read_bytes32()?);
                let recipient = UniversalAddress::from_bytes(r.read_bytes32()?);
                Ok(Payload::MultiTokenTransfer {
                    amount,
                    token,
                    sender,
                    recipient,
                })
            }
            PREFIX_GENERIC_MESSAGE => {
                let to_chain = ChainId::from_u16(r.read_u16()?);
                let callee = UniversalAddress::from_bytes(r.read_bytes32()?);
                let sender = UniversalAddress::from_bytes(r.read_bytes32()?);
                let data = r.read_prefixed()?.to_vec();
                Ok(Payload::GenericMessage {
                    to_chain,
                    callee,
                    sender,
                    data,
                })
            }
            other => Err(ProtocolError::parse(format!(
                "unknown payload prefix 0x{}",
                hex::encode(other)
            ))),
        }
    }
}

// ============================================================================
// Manager message envelope
// ============================================================================

/// Message emitted by a manager contract/program
///
/// `id` is caller-chosen and must be unique per (source chain, manager);
/// `sender` is the left-padded address of the originating contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerMessage {
    pub id: [u8; 32],
    pub sender: UniversalAddress,
    pub payload: Payload,
}

impl ManagerMessage {
    /// Encode the envelope: id(32) ‖ sender(32) ‖ u16 payload_len ‖ payload
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut w = Writer::new();
        w.write_bytes(&self.id);
        w.write_bytes(self.sender.as_bytes());
        w.write_prefixed(&self.payload.encode()?)?;
        Ok(w.into_bytes())
    }

    /// Decode the envelope, rejecting trailing bytes and length mismatches
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = Reader::new(bytes);
        let id = r.read_bytes32()?;
        let sender = UniversalAddress::from_bytes(r.read_bytes32()?);
        let payload = Payload::decode(r.read_prefixed()?)?;
        r.finish()?;
        Ok(Self {
            id,
            sender,
            payload,
        })
    }
}

/// Canonical cross-chain transfer identifier
///
/// `keccak256(chain_id_be(2) ‖ encode(message))` — bit-identical on both
/// ends of the corridor.
pub fn message_digest(chain: ChainId, message: &ManagerMessage) -> Result<[u8; 32], ProtocolError> {
    let mut data = Vec::with_capacity(2 + 64);
    data.extend_from_slice(&chain.to_be_bytes());
    data.extend_from_slice(&message.encode()?);
    Ok(keccak256(&data))
}
