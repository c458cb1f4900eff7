//! Relayer fee quoting and instruction encoding
//!
//! Delivery through a third-party relayer carries an opaque instruction
//! blob alongside the manager message: a count byte followed by
//! `index(1) ‖ len(1) ‖ payload` entries, indices strictly increasing so a
//! relayer can binary-search its own slot. Fee quotes are plain JSON over
//! the relayer's HTTP API; only the request shape lives here, transport is
//! the caller's concern.

use lattice_protocol::{
    error::ProtocolError,
    types::ChainId,
    wire::{Reader, Writer},
};
use serde::{Deserialize, Serialize};

/// A fee quote request for delivering one message over a corridor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuoteRequest {
    pub source_chain: ChainId,
    pub destination_chain: ChainId,
    /// Encoded manager-message length in bytes
    pub payload_size: usize,
    /// Native gas requested on the destination, in its smallest unit
    pub gas_drop_off: u64,
}

impl FeeQuoteRequest {
    /// Render the request body for the relayer quote endpoint
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "sourceChain": self.source_chain.to_u16(),
            "destinationChain": self.destination_chain.to_u16(),
            "payloadSize": self.payload_size,
            "gasDropOff": self.gas_drop_off.to_string(),
        })
    }
}

/// One relayer-specific instruction entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayInstruction {
    pub index: u8,
    pub payload: Vec<u8>,
}

/// Encode relay instructions as `count(1) ‖ [index(1) ‖ len(1) ‖ payload]*`
///
/// Indices must be strictly increasing and each payload at most 255 bytes.
pub fn encode_relay_instructions(
    instructions: &[RelayInstruction],
) -> Result<Vec<u8>, ProtocolError> {
    if instructions.len() > u8::MAX as usize {
        return Err(ProtocolError::parse("too many relay instructions"));
    }

    let mut writer = Writer::new();
    writer.write_u8(instructions.len() as u8);

    let mut previous: Option<u8> = None;
    for instruction in instructions {
        if let Some(prev) = previous {
            if instruction.index <= prev {
                return Err(ProtocolError::parse(
                    "relay instruction indices must be strictly increasing",
                ));
            }
        }
        previous = Some(instruction.index);

        if instruction.payload.len() > u8::MAX as usize {
            return Err(ProtocolError::parse("relay instruction payload too long"));
        }
        writer.write_u8(instruction.index);
        writer.write_u8(instruction.payload.len() as u8);
        writer.write_bytes(&instruction.payload);
    }

    Ok(writer.into_bytes())
}

/// Decode a relay instruction blob, rejecting trailing bytes
pub fn decode_relay_instructions(bytes: &[u8]) -> Result<Vec<RelayInstruction>, ProtocolError> {
    let mut reader = Reader::new(bytes);
    let count = reader.read_u8()?;

    let mut instructions = Vec::with_capacity(count as usize);
    let mut previous: Option<u8> = None;
    for _ in 0..count {
        let index = reader.read_u8()?;
        if let Some(prev) = previous {
            if index <= prev {
                return Err(ProtocolError::parse(
                    "relay instruction indices must be strictly increasing",
                ));
            }
        }
        previous = Some(index);

        let len = reader.read_u8()?;
        let payload = reader.take(len as usize)?.to_vec();
        instructions.push(RelayInstruction { index, payload });
    }
    reader.finish()?;

    Ok(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_quote_request_json_shape() {
        let request = FeeQuoteRequest {
            source_chain: ChainId::from_u16(2),
            destination_chain: ChainId::from_u16(5),
            payload_size: 180,
            gas_drop_off: 250_000,
        };

        let json = request.to_json();
        assert_eq!(json["sourceChain"], 2);
        assert_eq!(json["destinationChain"], 5);
        assert_eq!(json["payloadSize"], 180);
        // Stringified so large values survive JSON number parsers
        assert_eq!(json["gasDropOff"], "250000");
    }

    #[test]
    fn test_instruction_roundtrip() {
        let instructions = vec![
            RelayInstruction {
                index: 1,
                payload: vec![0xaa, 0xbb],
            },
            RelayInstruction {
                index: 4,
                payload: vec![],
            },
            RelayInstruction {
                index: 7,
                payload: vec![0x01; 255],
            },
        ];

        let bytes = encode_relay_instructions(&instructions).unwrap();
        assert_eq!(decode_relay_instructions(&bytes).unwrap(), instructions);
    }

    #[test]
    fn test_empty_blob_roundtrip() {
        let bytes = encode_relay_instructions(&[]).unwrap();
        assert_eq!(bytes, vec![0]);
        assert!(decode_relay_instructions(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_encode_rejects_unordered_indices() {
        let instructions = vec![
            RelayInstruction {
                index: 3,
                payload: vec![],
            },
            RelayInstruction {
                index: 3,
                payload: vec![],
            },
        ];
        assert!(encode_relay_instructions(&instructions).is_err());
    }

    #[test]
    fn test_decode_rejects_unordered_indices() {
        // count=2, entries with indices 5 then 2
        let bytes = vec![2, 5, 0, 2, 0];
        assert!(decode_relay_instructions(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = encode_relay_instructions(&[RelayInstruction {
            index: 0,
            payload: vec![0xff],
        }])
        .unwrap();
        bytes.push(0x00);
        assert!(decode_relay_instructions(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_entry() {
        // count=1, index=0, len=4, but only 2 payload bytes
        let bytes = vec![1, 0, 4, 0xaa, 0xbb];
        assert!(decode_relay_instructions(&bytes).is_err());
    }
}
