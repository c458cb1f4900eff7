//! Common types for cross-chain transfers
//!
//! Chain identifiers and the universal 32-byte address form shared by every
//! wire format in this crate. Chain-native addresses shorter than 32 bytes
//! (e.g. 20-byte EVM addresses) are left-padded with zeros.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

// ============================================================================
// Chain ID (2 bytes)
// ============================================================================

/// Represents a 2-byte protocol chain ID
///
/// Chains are identified by a u16 assigned in the protocol's chain registry.
/// This is the protocol-level ID, not the chain's native ID (e.g. the EVM
/// chain ID), and it appears big-endian in every wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u16);

impl ChainId {
    /// Create from u16
    pub fn from_u16(id: u16) -> Self {
        ChainId(id)
    }

    /// Convert to u16
    pub fn to_u16(&self) -> u16 {
        self.0
    }

    /// Big-endian wire bytes
    pub fn to_be_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Create from big-endian wire bytes
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        ChainId(u16::from_be_bytes(bytes))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for ChainId {
    fn from(id: u16) -> Self {
        ChainId(id)
    }
}

// ============================================================================
// Universal Address (32 bytes)
// ============================================================================

/// Chain-agnostic 32-byte address
///
/// Addresses from chains with shorter native forms are left-padded with
/// zeros. 32-byte-native addresses (Solana, Sui object IDs) are carried
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UniversalAddress(pub [u8; 32]);

impl UniversalAddress {
    /// Create from raw 32 bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        UniversalAddress(bytes)
    }

    /// Create from a 20-byte EVM address (left-padded with zeros)
    pub fn from_evm_address(addr: &[u8; 20]) -> Self {
        let mut result = [0u8; 32];
        result[12..].copy_from_slice(addr);
        UniversalAddress(result)
    }

    /// Create from hex string (with or without 0x prefix)
    ///
    /// Accepts both 20-byte addresses (40 hex chars, left-padded on decode)
    /// and full 32-byte addresses (64 hex chars).
    pub fn from_hex(hex_str: &str) -> Result<Self, ProtocolError> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)
            .map_err(|e| ProtocolError::parse(format!("invalid hex address: {e}")))?;

        match bytes.len() {
            20 => {
                let mut addr = [0u8; 20];
                addr.copy_from_slice(&bytes);
                Ok(UniversalAddress::from_evm_address(&addr))
            }
            32 => {
                let mut result = [0u8; 32];
                result.copy_from_slice(&bytes);
                Ok(UniversalAddress(result))
            }
            len => Err(ProtocolError::parse(format!(
                "address must be 20 or 32 bytes, got {len}"
            ))),
        }
    }

    /// Convert to hex string with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Extract the trailing 20 bytes as an EVM address
    ///
    /// Fails if any of the 12 leading padding bytes is non-zero.
    pub fn to_evm_address(&self) -> Result<[u8; 20], ProtocolError> {
        if self.0[..12].iter().any(|&b| b != 0) {
            return Err(ProtocolError::parse(
                "address has non-zero padding: not a padded 20-byte address",
            ));
        }
        let mut result = [0u8; 20];
        result.copy_from_slice(&self.0[12..]);
        Ok(result)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// True when every byte is zero
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for UniversalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for UniversalAddress {
    fn from(bytes: [u8; 32]) -> Self {
        UniversalAddress(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_wire_bytes() {
        let id = ChainId::from_u16(2);
        assert_eq!(id.to_be_bytes(), [0, 2]);
        assert_eq!(ChainId::from_be_bytes([0, 2]), id);
    }

    #[test]
    fn test_chain_id_display() {
        assert_eq!(format!("{}", ChainId::from_u16(42)), "42");
    }

    #[test]
    fn test_universal_address_from_evm() {
        let addr: [u8; 20] = [
            0xf3, 0x9f, 0xd6, 0xe5, 0x1a, 0xad, 0x88, 0xf6, 0xf4, 0xce, 0x6a, 0xb8, 0x82, 0x72,
            0x79, 0xcf, 0xff, 0xb9, 0x22, 0x66,
        ];
        let universal = UniversalAddress::from_evm_address(&addr);
        assert_eq!(&universal.0[..12], &[0u8; 12]);
        assert_eq!(universal.to_evm_address().unwrap(), addr);
    }

    #[test]
    fn test_universal_address_from_hex_20_bytes() {
        let addr =
            UniversalAddress::from_hex("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
        assert_eq!(addr.0[12], 0xf3);
        assert!(addr.0[..12].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_universal_address_from_hex_32_bytes() {
        let hex = format!("0x{}", hex::encode([7u8; 32]));
        let addr = UniversalAddress::from_hex(&hex).unwrap();
        assert_eq!(addr.0, [7u8; 32]);
    }

    #[test]
    fn test_universal_address_invalid_length() {
        assert!(UniversalAddress::from_hex("0xdead").is_err());
    }

    #[test]
    fn test_universal_address_non_zero_padding_rejected() {
        let addr = UniversalAddress::from_bytes([1u8; 32]);
        assert!(addr.to_evm_address().is_err());
    }

    #[test]
    fn test_universal_address_hex_roundtrip() {
        let addr = UniversalAddress::from_bytes([0xab; 32]);
        let parsed = UniversalAddress::from_hex(&addr.to_hex()).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_universal_address_is_zero() {
        assert!(UniversalAddress::default().is_zero());
        assert!(!UniversalAddress::from_bytes([1u8; 32]).is_zero());
    }
}
