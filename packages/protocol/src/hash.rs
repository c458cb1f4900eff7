//! Hash computation for cross-chain message digests
//!
//! All protocol digests are keccak256. The attestation digest is a *double*
//! keccak (`keccak256(keccak256(body))`) — the single hash is a distinct,
//! incompatible value and must never be substituted for it.

use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Compute the double keccak256 hash used for attestation digests
pub fn double_keccak256(data: &[u8]) -> [u8; 32] {
    keccak256(&keccak256(data))
}

/// Convert a 32-byte array to a hex string with 0x prefix
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256() {
        let result = keccak256(b"hello");
        assert_eq!(
            bytes32_to_hex(&result),
            "0x1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
    }

    #[test]
    fn test_double_keccak256_differs_from_single() {
        let single = keccak256(b"body");
        let double = double_keccak256(b"body");
        assert_ne!(single, double);
        assert_eq!(double, keccak256(&single));
    }

    #[test]
    fn test_bytes32_to_hex() {
        let bytes = [0u8; 32];
        let hex = bytes32_to_hex(&bytes);
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 66);
    }
}
