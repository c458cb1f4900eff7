//! Cross-chain decimal normalization ("trimming")
//!
//! Token amounts travel between chains with differing native precisions, so
//! the wire form carries at most [`TRIMMED_DECIMALS`] decimals. Trimming a
//! higher-precision amount truncates the low-order digits ("dust") with
//! floor division — the dust is permanently dropped, never rounded and never
//! refunded by this layer. Callers that must not strand dust on the source
//! chain should transfer [`remove_dust`] of the requested amount instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Maximum number of decimals representable on the wire.
///
/// This is the canonical protocol value; encodings claiming more are a
/// compatibility bug and are rejected, not replicated.
pub const TRIMMED_DECIMALS: u8 = 8;

/// Packed wire width: decimals(1) ‖ amount(8)
pub const TRIMMED_AMOUNT_BYTES: usize = 9;

/// A token amount normalized to at most [`TRIMMED_DECIMALS`] decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrimmedAmount {
    pub amount: u64,
    pub decimals: u8,
}

impl TrimmedAmount {
    /// Create a trimmed amount, rejecting decimals above the protocol maximum
    pub fn new(amount: u64, decimals: u8) -> Result<Self, ProtocolError> {
        if decimals > TRIMMED_DECIMALS {
            return Err(ProtocolError::precision(format!(
                "trimmed decimals {decimals} exceed maximum {TRIMMED_DECIMALS}"
            )));
        }
        Ok(Self { amount, decimals })
    }

    /// Trim an amount from its source-chain precision to the wire precision
    ///
    /// `decimals = min(from_decimals, TRIMMED_DECIMALS)`. When the source
    /// precision is higher, the amount is floor-divided by the excess power
    /// of ten; the remainder is dropped.
    pub fn trim(amount: u64, from_decimals: u8) -> Self {
        let decimals = from_decimals.min(TRIMMED_DECIMALS);
        let trimmed = scale_down(amount, from_decimals - decimals);
        Self {
            amount: trimmed,
            decimals,
        }
    }

    /// Scale back to a target precision
    ///
    /// Multiplying up is checked; an amount too large for the target
    /// precision surfaces as a `Precision` error rather than wrapping.
    /// Scaling down truncates, same as trimming.
    pub fn scale(&self, to_decimals: u8) -> Result<u64, ProtocolError> {
        if to_decimals == self.decimals {
            return Ok(self.amount);
        }
        if to_decimals > self.decimals {
            let exp = (to_decimals - self.decimals) as u32;
            let scaled = (self.amount as u128)
                .checked_mul(10u128.checked_pow(exp).ok_or_else(overflow)?)
                .ok_or_else(overflow)?;
            return u64::try_from(scaled).map_err(|_| overflow());
        }
        Ok(scale_down(self.amount, self.decimals - to_decimals))
    }

    /// Add another amount with the same precision, saturating at `u64::MAX`
    pub fn saturating_add(&self, other: &TrimmedAmount) -> Result<Self, ProtocolError> {
        if self.decimals != other.decimals {
            return Err(ProtocolError::precision(format!(
                "cannot add amounts with decimals {} and {}",
                self.decimals, other.decimals
            )));
        }
        Ok(Self {
            amount: self.amount.saturating_add(other.amount),
            decimals: self.decimals,
        })
    }

    /// Pack to the 9-byte wire form: decimals(1) ‖ amount(8) big-endian
    pub fn pack(&self) -> [u8; TRIMMED_AMOUNT_BYTES] {
        let mut out = [0u8; TRIMMED_AMOUNT_BYTES];
        out[0] = self.decimals;
        out[1..].copy_from_slice(&self.amount.to_be_bytes());
        out
    }

    /// Unpack from the 9-byte wire form
    pub fn unpack(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != TRIMMED_AMOUNT_BYTES {
            return Err(ProtocolError::parse(format!(
                "trimmed amount must be {TRIMMED_AMOUNT_BYTES} bytes, got {}",
                bytes.len()
            )));
        }
        let mut amount = [0u8; 8];
        amount.copy_from_slice(&bytes[1..]);
        Self::new(u64::from_be_bytes(amount), bytes[0])
    }
}

impl fmt::Display for TrimmedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_units(self.amount, self.decimals))
    }
}

/// Truncate an amount to the representable wire precision and scale it back
/// to the source precision.
///
/// The result is the exact amount the source chain should lock or burn so
/// that no dust is stranded: `remove_dust(x, d) ≤ x`, and the difference is
/// the dust that trimming would have dropped.
pub fn remove_dust(amount: u64, from_decimals: u8) -> u64 {
    // Trimming to ≤ 8 decimals then scaling back up cannot overflow u64.
    TrimmedAmount::trim(amount, from_decimals)
        .scale(from_decimals)
        .unwrap_or(amount)
}

/// Floor-divide by a power of ten, treating out-of-range exponents as
/// dividing by infinity (every u64 fits below 10^20).
fn scale_down(amount: u64, exp: u8) -> u64 {
    match 10u64.checked_pow(exp as u32) {
        Some(divisor) => amount / divisor,
        None => 0,
    }
}

fn overflow() -> ProtocolError {
    ProtocolError::precision("amount overflows target precision")
}

// ============================================================================
// Decimal strings
// ============================================================================

/// Format a raw integer amount as a decimal string with a fixed fractional
/// width (e.g. `1234` at 2 decimals → `"12.34"`)
pub fn format_units(amount: u64, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let width = decimals as usize;
    if decimals as u32 > 19 {
        // The whole part is necessarily zero for any u64 amount.
        return format!("0.{amount:0>width$}");
    }
    let divisor = 10u128.pow(decimals as u32);
    let whole = amount as u128 / divisor;
    let frac = amount as u128 % divisor;
    format!("{whole}.{frac:0width$}")
}

/// Parse a decimal string whose fractional part length must exactly equal
/// `decimals` (e.g. a 2-decimal corridor requires `"12.34"`, not `"12.3"`)
///
/// This is the exact inverse of [`format_units`] for well-formed strings.
pub fn parse_units(s: &str, decimals: u8) -> Result<u64, ProtocolError> {
    if decimals == 0 {
        return parse_digits(s);
    }
    let (whole, frac) = s.split_once('.').ok_or_else(|| {
        ProtocolError::precision(format!("expected a decimal point in {s:?}"))
    })?;
    if frac.len() != decimals as usize {
        return Err(ProtocolError::precision(format!(
            "fractional part of {s:?} must have exactly {decimals} digits, got {}",
            frac.len()
        )));
    }
    let whole = parse_digits(whole)?;
    let frac = parse_digits(frac)?;

    let scale = 10u64
        .checked_pow(decimals as u32)
        .ok_or_else(|| ProtocolError::precision("unsupported decimal width"))?;
    whole
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(overflow)
}

fn parse_digits(s: &str) -> Result<u64, ProtocolError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::precision(format!(
            "{s:?} is not an unsigned decimal number"
        )));
    }
    s.parse::<u64>().map_err(|_| overflow())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_low_precision_unchanged() {
        let trimmed = TrimmedAmount::trim(123_456, 6);
        assert_eq!(trimmed.amount, 123_456);
        assert_eq!(trimmed.decimals, 6);
    }

    #[test]
    fn test_trim_high_precision_truncates() {
        // 1.23 tokens at 18 decimals → 8 decimals keeps 8 fractional digits
        let trimmed = TrimmedAmount::trim(1_230_000_000_000_000_000, 18);
        assert_eq!(trimmed.decimals, 8);
        assert_eq!(trimmed.amount, 123_000_000);
    }

    #[test]
    fn test_trim_drops_dust() {
        // 9 digits of precision beyond the trimmed form: all dropped, no rounding
        let trimmed = TrimmedAmount::trim(1_999_999_999, 17);
        assert_eq!(trimmed.decimals, 8);
        assert_eq!(trimmed.amount, 1);
    }

    #[test]
    fn test_scale_roundtrip_at_or_below_max() {
        for decimals in 0..=TRIMMED_DECIMALS {
            let amount = 987_654_321u64;
            let trimmed = TrimmedAmount::trim(amount, decimals);
            assert_eq!(trimmed.scale(decimals).unwrap(), amount);
        }
    }

    #[test]
    fn test_scale_up_and_down() {
        let trimmed = TrimmedAmount::new(123_45, 2).unwrap();
        assert_eq!(trimmed.scale(2).unwrap(), 123_45);
        assert_eq!(trimmed.scale(4).unwrap(), 123_4500);
        assert_eq!(trimmed.scale(1).unwrap(), 123_4);
    }

    #[test]
    fn test_scale_overflow_is_precision_error() {
        let trimmed = TrimmedAmount::new(u64::MAX, 0).unwrap();
        assert!(matches!(
            trimmed.scale(8),
            Err(ProtocolError::Precision(_))
        ));
    }

    #[test]
    fn test_new_rejects_excess_decimals() {
        assert!(TrimmedAmount::new(1, 9).is_err());
        assert!(TrimmedAmount::new(1, 8).is_ok());
    }

    #[test]
    fn test_remove_dust() {
        // 18-decimal amount with dust in the last 10 digits
        let amount = 1_230_000_001_234_567_890u64;
        let clean = remove_dust(amount, 18);
        assert_eq!(clean, 1_230_000_000_000_000_000);
        assert!(clean <= amount);

        // No dust at or below the wire precision
        assert_eq!(remove_dust(123, 8), 123);
    }

    #[test]
    fn test_pack_unpack() {
        let trimmed = TrimmedAmount::new(0x0102030405060708, 7).unwrap();
        let packed = trimmed.pack();
        assert_eq!(packed[0], 7);
        assert_eq!(TrimmedAmount::unpack(&packed).unwrap(), trimmed);
    }

    #[test]
    fn test_unpack_rejects_legacy_decimals() {
        let mut packed = TrimmedAmount::new(1, 8).unwrap().pack();
        packed[0] = 9;
        assert!(matches!(
            TrimmedAmount::unpack(&packed),
            Err(ProtocolError::Precision(_))
        ));
    }

    #[test]
    fn test_unpack_rejects_bad_length() {
        assert!(TrimmedAmount::unpack(&[0u8; 8]).is_err());
        assert!(TrimmedAmount::unpack(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_saturating_add() {
        let a = TrimmedAmount::new(u64::MAX - 1, 8).unwrap();
        let b = TrimmedAmount::new(5, 8).unwrap();
        assert_eq!(a.saturating_add(&b).unwrap().amount, u64::MAX);

        let c = TrimmedAmount::new(5, 6).unwrap();
        assert!(a.saturating_add(&c).is_err());
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(123_45, 2), "123.45");
        assert_eq!(format_units(5, 2), "0.05");
        assert_eq!(format_units(0, 2), "0.00");
        assert_eq!(format_units(42, 0), "42");
    }

    #[test]
    fn test_parse_units_exact_inverse() {
        for (amount, decimals) in [(123_45u64, 2u8), (5, 2), (0, 2), (42, 0), (1, 8)] {
            let s = format_units(amount, decimals);
            assert_eq!(parse_units(&s, decimals).unwrap(), amount, "via {s:?}");
        }
    }

    #[test]
    fn test_parse_units_requires_exact_fraction_width() {
        assert!(parse_units("12.3", 2).is_err());
        assert!(parse_units("12.345", 2).is_err());
        assert_eq!(parse_units("12.34", 2).unwrap(), 1234);
    }

    #[test]
    fn test_parse_units_rejects_garbage() {
        assert!(parse_units("12,34", 2).is_err());
        assert!(parse_units("-1.00", 2).is_err());
        assert!(parse_units(".12", 2).is_err());
        assert!(parse_units("1.2e3", 2).is_err());
        assert!(parse_units("", 0).is_err());
    }
}
