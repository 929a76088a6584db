//! Decimal values used for numeric series bounds, steps, and spans.
//!
//! Values are stored as a scaled `i128` (value × 10^-scale), the same layout
//! PostgreSQL clients use when binding `numeric` parameters of bounded
//! precision. The helper keeps comparisons exact across differing scales so
//! that `0.50` and `0.5` order and compare as equal.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Maximum precision supported by `DecimalValue` (digits that fit in an `i128`).
pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// Errors that can occur while manipulating decimal values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    /// Requested scale falls outside the supported range.
    ScaleOutOfRange { scale: i8 },
    /// Result exceeded the maximum representable precision.
    PrecisionOverflow { value: i128, scale: i8 },
    /// Arithmetic operation overflowed the `i128` range.
    Overflow,
    /// Text could not be parsed as a plain decimal literal.
    InvalidLiteral(String),
}

impl fmt::Display for DecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecimalError::ScaleOutOfRange { scale } => {
                write!(f, "decimal scale {scale} outside supported range")
            }
            DecimalError::PrecisionOverflow { value, scale } => {
                write!(
                    f,
                    "decimal value {value} with scale {scale} exceeds maximum precision"
                )
            }
            DecimalError::Overflow => write!(f, "decimal arithmetic overflow"),
            DecimalError::InvalidLiteral(text) => write!(f, "invalid decimal literal '{text}'"),
        }
    }
}

impl std::error::Error for DecimalError {}

/// Runtime representation of a fixed-scale decimal value.
///
/// Equality, hashing and ordering are numeric: `0.50` equals `0.5`.
#[derive(Clone, Copy, Debug)]
pub struct DecimalValue {
    value: i128,
    scale: i8,
}

impl DecimalValue {
    /// Create a decimal from its raw parts, validating precision bounds.
    pub fn new(value: i128, scale: i8) -> Result<Self, DecimalError> {
        if !scale_within_bounds(scale) {
            return Err(DecimalError::ScaleOutOfRange { scale });
        }
        if digit_count(value) > MAX_DECIMAL_PRECISION {
            return Err(DecimalError::PrecisionOverflow { value, scale });
        }
        Ok(Self { value, scale })
    }

    /// Construct a decimal from an integer value with zero scale.
    pub fn from_i64(value: i64) -> Self {
        Self {
            value: i128::from(value),
            scale: 0,
        }
    }

    /// Return the scaled integer backing this decimal.
    #[inline]
    pub fn raw_value(self) -> i128 {
        self.value
    }

    /// Return the scale (number of fractional digits).
    #[inline]
    pub fn scale(self) -> i8 {
        self.scale
    }

    /// Return the decimal precision (total digit count).
    #[inline]
    pub fn precision(self) -> u8 {
        digit_count(self.value)
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.value > 0
    }

    /// Re-express the value at a larger scale without changing it.
    pub fn upscale(self, scale: i8) -> Result<Self, DecimalError> {
        if scale < self.scale {
            return Err(DecimalError::ScaleOutOfRange { scale });
        }
        let factor = pow10((scale - self.scale) as u32).ok_or(DecimalError::Overflow)?;
        let value = self
            .value
            .checked_mul(factor)
            .ok_or(DecimalError::Overflow)?;
        Self::new(value, scale)
    }

    /// Add two decimals, producing a result at the larger of the two scales.
    pub fn checked_add(self, other: Self) -> Result<Self, DecimalError> {
        let scale = self.scale.max(other.scale);
        let lhs = self.upscale(scale)?;
        let rhs = other.upscale(scale)?;
        let value = lhs
            .value
            .checked_add(rhs.value)
            .ok_or(DecimalError::Overflow)?;
        Self::new(value, scale)
    }

    /// Convert the decimal into an `f64` (lossy for high precision inputs).
    pub fn to_f64(self) -> f64 {
        if self.value == 0 {
            return 0.0;
        }
        let denominator = 10_f64.powi(self.scale as i32);
        (self.value as f64) / denominator
    }
}

impl From<i64> for DecimalValue {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.value);
        }
        let negative = self.value < 0;
        let digits = self.value.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if negative {
            f.write_str("-")?;
        }
        if digits.len() <= scale {
            f.write_str("0.")?;
            for _ in digits.len()..scale {
                f.write_str("0")?;
            }
            return f.write_str(&digits);
        }
        let split = digits.len() - scale;
        f.write_str(&digits[..split])?;
        f.write_str(".")?;
        f.write_str(&digits[split..])
    }
}

impl FromStr for DecimalValue {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };

        let unsigned_int = int_part.trim_start_matches(['+', '-']);
        let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (unsigned_int.is_empty() && frac_part.is_empty())
            || !digits_only(unsigned_int)
            || !digits_only(frac_part)
            || int_part.len() - unsigned_int.len() > 1
        {
            return Err(DecimalError::InvalidLiteral(s.to_string()));
        }

        let scale = frac_part.len();
        if scale > MAX_DECIMAL_PRECISION as usize {
            return Err(DecimalError::ScaleOutOfRange { scale: scale as i8 });
        }

        let combined = format!("{}{}", int_part, frac_part);
        let value = combined
            .parse::<i128>()
            .map_err(|_| DecimalError::Overflow)?;

        Self::new(value, scale as i8)
    }
}

impl DecimalValue {
    /// Drop trailing fractional zeros: `1.500` becomes `1.5`.
    pub fn normalized(self) -> Self {
        let mut value = self.value;
        let mut scale = self.scale;
        while scale > 0 && value % 10 == 0 {
            value /= 10;
            scale -= 1;
        }
        Self { value, scale }
    }
}

impl PartialEq for DecimalValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DecimalValue {}

impl Hash for DecimalValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let normalized = self.normalized();
        normalized.value.hash(state);
        normalized.scale.hash(state);
    }
}

impl PartialOrd for DecimalValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DecimalValue {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.scale == other.scale {
            return self.value.cmp(&other.value);
        }

        // Compare whole parts first, then fractional remainders brought to a
        // common scale. Remainders stay below 10^38, so the rescale cannot
        // overflow even when the full values would.
        let max_scale = self.scale.max(other.scale);
        let (l_int, l_frac) = split_parts(*self, max_scale);
        let (r_int, r_frac) = split_parts(*other, max_scale);
        l_int.cmp(&r_int).then(l_frac.cmp(&r_frac))
    }
}

fn split_parts(value: DecimalValue, target_scale: i8) -> (i128, i128) {
    let unit = pow10(value.scale as u32).unwrap_or(i128::MAX);
    let whole = value.value.div_euclid(unit);
    let frac = value.value.rem_euclid(unit);
    let lift = pow10((target_scale - value.scale) as u32).unwrap_or(1);
    (whole, frac.saturating_mul(lift))
}

fn pow10(exp: u32) -> Option<i128> {
    10_i128.checked_pow(exp)
}

fn digit_count(value: i128) -> u8 {
    if value == 0 {
        return 1;
    }
    let mut remaining = value.unsigned_abs();
    let mut count: u8 = 0;
    while remaining != 0 {
        remaining /= 10;
        count += 1;
    }
    count
}

fn scale_within_bounds(scale: i8) -> bool {
    (0..=MAX_DECIMAL_PRECISION as i8).contains(&scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(text: &str) -> DecimalValue {
        text.parse().expect("valid decimal")
    }

    #[test]
    fn parses_and_displays_scaled_values() {
        assert_eq!(dec("9.00").to_string(), "9.00");
        assert_eq!(dec("-0.05").to_string(), "-0.05");
        assert_eq!(dec("12").to_string(), "12");
        assert_eq!(dec(".5").to_string(), "0.5");
        assert_eq!(dec("9.00").scale(), 2);
        assert_eq!(dec("9.00").precision(), 3);
    }

    #[test]
    fn rejects_non_decimal_text() {
        assert!("1e5".parse::<DecimalValue>().is_err());
        assert!("".parse::<DecimalValue>().is_err());
        assert!("--1".parse::<DecimalValue>().is_err());
        assert!("1.2.3".parse::<DecimalValue>().is_err());
    }

    #[test]
    fn ordering_ignores_scale() {
        assert_eq!(dec("0.50").cmp(&dec("0.5")), Ordering::Equal);
        assert!(dec("1.01") > dec("1"));
        assert!(dec("-1.5") < dec("-1.25"));
        assert!(dec("-0.1") < dec("0"));
    }

    #[test]
    fn equality_and_hash_agree_with_ordering() {
        use std::collections::HashSet;

        assert_eq!(dec("0.50"), dec("0.5"));
        assert_eq!(dec("-2.000"), dec("-2"));
        assert_ne!(dec("0.05"), dec("0.5"));
        assert_eq!(dec("1.500").normalized().to_string(), "1.5");

        let set: HashSet<DecimalValue> = ["0.50", "0.5", "0.500", "5"].into_iter().map(dec).collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn addition_rescales_to_widest_scale() {
        let sum = dec("0.25").checked_add(dec("1.5")).unwrap();
        assert_eq!(sum.to_string(), "1.75");
        assert_eq!(sum.scale(), 2);
    }
}
