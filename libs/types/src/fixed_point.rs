//! 18-decimal fixed-point arithmetic matching on-chain integer semantics
//!
//! `FixedPoint` stores `round(x * 10^18)` in an `i128` and performs every
//! operation on that scaled integer, never on floating point. Multiplication
//! and division route through 256-bit intermediates so no precision is lost
//! before the final rounding step, and the rounding direction of each
//! operation is explicit at the call site (`mul_down`/`mul_up`,
//! `div_down`/`div_up`). Fractional powers are computed as
//! `exp(y * ln(x))` entirely in the scaled-integer domain, so results are
//! bit-identical across runs and platforms.
//!
//! Values are signed: the share adjustment (zeta) is the one quantity in the
//! data model that is legitimately negative. Everything else is expected to
//! be non-negative and is validated by the layers above.

use crate::errors::FixedPointError;
use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Scale factor for 18 decimal places
const SCALE: i128 = 1_000_000_000_000_000_000;
const SCALE_U: u128 = SCALE as u128;

/// ln(2) in scaled form
const LN_2: i128 = 693_147_180_559_945_309;

/// Below this input `exp` underflows to zero (ln(10^-18))
const EXP_MIN_INPUT: i128 = -41_446_531_673_892_822_313;

/// Above this input `exp` cannot be represented in an i128 scaled value
const EXP_MAX_INPUT: i128 = 46_000_000_000_000_000_000;

/// An 18-decimal fixed-point number backed by a scaled `i128`
///
/// The scaled representation is the wire format used by the chain reader:
/// `FixedPoint::from_scaled(n).to_scaled() == n` for every `n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedPoint(i128);

impl FixedPoint {
    /// Number of decimal places in the scaled representation
    pub const DECIMALS: u32 = 18;

    /// Scale factor (`10^18`)
    pub const SCALE: i128 = SCALE;

    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(SCALE);
    pub const TWO: Self = Self(2 * SCALE);

    /// Wrap a raw scaled integer (the on-chain wire format)
    pub const fn from_scaled(raw: i128) -> Self {
        Self(raw)
    }

    /// Unwrap to the raw scaled integer
    pub const fn to_scaled(self) -> i128 {
        self.0
    }

    /// Whole-number constructor; an `i64` scaled by `10^18` always fits
    pub const fn from_int(n: i64) -> Self {
        Self(n as i128 * SCALE)
    }

    /// Create from a decimal string with exact parsing
    ///
    /// This is the primary constructor for external data (JSON, config,
    /// user input). Parsing goes through `rust_decimal` so the string is
    /// converted exactly, with no float intermediate.
    pub fn from_decimal_str(s: &str) -> Result<Self, FixedPointError> {
        use std::str::FromStr;

        let decimal = Decimal::from_str(s).map_err(|_| FixedPointError::InvalidDecimal {
            input: s.to_string(),
        })?;
        let scaled = decimal
            .checked_mul(Decimal::from(SCALE as i64))
            .ok_or(FixedPointError::Overflow {
                op: "from_decimal_str",
            })?;
        scaled
            .to_i128()
            .map(Self)
            .ok_or(FixedPointError::Overflow {
                op: "from_decimal_str",
            })
    }

    /// Convenience constructor from `f64` with safety checks
    ///
    /// For boundary conversions only (sampled simulation parameters and the
    /// like). Rejects NaN and infinities, rounds to the nearest scaled value.
    pub fn try_from_f64(value: f64) -> Result<Self, FixedPointError> {
        if !value.is_finite() {
            return Err(FixedPointError::NotFinite { value });
        }
        let scaled = value * SCALE as f64;
        if scaled >= i128::MAX as f64 {
            return Err(FixedPointError::Overflow { op: "try_from_f64" });
        }
        if scaled <= i128::MIN as f64 {
            return Err(FixedPointError::Underflow { op: "try_from_f64" });
        }
        Ok(Self(scaled.round() as i128))
    }

    /// Convert to `f64` for display or analytics output
    ///
    /// Never use the result for further financial calculations.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    pub fn max(self, other: Self) -> Self {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    /// Checked addition
    pub fn checked_add(self, rhs: Self) -> Result<Self, FixedPointError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(FixedPointError::Overflow { op: "add" })
    }

    /// Checked subtraction
    pub fn checked_sub(self, rhs: Self) -> Result<Self, FixedPointError> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(FixedPointError::Overflow { op: "sub" })
    }

    /// `a * b / 10^18`, magnitude rounded down (toward zero)
    ///
    /// This is the protocol-favoring direction for amounts credited to a
    /// trader.
    pub fn mul_down(self, rhs: Self) -> Result<Self, FixedPointError> {
        mul_div(self.0, rhs.0, SCALE, false).map(Self)
    }

    /// `a * b / 10^18`, magnitude rounded up
    pub fn mul_up(self, rhs: Self) -> Result<Self, FixedPointError> {
        mul_div(self.0, rhs.0, SCALE, true).map(Self)
    }

    /// `a * 10^18 / b`, magnitude rounded down
    pub fn div_down(self, rhs: Self) -> Result<Self, FixedPointError> {
        mul_div(self.0, SCALE, rhs.0, false).map(Self)
    }

    /// `a * 10^18 / b`, magnitude rounded up
    ///
    /// This is the protocol-favoring direction for amounts owed by a trader.
    pub fn div_up(self, rhs: Self) -> Result<Self, FixedPointError> {
        mul_div(self.0, SCALE, rhs.0, true).map(Self)
    }

    /// Natural logarithm in the scaled-integer domain
    ///
    /// Computes `log2` by binary digit extraction (normalize the argument
    /// into `[1, 2)`, then square-and-compare for each fractional bit) and
    /// rescales by `ln(2)`. Accurate to the last scaled digit.
    pub fn ln(self) -> Result<Self, FixedPointError> {
        if self.0 <= 0 {
            return Err(FixedPointError::NonPositiveLogArgument { value: self.0 });
        }
        let mut z = self.0 as u128;
        let mut integer_bits: i32 = 0;
        while z >= 2 * SCALE_U {
            z >>= 1;
            integer_bits += 1;
        }
        while z < SCALE_U {
            z <<= 1;
            integer_bits -= 1;
        }
        // z is now in [1, 2); extract fractional bits of log2
        let mut log2 = integer_bits as i128 * SCALE;
        let mut bit = SCALE / 2;
        while bit > 0 {
            z = mul_div_u(z, z, SCALE_U, false)?;
            if z >= 2 * SCALE_U {
                z >>= 1;
                log2 += bit;
            }
            bit >>= 1;
        }
        mul_div(log2, LN_2, SCALE, false).map(Self)
    }

    /// Natural exponential in the scaled-integer domain
    ///
    /// Range-reduces the argument to `x = n*ln(2) + r` with `r` in
    /// `[0, ln 2)`, evaluates `e^r` by its Taylor series on scaled integers,
    /// and shifts by `n` binary digits. Inputs below `ln(10^-18)` underflow
    /// to exactly zero; inputs whose result cannot be represented return an
    /// overflow error.
    pub fn exp(self) -> Result<Self, FixedPointError> {
        if self.0 < EXP_MIN_INPUT {
            return Ok(Self::ZERO);
        }
        if self.0 > EXP_MAX_INPUT {
            return Err(FixedPointError::Overflow { op: "exp" });
        }
        let n = self.0.div_euclid(LN_2);
        let r = self.0.rem_euclid(LN_2);

        // e^r = sum r^i / i!, with r < ln(2) the terms vanish quickly
        let mut term = SCALE;
        let mut sum = SCALE;
        let mut i: i128 = 1;
        while term > 0 && i <= 40 {
            term = mul_div(term, r, SCALE * i, false)?;
            sum += term;
            i += 1;
        }

        if n >= 0 {
            if n > 100 {
                return Err(FixedPointError::Overflow { op: "exp" });
            }
            sum.checked_mul(1i128 << n)
                .map(Self)
                .ok_or(FixedPointError::Overflow { op: "exp" })
        } else {
            let shift = -n;
            if shift >= 128 {
                return Ok(Self::ZERO);
            }
            Ok(Self(sum >> shift))
        }
    }

    /// `x^y` for a possibly fractional exponent
    ///
    /// Whole-number exponents (including negative ones) are computed by
    /// square-and-multiply and accept any base. Fractional exponents require
    /// a positive base and are computed as `exp(y * ln(x))`.
    pub fn pow(self, exponent: Self) -> Result<Self, FixedPointError> {
        if exponent.0 == 0 {
            return Ok(Self::ONE);
        }
        if self.0 == 0 {
            return if exponent.0 > 0 {
                Ok(Self::ZERO)
            } else {
                Err(FixedPointError::DivisionByZero)
            };
        }
        if exponent.0 % SCALE == 0 {
            let whole = exponent.0 / SCALE;
            if whole > i64::MAX as i128 || whole < i64::MIN as i128 {
                return Err(FixedPointError::Overflow { op: "pow" });
            }
            return self.pow_int(whole as i64);
        }
        if self.0 <= 0 {
            return Err(FixedPointError::NonPositiveLogArgument { value: self.0 });
        }
        if self.0 == SCALE {
            return Ok(Self::ONE);
        }
        let y_ln_x = mul_div(exponent.0, self.ln()?.0, SCALE, false)?;
        Self(y_ln_x).exp()
    }

    /// `x^n` for a whole-number exponent, by square-and-multiply
    pub fn pow_int(self, n: i64) -> Result<Self, FixedPointError> {
        if n == 0 {
            return Ok(Self::ONE);
        }
        let mut remaining = n.unsigned_abs();
        let mut base = self;
        let mut acc = Self::ONE;
        while remaining > 0 {
            if remaining & 1 == 1 {
                acc = acc.mul_down(base)?;
            }
            remaining >>= 1;
            if remaining > 0 {
                base = base.mul_down(base)?;
            }
        }
        if n < 0 {
            Self::ONE.div_down(acc)
        } else {
            Ok(acc)
        }
    }
}

/// `a * b / denominator` through a 256-bit intermediate, sign-aware,
/// rounding the magnitude down or up as requested
fn mul_div(a: i128, b: i128, denominator: i128, round_up: bool) -> Result<i128, FixedPointError> {
    if denominator == 0 {
        return Err(FixedPointError::DivisionByZero);
    }
    let negative = (a < 0) ^ (b < 0) ^ (denominator < 0);
    let magnitude = mul_div_u(
        a.unsigned_abs(),
        b.unsigned_abs(),
        denominator.unsigned_abs(),
        round_up,
    )?;
    if magnitude > i128::MAX as u128 {
        return Err(FixedPointError::Overflow { op: "mul_div" });
    }
    let magnitude = magnitude as i128;
    Ok(if negative { -magnitude } else { magnitude })
}

fn mul_div_u(a: u128, b: u128, denominator: u128, round_up: bool) -> Result<u128, FixedPointError> {
    if denominator == 0 {
        return Err(FixedPointError::DivisionByZero);
    }
    let product = U256::from(a) * U256::from(b);
    let (quotient, remainder) = product.div_rem(U256::from(denominator));
    let quotient = if round_up && remainder != U256::ZERO {
        quotient + U256::from(1u8)
    } else {
        quotient
    };
    u128::try_from(quotient).map_err(|_| FixedPointError::Overflow { op: "mul_div" })
}

// Panicking arithmetic via traits, for call sites where overflow is
// impossible (constants, tests). Library code propagates checked results.
impl Add for FixedPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for FixedPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for FixedPoint {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

// The wire format is the raw scaled integer. JSON numbers cannot carry a
// full i128, so the integer travels as a decimal string (the same convention
// chain tooling uses for 256-bit quantities); small integer literals are
// accepted on input for convenience.
impl Serialize for FixedPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

struct ScaledVisitor;

impl Visitor<'_> for ScaledVisitor {
    type Value = FixedPoint;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scaled 18-decimal integer as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FixedPoint, E> {
        v.parse::<i128>()
            .map(FixedPoint::from_scaled)
            .map_err(|_| E::custom(format!("invalid scaled integer: {v}")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FixedPoint, E> {
        Ok(FixedPoint::from_scaled(v as i128))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FixedPoint, E> {
        Ok(FixedPoint::from_scaled(v as i128))
    }
}

impl<'de> Deserialize<'de> for FixedPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScaledVisitor)
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(
            f,
            "{}{}.{:018}",
            sign,
            magnitude / SCALE_U,
            magnitude % SCALE_U
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fp(s: &str) -> FixedPoint {
        FixedPoint::from_decimal_str(s).unwrap()
    }

    #[test]
    fn scaled_round_trip() {
        for raw in [0i128, 1, -1, SCALE, -SCALE, 123_456_789_000_000_000_000] {
            assert_eq!(FixedPoint::from_scaled(raw).to_scaled(), raw);
        }
    }

    #[test]
    fn decimal_string_parsing() {
        assert_eq!(fp("1").to_scaled(), SCALE);
        assert_eq!(fp("0.5").to_scaled(), SCALE / 2);
        assert_eq!(fp("-2.25").to_scaled(), -9 * SCALE / 4);
        assert!(FixedPoint::from_decimal_str("not_a_number").is_err());
    }

    #[test]
    fn scaling_matches_rust_decimal() {
        use rust_decimal_macros::dec;
        let scaled = dec!(1.5) * Decimal::from(FixedPoint::SCALE as i64);
        assert_eq!(scaled.to_i128().unwrap(), fp("1.5").to_scaled());
    }

    #[test]
    fn f64_boundary_checks() {
        assert!(FixedPoint::try_from_f64(f64::NAN).is_err());
        assert!(FixedPoint::try_from_f64(f64::INFINITY).is_err());
        let x = FixedPoint::try_from_f64(1.5).unwrap();
        assert_eq!(x, fp("1.5"));
    }

    #[test]
    fn mul_rounding_directions() {
        // 1e-18 * 0.5 rounds to zero downward, to 1e-18 upward
        let tiny = FixedPoint::from_scaled(1);
        let half = fp("0.5");
        assert_eq!(tiny.mul_down(half).unwrap().to_scaled(), 0);
        assert_eq!(tiny.mul_up(half).unwrap().to_scaled(), 1);
    }

    #[test]
    fn div_rounding_directions() {
        let one = FixedPoint::ONE;
        let three = FixedPoint::from_int(3);
        let down = one.div_down(three).unwrap();
        let up = one.div_up(three).unwrap();
        assert_eq!(up.to_scaled() - down.to_scaled(), 1);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(
            FixedPoint::ONE.div_down(FixedPoint::ZERO),
            Err(FixedPointError::DivisionByZero)
        );
    }

    #[test]
    fn ln_of_non_positive_is_an_error() {
        assert!(matches!(
            FixedPoint::ZERO.ln(),
            Err(FixedPointError::NonPositiveLogArgument { .. })
        ));
        assert!(matches!(
            fp("-1").ln(),
            Err(FixedPointError::NonPositiveLogArgument { .. })
        ));
    }

    #[test]
    fn ln_and_exp_reference_values() {
        let e = fp("2.718281828459045235");
        let ln_e = e.ln().unwrap();
        assert!((ln_e - FixedPoint::ONE).abs() < fp("0.000000000001"));

        let exp_one = FixedPoint::ONE.exp().unwrap();
        assert!((exp_one - e).abs() < fp("0.000000000001"));

        assert_eq!(FixedPoint::ZERO.exp().unwrap(), FixedPoint::ONE);
        // deep underflow rounds to exactly zero
        assert_eq!(fp("-50").exp().unwrap(), FixedPoint::ZERO);
    }

    #[test]
    fn pow_reference_values() {
        let four = FixedPoint::from_int(4);
        let sqrt = four.pow(fp("0.5")).unwrap();
        assert!((sqrt - FixedPoint::TWO).abs() < fp("0.000000001"));

        let squared = fp("1.5").pow(FixedPoint::TWO).unwrap();
        assert_eq!(squared, fp("2.25"));

        // negative base is fine for whole exponents, an error for fractional
        let neg = fp("-2");
        assert_eq!(neg.pow(FixedPoint::TWO).unwrap(), FixedPoint::from_int(4));
        assert!(neg.pow(fp("0.5")).is_err());

        let inverse = FixedPoint::TWO.pow(fp("-1")).unwrap();
        assert_eq!(inverse, fp("0.5"));
    }

    #[test]
    fn display_formatting() {
        assert_eq!(fp("1.5").to_string(), "1.500000000000000000");
        assert_eq!(fp("-0.25").to_string(), "-0.250000000000000000");
    }

    #[test]
    fn serde_round_trips_the_scaled_integer() {
        // wider than a u64 on purpose
        let x = FixedPoint::from_scaled(123_456_789_000_000_000_000_000_000_456);
        let json = serde_json::to_string(&x).unwrap();
        assert_eq!(json, format!("\"{}\"", x.to_scaled()));
        let back: FixedPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, x);
        // integer literals are accepted too
        let small: FixedPoint = serde_json::from_str("1500000000000000000").unwrap();
        assert_eq!(small, fp("1.5"));
    }

    proptest! {
        #[test]
        fn prop_scaled_round_trip(raw in any::<i64>()) {
            let raw = raw as i128;
            prop_assert_eq!(FixedPoint::from_scaled(raw).to_scaled(), raw);
        }

        #[test]
        fn prop_mul_down_never_exceeds_mul_up(a in -1_000_000_000i64..1_000_000_000,
                                              b in -1_000_000_000i64..1_000_000_000) {
            let a = FixedPoint::from_scaled(a as i128 * 1_000_000_000);
            let b = FixedPoint::from_scaled(b as i128 * 1_000_000_000);
            let down = a.mul_down(b).unwrap();
            let up = a.mul_up(b).unwrap();
            prop_assert!(down.abs() <= up.abs());
        }

        #[test]
        fn prop_pow_matches_f64(base in 0.01f64..100.0, exponent in 0.05f64..3.0) {
            let x = FixedPoint::try_from_f64(base).unwrap();
            let y = FixedPoint::try_from_f64(exponent).unwrap();
            let got = x.pow(y).unwrap().to_f64();
            let expected = base.powf(exponent);
            prop_assert!((got - expected).abs() <= expected * 1e-9 + 1e-12);
        }
    }
}
