// 2.0: signed fixed-point. every amount, rate and year fraction is a Real:
// an i128 scaled by 1e18. all ops are checked, nothing wraps.
// 2.1 has mul/div on split magnitudes so intermediates never exceed 128 bits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DECIMALS: u32 = 18;
pub const SCALE: i128 = 1_000_000_000_000_000_000;
const USCALE: u128 = SCALE as u128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("arithmetic overflow in {op}")]
    Overflow { op: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid decimal literal")]
    InvalidLiteral,
}

/// Rounding applied to the digits a multiplication or division drops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundingMode {
    #[default]
    TowardZero,
    /// Nearest, ties away from zero.
    HalfUp,
    Floor,
    Ceiling,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Real(i128);

impl Real {
    pub const ZERO: Real = Real(0);
    pub const ONE: Real = Real(SCALE);
    pub const NEG_ONE: Real = Real(-SCALE);

    /// Wraps an already-scaled integer.
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> i128 {
        self.0
    }

    pub const fn from_int(value: i64) -> Self {
        // |i64| * 1e18 < 1e38 so this always fits
        Self(value as i128 * SCALE)
    }

    /// Basis points, 100 bps = 0.01.
    pub const fn from_bps(bps: i64) -> Self {
        Self(bps as i128 * (SCALE / 10_000))
    }

    pub fn from_ratio(numerator: i64, denominator: i64) -> Result<Self, MathError> {
        Self::from_int(numerator).div(Self::from_int(denominator))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn add(self, other: Real) -> Result<Real, MathError> {
        self.0
            .checked_add(other.0)
            .map(Real)
            .ok_or(MathError::Overflow { op: "add" })
    }

    pub fn sub(self, other: Real) -> Result<Real, MathError> {
        self.0
            .checked_sub(other.0)
            .map(Real)
            .ok_or(MathError::Overflow { op: "sub" })
    }

    pub fn neg(self) -> Result<Real, MathError> {
        self.0
            .checked_neg()
            .map(Real)
            .ok_or(MathError::Overflow { op: "neg" })
    }

    pub fn abs(self) -> Result<Real, MathError> {
        self.0
            .checked_abs()
            .map(Real)
            .ok_or(MathError::Overflow { op: "abs" })
    }

    pub fn min(self, other: Real) -> Real {
        if other.0 < self.0 {
            other
        } else {
            self
        }
    }

    pub fn max(self, other: Real) -> Real {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }

    pub fn mul(self, other: Real) -> Result<Real, MathError> {
        self.mul_rounded(other, RoundingMode::TowardZero)
    }

    pub fn div(self, other: Real) -> Result<Real, MathError> {
        self.div_rounded(other, RoundingMode::TowardZero)
    }

    // 2.1: a*b/S on magnitudes with a = ah*S + al, b = bh*S + bl:
    //   ah*bh*S + ah*bl + al*bh + al*bl/S
    // every partial product is checked, only al*bl/S drops digits.
    pub fn mul_rounded(self, other: Real, mode: RoundingMode) -> Result<Real, MathError> {
        const OP: &str = "mul";
        let overflow = MathError::Overflow { op: OP };
        let negative = (self.0 < 0) != (other.0 < 0);
        let a = self.0.unsigned_abs();
        let b = other.0.unsigned_abs();
        let (ah, al) = (a / USCALE, a % USCALE);
        let (bh, bl) = (b / USCALE, b % USCALE);

        let high = ah
            .checked_mul(bh)
            .and_then(|v| v.checked_mul(USCALE))
            .ok_or(overflow)?;
        let cross_a = ah.checked_mul(bl).ok_or(overflow)?;
        let cross_b = al.checked_mul(bh).ok_or(overflow)?;
        let low = al * bl;

        let whole = high
            .checked_add(cross_a)
            .and_then(|v| v.checked_add(cross_b))
            .and_then(|v| v.checked_add(low / USCALE))
            .ok_or(overflow)?;
        let magnitude = round_magnitude(whole, low % USCALE, USCALE, negative, mode).ok_or(overflow)?;
        to_signed(magnitude, negative, OP)
    }

    // 2.2: a*S/b by long division. the integer quotient is exact, the 18
    // fractional digits come one at a time from the remainder.
    pub fn div_rounded(self, other: Real, mode: RoundingMode) -> Result<Real, MathError> {
        const OP: &str = "div";
        if other.0 == 0 {
            return Err(MathError::DivisionByZero);
        }
        let overflow = MathError::Overflow { op: OP };
        let negative = (self.0 < 0) != (other.0 < 0);
        let a = self.0.unsigned_abs();
        let b = other.0.unsigned_abs();

        let mut remainder = a % b;
        let mut fraction: u128 = 0;
        for _ in 0..DECIMALS {
            let (digit, rest) = match remainder.checked_mul(10) {
                Some(scaled) => (scaled / b, scaled % b),
                None => times_ten_mod(remainder, b),
            };
            fraction = fraction * 10 + digit;
            remainder = rest;
        }

        let whole = (a / b)
            .checked_mul(USCALE)
            .and_then(|v| v.checked_add(fraction))
            .ok_or(overflow)?;
        let magnitude = round_magnitude(whole, remainder, b, negative, mode).ok_or(overflow)?;
        to_signed(magnitude, negative, OP)
    }

    /// Rounds to `dp` decimal places. `dp >= 18` is a no-op.
    pub fn round_dp(self, dp: u32, mode: RoundingMode) -> Result<Real, MathError> {
        if dp >= DECIMALS {
            return Ok(self);
        }
        let overflow = MathError::Overflow { op: "round" };
        let factor = 10u128.pow(DECIMALS - dp);
        let negative = self.0 < 0;
        let magnitude = self.0.unsigned_abs();
        let rounded = round_magnitude(magnitude / factor, magnitude % factor, factor, negative, mode)
            .and_then(|q| q.checked_mul(factor))
            .ok_or(overflow)?;
        to_signed(rounded, negative, "round")
    }

    /// Sums without wrapping. an empty iterator sums to zero.
    pub fn checked_sum<I: IntoIterator<Item = Real>>(values: I) -> Result<Real, MathError> {
        values.into_iter().try_fold(Real::ZERO, |acc, v| acc.add(v))
    }

    pub fn from_decimal(value: Decimal) -> Result<Real, MathError> {
        let overflow = MathError::Overflow { op: "from_decimal" };
        let mantissa = value.mantissa();
        let scale = value.scale();
        if scale <= DECIMALS {
            mantissa
                .checked_mul(10i128.pow(DECIMALS - scale))
                .map(Real)
                .ok_or(overflow)
        } else {
            // rust_decimal scale is at most 28, extra digits truncate
            Ok(Real(mantissa / 10i128.pow(scale - DECIMALS)))
        }
    }

    /// None when the value needs more than the 96 bits a Decimal holds.
    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::try_from_i128_with_scale(self.0, DECIMALS)
            .ok()
            .map(|d| d.normalize())
    }
}

// 10*r divided by b for a remainder r < b too large to multiply directly.
// b <= 2^127 so the running sum of two values below b always fits.
fn times_ten_mod(r: u128, b: u128) -> (u128, u128) {
    let mut digit = 0;
    let mut acc: u128 = 0;
    for _ in 0..10 {
        acc += r;
        if acc >= b {
            acc -= b;
            digit += 1;
        }
    }
    (digit, acc)
}

fn round_magnitude(
    quotient: u128,
    remainder: u128,
    divisor: u128,
    negative: bool,
    mode: RoundingMode,
) -> Option<u128> {
    if remainder == 0 {
        return Some(quotient);
    }
    let bump = match mode {
        RoundingMode::TowardZero => false,
        RoundingMode::HalfUp => remainder >= divisor - remainder,
        RoundingMode::Floor => negative,
        RoundingMode::Ceiling => !negative,
    };
    if bump {
        quotient.checked_add(1)
    } else {
        Some(quotient)
    }
}

fn to_signed(magnitude: u128, negative: bool, op: &'static str) -> Result<Real, MathError> {
    if negative {
        if magnitude == i128::MIN.unsigned_abs() {
            return Ok(Real(i128::MIN));
        }
        i128::try_from(magnitude)
            .map(|v| Real(-v))
            .map_err(|_| MathError::Overflow { op })
    } else {
        i128::try_from(magnitude)
            .map(Real)
            .map_err(|_| MathError::Overflow { op })
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let whole = magnitude / USCALE;
        let fraction = magnitude % USCALE;
        if self.0 < 0 {
            f.write_str("-")?;
        }
        if fraction == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:018}", fraction);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for Real {
    type Err = MathError;

    // parses through Decimal, so at most 28 significant digits
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| MathError::InvalidLiteral)?;
        Real::from_decimal(value)
    }
}
