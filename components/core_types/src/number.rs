//! A thin numeric tower.
//!
//! Integers start out as `i64` and promote to arbitrary precision on
//! overflow; results that fit back into an `i64` are demoted again. Mixed
//! operations coerce both sides to the higher of the two levels
//! (small < big < float < complex).

use std::fmt;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::NumberError;

/// A numeric primitive.
///
/// # Examples
///
/// ```
/// use core_types::{ArithOp, Number};
///
/// let a = Number::Small(i64::MAX);
/// let b = a.apply(ArithOp::Add, &Number::Small(1)).unwrap();
/// assert!(matches!(b, Number::Big(_)));
///
/// let q = Number::Small(7).apply(ArithOp::Div, &Number::Small(2)).unwrap();
/// assert_eq!(q, Number::Float(3.5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    /// Machine-sized integer
    Small(i64),
    /// Arbitrary-precision integer
    Big(BigInt),
    /// Double-precision float
    Float(f64),
    /// Complex number with float parts
    Complex {
        /// Real part
        re: f64,
        /// Imaginary part
        im: f64,
    },
}

/// The `ARITH` operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// 1
    Add,
    /// 2
    Sub,
    /// 3
    Mul,
    /// 4
    Div,
    /// 5
    Mod,
    /// 6
    Pow,
    /// 7
    And,
    /// 8
    Or,
    /// 9
    Xor,
}

impl ArithOp {
    /// Decodes an `ARITH` operand.
    pub fn from_code(code: i64) -> Result<ArithOp, NumberError> {
        Ok(match code {
            1 => ArithOp::Add,
            2 => ArithOp::Sub,
            3 => ArithOp::Mul,
            4 => ArithOp::Div,
            5 => ArithOp::Mod,
            6 => ArithOp::Pow,
            7 => ArithOp::And,
            8 => ArithOp::Or,
            9 => ArithOp::Xor,
            other => return Err(NumberError::UnknownOp(other)),
        })
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::Small(0)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Small(n)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::Float(n)
    }
}

impl From<BigInt> for Number {
    fn from(n: BigInt) -> Self {
        Number::normalize(n)
    }
}

impl Number {
    /// Parses a decimal integer of any size (optional leading sign).
    pub fn parse_integer(text: &str) -> Option<Number> {
        let text = text.trim();
        if let Ok(small) = text.parse::<i64>() {
            return Some(Number::Small(small));
        }
        text.parse::<BigInt>().ok().map(Number::normalize)
    }

    /// Parses a floating-point literal.
    pub fn parse_float(text: &str) -> Option<Number> {
        text.trim().parse::<f64>().ok().map(Number::Float)
    }

    /// Builds a complex number from two float literals.
    pub fn complex(re: &str, im: &str) -> Option<Number> {
        let re = re.trim().parse::<f64>().ok()?;
        let im = im.trim().parse::<f64>().ok()?;
        Some(Number::Complex { re, im })
    }

    /// Returns the value as an `i64` when it is an integer that fits.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Number::Small(n) => Some(*n),
            Number::Big(b) => b.to_i64(),
            _ => None,
        }
    }

    /// Returns `true` for the two integer representations.
    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Small(_) | Number::Big(_))
    }

    /// Returns `true` when the value is numerically zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Number::Small(n) => *n == 0,
            Number::Big(b) => b.is_zero(),
            Number::Float(f) => *f == 0.0,
            Number::Complex { re, im } => *re == 0.0 && *im == 0.0,
        }
    }

    /// Numeric equality across representations.
    pub fn num_eq(&self, other: &Number) -> bool {
        match coerce(self, other) {
            Pair::Small(a, b) => a == b,
            Pair::Big(a, b) => a == b,
            Pair::Float(a, b) => a == b,
            Pair::Complex(a, b) => a == b,
        }
    }

    /// Numeric ordering; complex numbers are unordered.
    pub fn num_lt(&self, other: &Number) -> Result<bool, NumberError> {
        match coerce(self, other) {
            Pair::Small(a, b) => Ok(a < b),
            Pair::Big(a, b) => Ok(a < b),
            Pair::Float(a, b) => Ok(a < b),
            Pair::Complex(..) => Err(NumberError::Unsupported),
        }
    }

    /// Applies `op` with `self` on the left.
    pub fn apply(&self, op: ArithOp, rhs: &Number) -> Result<Number, NumberError> {
        match op {
            ArithOp::Add => Ok(self.add(rhs)),
            ArithOp::Sub => Ok(self.sub(rhs)),
            ArithOp::Mul => Ok(self.mul(rhs)),
            ArithOp::Div => self.div(rhs),
            ArithOp::Mod => self.rem(rhs),
            ArithOp::Pow => self.pow(rhs),
            ArithOp::And | ArithOp::Or | ArithOp::Xor => self.bitwise(op, rhs),
        }
    }

    fn normalize(big: BigInt) -> Number {
        match big.to_i64() {
            Some(n) => Number::Small(n),
            None => Number::Big(big),
        }
    }

    fn add(&self, rhs: &Number) -> Number {
        match coerce(self, rhs) {
            Pair::Small(a, b) => a
                .checked_add(b)
                .map(Number::Small)
                .unwrap_or_else(|| Number::normalize(BigInt::from(a) + b)),
            Pair::Big(a, b) => Number::normalize(a + b),
            Pair::Float(a, b) => Number::Float(a + b),
            Pair::Complex((ar, ai), (br, bi)) => Number::Complex {
                re: ar + br,
                im: ai + bi,
            },
        }
    }

    fn sub(&self, rhs: &Number) -> Number {
        match coerce(self, rhs) {
            Pair::Small(a, b) => a
                .checked_sub(b)
                .map(Number::Small)
                .unwrap_or_else(|| Number::normalize(BigInt::from(a) - b)),
            Pair::Big(a, b) => Number::normalize(a - b),
            Pair::Float(a, b) => Number::Float(a - b),
            Pair::Complex((ar, ai), (br, bi)) => Number::Complex {
                re: ar - br,
                im: ai - bi,
            },
        }
    }

    fn mul(&self, rhs: &Number) -> Number {
        match coerce(self, rhs) {
            Pair::Small(a, b) => a
                .checked_mul(b)
                .map(Number::Small)
                .unwrap_or_else(|| Number::normalize(BigInt::from(a) * b)),
            Pair::Big(a, b) => Number::normalize(a * b),
            Pair::Float(a, b) => Number::Float(a * b),
            Pair::Complex((ar, ai), (br, bi)) => Number::Complex {
                re: ar * br - ai * bi,
                im: ar * bi + ai * br,
            },
        }
    }

    fn div(&self, rhs: &Number) -> Result<Number, NumberError> {
        Ok(match coerce(self, rhs) {
            Pair::Small(a, b) => {
                if b == 0 {
                    return Err(NumberError::DivisionByZero);
                }
                match (a.checked_rem(b), a.checked_div(b)) {
                    (Some(0), Some(q)) => Number::Small(q),
                    (Some(_), _) => Number::Float(a as f64 / b as f64),
                    _ => Number::normalize(BigInt::from(a) / b),
                }
            }
            Pair::Big(a, b) => {
                if b.is_zero() {
                    return Err(NumberError::DivisionByZero);
                }
                if (&a % &b).is_zero() {
                    Number::normalize(a / b)
                } else {
                    Number::Float(big_to_f64(&a) / big_to_f64(&b))
                }
            }
            Pair::Float(a, b) => Number::Float(a / b),
            Pair::Complex((ar, ai), (br, bi)) => {
                let denom = br * br + bi * bi;
                Number::Complex {
                    re: (ar * br + ai * bi) / denom,
                    im: (ai * br - ar * bi) / denom,
                }
            }
        })
    }

    fn rem(&self, rhs: &Number) -> Result<Number, NumberError> {
        match coerce(self, rhs) {
            Pair::Small(a, b) => {
                if b == 0 {
                    return Err(NumberError::DivisionByZero);
                }
                Ok(a.checked_rem(b).map(Number::Small).unwrap_or(Number::Small(0)))
            }
            Pair::Big(a, b) => {
                if b.is_zero() {
                    return Err(NumberError::DivisionByZero);
                }
                Ok(Number::normalize(a % b))
            }
            Pair::Float(a, b) => Ok(Number::Float(a % b)),
            Pair::Complex(..) => Err(NumberError::Unsupported),
        }
    }

    fn pow(&self, rhs: &Number) -> Result<Number, NumberError> {
        match coerce(self, rhs) {
            Pair::Small(a, b) => match u32::try_from(b) {
                Ok(e) => int_pow(BigInt::from(a), e),
                Err(_) if b < 0 => Ok(Number::Float((a as f64).powf(b as f64))),
                Err(_) => Err(NumberError::Unsupported),
            },
            Pair::Big(a, b) => match b.to_u32() {
                Some(e) => int_pow(a, e),
                None => Err(NumberError::Unsupported),
            },
            Pair::Float(a, b) => Ok(Number::Float(a.powf(b))),
            Pair::Complex(..) => Err(NumberError::Unsupported),
        }
    }

    fn bitwise(&self, op: ArithOp, rhs: &Number) -> Result<Number, NumberError> {
        match coerce(self, rhs) {
            Pair::Small(a, b) => Ok(Number::Small(match op {
                ArithOp::And => a & b,
                ArithOp::Or => a | b,
                _ => a ^ b,
            })),
            Pair::Big(a, b) => Ok(Number::normalize(match op {
                ArithOp::And => a & b,
                ArithOp::Or => a | b,
                _ => a ^ b,
            })),
            _ => Err(NumberError::NotIntegral),
        }
    }

    fn level(&self) -> u8 {
        match self {
            Number::Small(_) => 0,
            Number::Big(_) => 1,
            Number::Float(_) => 2,
            Number::Complex { .. } => 3,
        }
    }

    fn to_big(&self) -> BigInt {
        match self {
            Number::Small(n) => BigInt::from(*n),
            Number::Big(b) => b.clone(),
            // Only integers reach level 1.
            _ => BigInt::zero(),
        }
    }

    fn to_f64(&self) -> f64 {
        match self {
            Number::Small(n) => *n as f64,
            Number::Big(b) => big_to_f64(b),
            Number::Float(f) => *f,
            Number::Complex { re, .. } => *re,
        }
    }

    fn to_complex(&self) -> (f64, f64) {
        match self {
            Number::Complex { re, im } => (*re, *im),
            other => (other.to_f64(), 0.0),
        }
    }
}

enum Pair {
    Small(i64, i64),
    Big(BigInt, BigInt),
    Float(f64, f64),
    Complex((f64, f64), (f64, f64)),
}

fn coerce(a: &Number, b: &Number) -> Pair {
    if let (Number::Small(x), Number::Small(y)) = (a, b) {
        return Pair::Small(*x, *y);
    }
    match a.level().max(b.level()) {
        0 | 1 => Pair::Big(a.to_big(), b.to_big()),
        2 => Pair::Float(a.to_f64(), b.to_f64()),
        _ => Pair::Complex(a.to_complex(), b.to_complex()),
    }
}

fn big_to_f64(b: &BigInt) -> f64 {
    b.to_f64().unwrap_or(f64::NAN)
}

fn format_float(f: f64) -> String {
    let mut buffer = ryu::Buffer::new();
    buffer.format(f).to_string()
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Small(n) => write!(f, "{}", n),
            Number::Big(b) => write!(f, "{}", b),
            Number::Float(x) => f.write_str(&format_float(*x)),
            Number::Complex { re, im } => {
                let sign = if im.is_sign_negative() { "-" } else { "+" };
                write!(
                    f,
                    "{}{}{}i",
                    format_float(*re),
                    sign,
                    format_float(im.abs())
                )
            }
        }
    }
}

/// Upper bound on the estimated size of an integer power, in bits.
const MAX_POW_BITS: u64 = 1 << 24;

fn int_pow(base: BigInt, exp: u32) -> Result<Number, NumberError> {
    let bits = base.bits();
    if bits > 1 && bits.saturating_mul(u64::from(exp)) > MAX_POW_BITS {
        return Err(NumberError::TooLarge);
    }
    Ok(Number::normalize(base.pow(exp)))
}
