use crate::error::{Error, ErrorCode};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

/// Represents a JSON number as an exact, arbitrary precision decimal.
///
/// The value is `mantissa * 10^exponent`. Trailing zero digits are always
/// folded into the exponent, so two numbers compare equal exactly when they
/// denote the same value.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Number {
    mantissa: BigInt,
    exponent: i64,
}

// Bound on the decimal exponent accepted by the parser. Larger exponents
// could never be materialized as integers anyway.
const MAX_EXPONENT: i64 = i32::MAX as i64;

impl Number {
    /// Builds a number from a sign, a string of ASCII digits and a decimal
    /// exponent, stripping redundant zeros.
    fn from_parts(negative: bool, digits: &str, exponent: i64) -> Number {
        let digits = digits.trim_start_matches('0');
        let significant = digits.trim_end_matches('0');
        if significant.is_empty() {
            return Number::default();
        }
        let exponent = exponent + (digits.len() - significant.len()) as i64;
        let magnitude = BigUint::parse_bytes(significant.as_bytes(), 10).unwrap_or_default();
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Number {
            mantissa: BigInt::from_biguint(sign, magnitude),
            exponent,
        }
    }

    /// The significant digits, with sign.
    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    /// The power of ten applied to the mantissa.
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Returns true if the number is zero.
    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    /// Returns true if the number has no fractional part.
    pub fn is_integer(&self) -> bool {
        self.exponent >= 0 || self.is_zero()
    }

    /// Largest decimal exponent [`to_bigint`](Number::to_bigint) expands.
    /// `1e65536` still fits in about 27 KiB of digits.
    pub const MAX_BIGINT_EXPONENT: i64 = 1 << 16;

    /// Returns the number truncated toward zero, or None if its exponent is
    /// above [`MAX_BIGINT_EXPONENT`](Number::MAX_BIGINT_EXPONENT).
    pub fn to_bigint(&self) -> Option<BigInt> {
        if self.exponent > Self::MAX_BIGINT_EXPONENT {
            return None;
        }
        Some(self.truncate())
    }

    // Callers bound the exponent.
    fn truncate(&self) -> BigInt {
        if self.exponent >= 0 {
            &self.mantissa * BigInt::from(10u8).pow(self.exponent as u32)
        } else {
            let shift = self.exponent.unsigned_abs();
            if shift > self.digits() as u64 {
                return BigInt::zero();
            }
            // Division on BigInt truncates toward zero.
            &self.mantissa / BigInt::from(10u8).pow(shift as u32)
        }
    }

    /// Returns the number truncated toward zero and saturated to the `i128`
    /// range.
    pub fn to_i128_saturating(&self) -> i128 {
        let saturated = if self.mantissa.sign() == Sign::Minus {
            i128::MIN
        } else {
            i128::MAX
        };
        if self.exponent > 40 {
            return saturated;
        }
        self.truncate().to_i128().unwrap_or(saturated)
    }

    /// Returns the number truncated toward zero and saturated to the `u128`
    /// range. Negative numbers saturate to zero.
    pub fn to_u128_saturating(&self) -> u128 {
        if self.mantissa.sign() == Sign::Minus {
            return 0;
        }
        if self.exponent > 40 {
            return u128::MAX;
        }
        self.truncate().to_u128().unwrap_or(u128::MAX)
    }

    /// Returns the number truncated toward zero and saturated to the `i64`
    /// range.
    pub fn to_i64_saturating(&self) -> i64 {
        self.to_i128_saturating()
            .clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// Returns the number truncated toward zero and saturated to the `u64`
    /// range. Negative numbers saturate to zero.
    pub fn to_u64_saturating(&self) -> u64 {
        self.to_u128_saturating().min(u64::MAX as u128) as u64
    }

    /// Returns the nearest `f64`. Values beyond the `f64` range become
    /// infinite.
    pub fn to_f64(&self) -> f64 {
        self.scientific().parse().unwrap_or(f64::NAN)
    }

    /// Returns the nearest `f32`.
    pub fn to_f32(&self) -> f32 {
        self.scientific().parse().unwrap_or(f32::NAN)
    }

    /// Returns the number as i64 if it is an integer within range, or else
    /// None.
    pub fn as_i64(&self) -> Option<i64> {
        if !self.is_integer() || self.exponent > 19 {
            return None;
        }
        self.truncate().to_i64()
    }

    /// Returns the number as u64 if it is an integer within range, or else
    /// None.
    pub fn as_u64(&self) -> Option<u64> {
        if !self.is_integer() || self.exponent > 20 {
            return None;
        }
        self.truncate().to_u64()
    }

    /// Converts a finite f64 to a Number using its shortest round-trip
    /// representation. Infinite or NaN values are not JSON numbers.
    pub fn from_f64(f: f64) -> Option<Number> {
        if !f.is_finite() {
            return None;
        }
        let mut buf = zmij::Buffer::new();
        buf.format(f).parse().ok()
    }

    fn digits(&self) -> usize {
        self.mantissa.magnitude().to_string().len()
    }

    /// `<mantissa>e<exponent>`, understood by the float parsers of std.
    fn scientific(&self) -> String {
        format!("{}e{}", self.mantissa, self.exponent)
    }
}

impl FromStr for Number {
    type Err = Error;

    /// Parses decimal number text: an optional sign, digits with at most one
    /// decimal point and an optional exponent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::data(ErrorCode::InvalidNumberText(s.into()));

        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (significand, exponent) = match rest.find(|c: char| c == 'e' || c == 'E') {
            Some(i) => (&rest[..i], Some(&rest[i + 1..])),
            None => (rest, None),
        };
        let (int, frac) = match significand.find('.') {
            Some(i) => (&significand[..i], &significand[i + 1..]),
            None => (significand, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if int.len() + frac.len() == 0 || !all_digits(int) || !all_digits(frac) {
            return Err(invalid());
        }
        let exponent = match exponent {
            Some(exp) => {
                let unsigned = exp.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(exp);
                if unsigned.is_empty() || !all_digits(unsigned) {
                    return Err(invalid());
                }
                match exp.parse::<i64>() {
                    Ok(exp) if exp.unsigned_abs() <= MAX_EXPONENT as u64 => exp,
                    _ => return Err(invalid()),
                }
            }
            None => 0,
        };

        let mut digits = String::with_capacity(int.len() + frac.len());
        digits.push_str(int);
        digits.push_str(frac);
        Ok(Number::from_parts(negative, &digits, exponent - frac.len() as i64))
    }
}

impl Display for Number {
    /// Writes the shortest exact decimal form. Plain notation is used while
    /// the decimal point stays within 21 digits left or 6 digits right of the
    /// significant digits, scientific notation otherwise.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        if self.mantissa.sign() == Sign::Minus {
            f.write_str("-")?;
        }
        let digits = self.mantissa.magnitude().to_string();
        let k = digits.len() as i64;
        let n = k + self.exponent;
        if k <= n && n <= 21 {
            f.write_str(&digits)?;
            for _ in k..n {
                f.write_str("0")?;
            }
            Ok(())
        } else if 0 < n && n <= 21 {
            let (int, frac) = digits.split_at(n as usize);
            write!(f, "{}.{}", int, frac)
        } else if -6 < n && n <= 0 {
            f.write_str("0.")?;
            for _ in n..0 {
                f.write_str("0")?;
            }
            f.write_str(&digits)
        } else {
            let (first, rest) = digits.split_at(1);
            f.write_str(first)?;
            if !rest.is_empty() {
                write!(f, ".{}", rest)?;
            }
            let exp = n - 1;
            write!(f, "e{}{}", if exp < 0 { '-' } else { '+' }, exp.abs())
        }
    }
}

impl Debug for Number {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "Number({})", self)
    }
}

macro_rules! from_integer {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Number {
                #[inline]
                fn from(i: $ty) -> Self {
                    let mut buf = itoa::Buffer::new();
                    let text = buf.format(i);
                    match text.strip_prefix('-') {
                        Some(digits) => Number::from_parts(true, digits, 0),
                        None => Number::from_parts(false, text, 0),
                    }
                }
            }
        )*
    };
}

from_integer! {
    i8 i16 i32 i64 i128 isize
    u8 u16 u32 u64 u128 usize
}

impl From<BigInt> for Number {
    fn from(i: BigInt) -> Self {
        let negative = i.sign() == Sign::Minus;
        Number::from_parts(negative, &i.magnitude().to_string(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(s: &str) -> Number {
        s.parse().unwrap()
    }

    #[test]
    fn normalization() {
        assert_eq!(num("1.50"), num("15e-1"));
        assert_eq!(num("100"), Number::from(100u8));
        assert_eq!(num("100").exponent(), 2);
        assert_eq!(num("-0.0"), Number::default());
        assert_eq!(num("007"), Number::from(7));
    }

    #[test]
    fn canonical_text() {
        assert_eq!(num("123").to_string(), "123");
        assert_eq!(num("1.5").to_string(), "1.5");
        assert_eq!(num("-0.123e-5").to_string(), "-0.00000123");
        assert_eq!(num("1e20").to_string(), "100000000000000000000");
        assert_eq!(num("1e21").to_string(), "1e+21");
        assert_eq!(num("12.5e-10").to_string(), "1.25e-9");
        assert_eq!(num("0").to_string(), "0");
    }

    #[test]
    fn malformed() {
        for text in ["-", ".", "1e", "1e+", "1.2.3", "--1", "1-2", "e5", "1e5.0"] {
            assert!(text.parse::<Number>().is_err(), "{}", text);
        }
        assert!(".5".parse::<Number>().is_ok());
        assert!("+5".parse::<Number>().is_ok());
    }

    #[test]
    fn truncation() {
        assert_eq!(num("-12.9").to_bigint(), Some(BigInt::from(-12)));
        assert_eq!(num("0.001").to_bigint(), Some(BigInt::zero()));
        assert_eq!(num("1e50").to_i128_saturating(), i128::MAX);
        assert_eq!(num("-1e50").to_i128_saturating(), i128::MIN);
        assert_eq!(num("-3").to_u128_saturating(), 0);
        assert_eq!(num("1e20").to_u64_saturating(), u64::MAX);
        assert_eq!(num("1e19").to_i64_saturating(), i64::MAX);
        assert_eq!(num("-1e19").to_i64_saturating(), i64::MIN);
        assert_eq!(num("-1").to_u64_saturating(), 0);
        assert_eq!(num("42.7").as_i64(), None);
        assert_eq!(num("4.2e1").as_i64(), Some(42));
    }

    #[test]
    fn bigint_exponent_bound() {
        assert!(num("1e65536").to_bigint().is_some());
        assert_eq!(num("1e65537").to_bigint(), None);
        assert_eq!(num("1e2000000000").to_bigint(), None);
        assert_eq!(num("1e2000000000").to_i128_saturating(), i128::MAX);
    }

    #[test]
    fn floats() {
        assert_eq!(num("0.1").to_f64(), 0.1);
        assert_eq!(num("-2.5e-3").to_f32(), -0.0025f32);
        assert_eq!(Number::from_f64(0.1), Some(num("0.1")));
        assert_eq!(Number::from_f64(f64::NAN), None);
    }
}
