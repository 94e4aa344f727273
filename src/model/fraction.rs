//! Exact rational numbers for term values and weights
//!
//! Stored in reduced form with a positive denominator. Intermediate math is
//! done in `i128`; results that do not fit in `i64` saturate, which always
//! trips the max-integer check before such a value can reach a plate.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Reduced rational number `numerator / denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFraction", into = "RawFraction")]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

#[derive(Serialize, Deserialize)]
struct RawFraction {
    numerator: i64,
    denominator: i64,
}

impl TryFrom<RawFraction> for Fraction {
    type Error = String;

    fn try_from(raw: RawFraction) -> Result<Self, Self::Error> {
        if raw.denominator == 0 {
            return Err("fraction denominator must be non-zero".to_string());
        }
        Ok(Fraction::new(raw.numerator, raw.denominator))
    }
}

impl From<Fraction> for RawFraction {
    fn from(f: Fraction) -> Self {
        RawFraction {
            numerator: f.numerator,
            denominator: f.denominator,
        }
    }
}

impl Fraction {
    pub const ZERO: Self = Self {
        numerator: 0,
        denominator: 1,
    };
    pub const ONE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    /// Build and reduce. A zero denominator is a contract violation.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        assert!(denominator != 0, "fraction denominator must be non-zero");
        Self::from_wide(numerator as i128, denominator as i128)
    }

    pub const fn from_integer(value: i64) -> Self {
        Self {
            numerator: if value == i64::MIN { i64::MIN + 1 } else { value },
            denominator: 1,
        }
    }

    fn from_wide(numerator: i128, denominator: i128) -> Self {
        let (mut n, mut d) = (numerator, denominator);
        if d < 0 {
            n = -n;
            d = -d;
        }
        let g = gcd_i128(n.abs(), d);
        n /= g;
        d /= g;
        Self {
            numerator: saturate(n),
            denominator: saturate(d),
        }
    }

    #[inline]
    pub const fn numerator(self) -> i64 {
        self.numerator
    }

    /// Always > 0
    #[inline]
    pub const fn denominator(self) -> i64 {
        self.denominator
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.numerator == 0
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        self.denominator == 1
    }

    /// -1, 0 or 1
    #[inline]
    pub const fn signum(self) -> i64 {
        self.numerator.signum()
    }

    pub fn abs(self) -> Self {
        Self {
            numerator: self.numerator.saturating_abs(),
            denominator: self.denominator,
        }
    }

    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// True if either part of the reduced fraction is larger than `max`
    pub fn exceeds(self, max: i64) -> bool {
        self.numerator.saturating_abs() > max || self.denominator > max
    }

    /// `None` when dividing by zero
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            None
        } else {
            Some(Self::from_wide(
                self.numerator as i128 * rhs.denominator as i128,
                self.denominator as i128 * rhs.numerator as i128,
            ))
        }
    }
}

fn gcd_i128(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        let rem = a % b;
        a = b;
        b = rem;
    }
    a.max(1)
}

fn saturate(v: i128) -> i64 {
    v.clamp(i64::MIN as i128 + 1, i64::MAX as i128) as i64
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<i64> for Fraction {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl Add for Fraction {
    type Output = Fraction;

    fn add(self, rhs: Self) -> Self {
        Self::from_wide(
            self.numerator as i128 * rhs.denominator as i128
                + rhs.numerator as i128 * self.denominator as i128,
            self.denominator as i128 * rhs.denominator as i128,
        )
    }
}

impl Sub for Fraction {
    type Output = Fraction;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Mul for Fraction {
    type Output = Fraction;

    fn mul(self, rhs: Self) -> Self {
        Self::from_wide(
            self.numerator as i128 * rhs.numerator as i128,
            self.denominator as i128 * rhs.denominator as i128,
        )
    }
}

impl Neg for Fraction {
    type Output = Fraction;

    fn neg(self) -> Self {
        Self {
            numerator: -self.numerator,
            denominator: self.denominator,
        }
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.numerator as i128 * other.denominator as i128;
        let rhs = other.numerator as i128 * self.denominator as i128;
        lhs.cmp(&rhs)
    }
}

impl std::iter::Sum for Fraction {
    fn sum<I: Iterator<Item = Fraction>>(iter: I) -> Self {
        iter.fold(Fraction::ZERO, |acc, f| acc + f)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}
