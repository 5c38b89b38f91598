//! Binary rational (dyadic) arithmetic.
//!
//! A dyadic rational is a number of the form `m/2^k`. Dyadics are closed
//! under addition, subtraction and multiplication, which makes them cheap
//! interval endpoints; they are *not* closed under division, so division is
//! approximate, parameterized by a granularity (the result is rounded to a
//! multiple of `1/2^prec`) and a rounding direction.
//!
//! ## References
//!
//! - Z3's `math/realclosure/` support numerals

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::cmp::Ordering;
use std::fmt;

/// Rounding direction for approximate division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round toward negative infinity.
    ToNegInf,
    /// Round toward positive infinity.
    ToPosInf,
}

/// A binary rational `m/2^k`, kept normalized: `m` is odd unless `k` is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dyadic {
    /// Numerator.
    m: BigInt,
    /// Binary exponent; the value is `m / 2^k`.
    k: u32,
}

impl Dyadic {
    /// Create `m/2^k`, normalizing the representation.
    pub fn new(m: BigInt, k: u32) -> Self {
        let mut d = Self { m, k };
        d.normalize();
        d
    }

    /// The dyadic zero.
    pub fn zero() -> Self {
        Self {
            m: BigInt::zero(),
            k: 0,
        }
    }

    /// The dyadic one.
    pub fn one() -> Self {
        Self {
            m: BigInt::one(),
            k: 0,
        }
    }

    /// Create a dyadic from an integer.
    pub fn from_int(n: i64) -> Self {
        Self {
            m: BigInt::from(n),
            k: 0,
        }
    }

    /// `2^e` for a possibly negative exponent.
    pub fn two_pow(e: i32) -> Self {
        if e >= 0 {
            Self {
                m: BigInt::one() << (e as usize),
                k: 0,
            }
        } else {
            Self {
                m: BigInt::one(),
                k: (-e) as u32,
            }
        }
    }

    fn normalize(&mut self) {
        if self.m.is_zero() {
            self.k = 0;
            return;
        }
        while self.k > 0 && self.m.is_even() {
            self.m >>= 1usize;
            self.k -= 1;
        }
    }

    /// True if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.m.is_zero()
    }

    /// True if the value is strictly positive.
    pub fn is_pos(&self) -> bool {
        self.m.is_positive()
    }

    /// True if the value is strictly negative.
    pub fn is_neg(&self) -> bool {
        self.m.is_negative()
    }

    /// True if the value is an integer.
    pub fn is_int(&self) -> bool {
        self.k == 0
    }

    /// Negation.
    pub fn neg(&self) -> Self {
        Self {
            m: -&self.m,
            k: self.k,
        }
    }

    /// Addition (exact).
    pub fn add(&self, other: &Self) -> Self {
        let k = self.k.max(other.k);
        let m = (&self.m << ((k - self.k) as usize)) + (&other.m << ((k - other.k) as usize));
        Self::new(m, k)
    }

    /// Subtraction (exact).
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Multiplication (exact).
    pub fn mul(&self, other: &Self) -> Self {
        Self::new(&self.m * &other.m, self.k + other.k)
    }

    /// Halve the value.
    pub fn div2(&self) -> Self {
        if self.m.is_zero() {
            return Self::zero();
        }
        Self {
            m: self.m.clone(),
            k: self.k + 1,
        }
    }

    /// True if `self < 1/2^k`. Intended for positive interval widths.
    pub fn lt_1div2k(&self, k: u32) -> bool {
        *self < Self::two_pow(-(k as i32))
    }

    /// Upper bound of `log2(self)` for a positive value: the result `u`
    /// satisfies `2^(u-1) <= self < 2^u`.
    pub fn magnitude_ub(&self) -> i32 {
        debug_assert!(self.is_pos());
        (self.m.bits() as i64 - self.k as i64) as i32
    }

    /// Approximate division, rounded in the requested direction to a
    /// multiple of `1/2^prec`. Returns the quotient and whether it is exact.
    /// A positive quotient below the granularity rounds down to zero;
    /// interval endpoints produced this way are marked open by the caller.
    pub fn approx_div(a: &Self, b: &Self, prec: u32, rounding: Rounding) -> (Self, bool) {
        debug_assert!(!b.is_zero());
        // a/b = n/d over the integers, scaled by 2^prec.
        let mut n = &a.m << (b.k as usize + prec as usize);
        let mut d = &b.m << (a.k as usize);
        if d.is_negative() {
            n = -n;
            d = -d;
        }
        let q = match rounding {
            Rounding::ToNegInf => n.div_floor(&d),
            Rounding::ToPosInf => -(-&n).div_floor(&d),
        };
        let exact = (&q * &d) == n;
        (Self::new(q, prec), exact)
    }

    /// Exact conversion from a rational, when the denominator is a power of
    /// two.
    pub fn from_rational(q: &BigRational) -> Option<Self> {
        let d = q.denom();
        let tz = d.trailing_zeros().unwrap_or(0);
        if (d >> (tz as usize)).is_one() {
            Some(Self::new(q.numer().clone(), tz as u32))
        } else {
            None
        }
    }

    /// Convert to an exact rational.
    pub fn to_rational(&self) -> BigRational {
        BigRational::new(self.m.clone(), BigInt::one() << (self.k as usize))
    }

    /// Truncated decimal rendering with at most `prec` fractional digits.
    pub fn display_decimal(&self, prec: u32) -> String {
        let mut out = String::new();
        if self.m.is_negative() {
            out.push('-');
        }
        let abs = self.m.abs();
        let int_part = &abs >> (self.k as usize);
        out.push_str(&int_part.to_string());
        let mut frac = abs - (int_part << (self.k as usize));
        if frac.is_zero() || prec == 0 {
            return out;
        }
        out.push('.');
        for _ in 0..prec {
            if frac.is_zero() {
                break;
            }
            frac *= BigInt::from(10);
            let digit = &frac >> (self.k as usize);
            out.push_str(&digit.to_string());
            frac -= digit << (self.k as usize);
        }
        out
    }
}

/// `floor(q * 2^b)` as an integer.
pub fn floor_scaled(q: &BigRational, b: u32) -> BigInt {
    (q.numer() << (b as usize)).div_floor(q.denom())
}

/// One bisection step on the lower endpoint of `(lower, upper)` toward the
/// rational `q`, assuming `lower < q < upper` and `q` is not dyadic.
pub fn refine_lower(q: &BigRational, lower: &mut Dyadic, upper: &Dyadic) {
    let mid = lower.add(upper).div2();
    if mid.to_rational() < *q {
        *lower = mid;
    }
}

/// One bisection step on the upper endpoint of `(lower, upper)` toward the
/// rational `q`, assuming `lower < q < upper` and `q` is not dyadic.
pub fn refine_upper(q: &BigRational, lower: &Dyadic, upper: &mut Dyadic) {
    let mid = lower.add(upper).div2();
    if mid.to_rational() > *q {
        *upper = mid;
    }
}

impl PartialOrd for Dyadic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dyadic {
    fn cmp(&self, other: &Self) -> Ordering {
        let k = self.k.max(other.k);
        let a = &self.m << ((k - self.k) as usize);
        let b = &other.m << ((k - other.k) as usize);
        a.cmp(&b)
    }
}

impl fmt::Display for Dyadic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.k == 0 {
            write!(f, "{}", self.m)
        } else {
            write!(f, "{}/2^{}", self.m, self.k)
        }
    }
}
