//! Interval arithmetic over dyadic and rational endpoints.
//!
//! Every engine value carries a [`DyadicInterval`] over-approximating its
//! true real value. Addition, subtraction and multiplication of dyadic
//! intervals are exact; only inversion (and hence division) rounds, using
//! approximate dyadic division with directed rounding so the result still
//! contains the exact quotient.

use crate::dyadic::{Dyadic, Rounding};
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use std::fmt;

/// An interval with dyadic endpoints, each of which can be open or closed,
/// and each of which can be infinite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DyadicInterval {
    lower: Dyadic,
    upper: Dyadic,
    lower_open: bool,
    upper_open: bool,
    lower_inf: bool,
    upper_inf: bool,
}

impl DyadicInterval {
    /// The full interval `(-oo, oo)`.
    pub fn full() -> Self {
        Self {
            lower: Dyadic::zero(),
            upper: Dyadic::zero(),
            lower_open: true,
            upper_open: true,
            lower_inf: true,
            upper_inf: true,
        }
    }

    /// The degenerate closed interval `[d, d]`.
    pub fn point(d: Dyadic) -> Self {
        Self {
            lower: d.clone(),
            upper: d,
            lower_open: false,
            upper_open: false,
            lower_inf: false,
            upper_inf: false,
        }
    }

    /// The open interval `(lower, upper)`.
    pub fn open(lower: Dyadic, upper: Dyadic) -> Self {
        debug_assert!(lower < upper);
        Self {
            lower,
            upper,
            lower_open: true,
            upper_open: true,
            lower_inf: false,
            upper_inf: false,
        }
    }

    /// Lower endpoint (meaningless when `lower_is_inf`).
    pub fn lower(&self) -> &Dyadic {
        &self.lower
    }

    /// Upper endpoint (meaningless when `upper_is_inf`).
    pub fn upper(&self) -> &Dyadic {
        &self.upper
    }

    /// True if the lower endpoint is `-oo`.
    pub fn lower_is_inf(&self) -> bool {
        self.lower_inf
    }

    /// True if the upper endpoint is `+oo`.
    pub fn upper_is_inf(&self) -> bool {
        self.upper_inf
    }

    /// True if the lower endpoint is open.
    pub fn lower_is_open(&self) -> bool {
        self.lower_open
    }

    /// True if the upper endpoint is open.
    pub fn upper_is_open(&self) -> bool {
        self.upper_open
    }

    /// Set the lower endpoint to a finite value.
    pub fn set_lower(&mut self, d: Dyadic, open: bool) {
        self.lower = d;
        self.lower_open = open;
        self.lower_inf = false;
    }

    /// Set the upper endpoint to a finite value.
    pub fn set_upper(&mut self, d: Dyadic, open: bool) {
        self.upper = d;
        self.upper_open = open;
        self.upper_inf = false;
    }

    /// Set the lower endpoint to `-oo`.
    pub fn set_lower_inf(&mut self) {
        self.lower = Dyadic::zero();
        self.lower_open = true;
        self.lower_inf = true;
    }

    /// Set the upper endpoint to `+oo`.
    pub fn set_upper_inf(&mut self) {
        self.upper = Dyadic::zero();
        self.upper_open = true;
        self.upper_inf = true;
    }

    /// True if both endpoints are open.
    pub fn is_open(&self) -> bool {
        self.lower_open && self.upper_open
    }

    /// True if the interval contains zero.
    pub fn contains_zero(&self) -> bool {
        let lower_reaches = self.lower_inf
            || self.lower.is_neg()
            || (self.lower.is_zero() && !self.lower_open);
        let upper_reaches = self.upper_inf
            || self.upper.is_pos()
            || (self.upper.is_zero() && !self.upper_open);
        lower_reaches && upper_reaches
    }

    /// True if every element of the interval is strictly positive.
    pub fn is_pos(&self) -> bool {
        !self.lower_inf && (self.lower.is_pos() || (self.lower.is_zero() && self.lower_open))
    }

    /// True if every element of the interval is strictly negative.
    pub fn is_neg(&self) -> bool {
        !self.upper_inf && (self.upper.is_neg() || (self.upper.is_zero() && self.upper_open))
    }

    /// True if `self` lies entirely before `other`.
    pub fn before(&self, other: &Self) -> bool {
        if self.upper_inf || other.lower_inf {
            return false;
        }
        match self.upper.cmp(&other.lower) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Equal => self.upper_open || other.lower_open,
            std::cmp::Ordering::Greater => false,
        }
    }

    /// Magnitude of the interval: `floor(log2(width)) + 1`, `i32::MIN` for a
    /// degenerate interval and `i32::MAX` for an unbounded one. A cheap
    /// precision gauge.
    pub fn magnitude(&self) -> i32 {
        if self.lower_inf || self.upper_inf {
            return i32::MAX;
        }
        let w = self.upper.sub(&self.lower);
        if w.is_zero() {
            i32::MIN
        } else {
            debug_assert!(w.is_pos());
            w.magnitude_ub()
        }
    }

    /// True if the interval is bounded with width below `1/2^k`.
    pub fn check_precision(&self, k: u32) -> bool {
        if self.lower_inf || self.upper_inf {
            return false;
        }
        self.upper.sub(&self.lower).lt_1div2k(k)
    }

    /// Negation: `-[l, u] = [-u, -l]`.
    pub fn neg(&self) -> Self {
        Self {
            lower: self.upper.neg(),
            upper: self.lower.neg(),
            lower_open: self.upper_open,
            upper_open: self.lower_open,
            lower_inf: self.upper_inf,
            upper_inf: self.lower_inf,
        }
    }

    /// Addition (exact).
    pub fn add(&self, other: &Self) -> Self {
        let lower_inf = self.lower_inf || other.lower_inf;
        let upper_inf = self.upper_inf || other.upper_inf;
        Self {
            lower: if lower_inf {
                Dyadic::zero()
            } else {
                self.lower.add(&other.lower)
            },
            upper: if upper_inf {
                Dyadic::zero()
            } else {
                self.upper.add(&other.upper)
            },
            lower_open: lower_inf || self.lower_open || other.lower_open,
            upper_open: upper_inf || self.upper_open || other.upper_open,
            lower_inf,
            upper_inf,
        }
    }

    /// Subtraction (exact).
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Multiplication (exact), by sign-class case analysis. Each selected
    /// endpoint product pairs an infinity only with a non-zero factor, so the
    /// sign of an infinite bound is determined by its slot.
    pub fn mul(&self, other: &Self) -> Self {
        use Class::{M, N, P};
        let (a, b) = (self, other);
        match (a.class(), b.class()) {
            (P, P) => mk(fin_mul(a.lo(), b.lo()), inf_mul(a.hi(), b.hi())),
            (P, N) => mk(inf_mul(a.hi(), b.lo()), fin_mul(a.lo(), b.hi())),
            (P, M) => mk(inf_mul(a.hi(), b.lo()), inf_mul(a.hi(), b.hi())),
            (N, P) => mk(inf_mul(a.lo(), b.hi()), fin_mul(a.hi(), b.lo())),
            (N, N) => mk(fin_mul(a.hi(), b.hi()), inf_mul(a.lo(), b.lo())),
            (N, M) => mk(inf_mul(a.lo(), b.hi()), inf_mul(a.lo(), b.lo())),
            (M, P) => mk(inf_mul(a.lo(), b.hi()), inf_mul(a.hi(), b.hi())),
            (M, N) => mk(inf_mul(a.hi(), b.lo()), inf_mul(a.lo(), b.lo())),
            (M, M) => mk(
                min_bound(inf_mul(a.lo(), b.hi()), inf_mul(a.hi(), b.lo())),
                max_bound(inf_mul(a.lo(), b.lo()), inf_mul(a.hi(), b.hi())),
            ),
        }
    }

    /// Inversion at the given division granularity.
    pub fn inv(&self, prec: u32) -> Self {
        Self::point(Dyadic::one()).div(self, prec)
    }

    /// Division at the given granularity: each result endpoint is one
    /// directed approximate division, so the rounding error stays within two
    /// granularity steps regardless of the operand magnitudes. The divisor
    /// must not contain zero; a zero-containing divisor yields the full
    /// interval, which callers treat as "refine more".
    pub fn div(&self, other: &Self, prec: u32) -> Self {
        if other.contains_zero() {
            return Self::full();
        }
        if other.is_neg() {
            // a/b = (-a)/(-b) with a strictly positive divisor.
            return self.neg().div(&other.neg(), prec);
        }
        let mut r = Self::full();
        // Lower bound of the quotient.
        if self.lower_inf {
            // Stays -oo.
        } else if !self.lower.is_neg() {
            // a >= 0: a/d, which tends to zero for an unbounded divisor.
            if other.upper_inf {
                r.set_lower(Dyadic::zero(), !self.lower.is_zero() || self.lower_open);
            } else {
                let (v, exact) =
                    Dyadic::approx_div(&self.lower, &other.upper, prec, Rounding::ToNegInf);
                r.set_lower(v, self.lower_open || other.upper_open || !exact);
            }
        } else {
            // a < 0: a/c; c may be an open zero, giving -oo.
            if !other.lower.is_zero() {
                let (v, exact) =
                    Dyadic::approx_div(&self.lower, &other.lower, prec, Rounding::ToNegInf);
                r.set_lower(v, self.lower_open || other.lower_open || !exact);
            }
        }
        // Upper bound of the quotient.
        if self.upper_inf {
            // Stays +oo.
        } else if self.upper.is_pos() {
            // b > 0: b/c; c may be an open zero, giving +oo.
            if !other.lower.is_zero() {
                let (v, exact) =
                    Dyadic::approx_div(&self.upper, &other.lower, prec, Rounding::ToPosInf);
                r.set_upper(v, self.upper_open || other.lower_open || !exact);
            }
        } else {
            // b <= 0: b/d, which tends to zero for an unbounded divisor.
            if other.upper_inf {
                r.set_upper(Dyadic::zero(), !self.upper.is_zero() || self.upper_open);
            } else {
                let (v, exact) =
                    Dyadic::approx_div(&self.upper, &other.upper, prec, Rounding::ToPosInf);
                r.set_upper(v, self.upper_open || other.upper_open || !exact);
            }
        }
        r
    }

    fn class(&self) -> Class {
        if !self.lower_inf && !self.lower.is_neg() {
            Class::P
        } else if !self.upper_inf && !self.upper.is_pos() {
            Class::N
        } else {
            Class::M
        }
    }

    fn lo(&self) -> Endpoint<'_> {
        Endpoint {
            value: &self.lower,
            open: self.lower_open,
            inf: self.lower_inf,
        }
    }

    fn hi(&self) -> Endpoint<'_> {
        Endpoint {
            value: &self.upper,
            open: self.upper_open,
            inf: self.upper_inf,
        }
    }
}

/// Sign class of an interval: entirely non-negative, entirely non-positive,
/// or mixed/unbounded.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Class {
    P,
    N,
    M,
}

/// A computed bound: a finite value with an open flag, or an infinity.
struct Bound {
    value: Dyadic,
    open: bool,
    inf: bool,
}

struct Endpoint<'a> {
    value: &'a Dyadic,
    open: bool,
    inf: bool,
}

/// Product of two finite endpoints. A closed zero absorbs openness.
fn fin_mul(x: Endpoint<'_>, y: Endpoint<'_>) -> Bound {
    debug_assert!(!x.inf && !y.inf);
    let open = (x.open || y.open)
        && !(x.value.is_zero() && !x.open)
        && !(y.value.is_zero() && !y.open);
    Bound {
        value: x.value.mul(y.value),
        open,
        inf: false,
    }
}

/// Product of two endpoints where either may be infinite; an infinite factor
/// forces an infinite bound.
fn inf_mul(x: Endpoint<'_>, y: Endpoint<'_>) -> Bound {
    if x.inf || y.inf {
        Bound {
            value: Dyadic::zero(),
            open: true,
            inf: true,
        }
    } else {
        fin_mul(x, y)
    }
}

fn min_bound(a: Bound, b: Bound) -> Bound {
    if a.inf {
        return a;
    }
    if b.inf {
        return b;
    }
    match a.value.cmp(&b.value) {
        std::cmp::Ordering::Less => a,
        std::cmp::Ordering::Greater => b,
        std::cmp::Ordering::Equal => Bound {
            open: a.open && b.open,
            ..a
        },
    }
}

fn max_bound(a: Bound, b: Bound) -> Bound {
    if a.inf {
        return a;
    }
    if b.inf {
        return b;
    }
    match a.value.cmp(&b.value) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        std::cmp::Ordering::Equal => Bound {
            open: a.open && b.open,
            ..a
        },
    }
}

fn mk(lower: Bound, upper: Bound) -> DyadicInterval {
    let mut r = DyadicInterval::full();
    if !lower.inf {
        r.set_lower(lower.value, lower.open);
    }
    if !upper.inf {
        r.set_upper(upper.value, upper.open);
    }
    r
}

impl fmt::Display for DyadicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lower_inf {
            write!(f, "(-oo, ")?;
        } else {
            let b = if self.lower_open { '(' } else { '[' };
            write!(f, "{}{}, ", b, self.lower)?;
        }
        if self.upper_inf {
            write!(f, "oo)")
        } else {
            let b = if self.upper_open { ')' } else { ']' };
            write!(f, "{}{}", self.upper, b)
        }
    }
}

/// A closed interval with rational endpoints, filled in by transcendental
/// producers.
#[derive(Debug, Clone)]
pub struct RatInterval {
    /// Lower endpoint.
    pub lower: BigRational,
    /// Upper endpoint.
    pub upper: BigRational,
}

impl Default for RatInterval {
    fn default() -> Self {
        Self {
            lower: BigRational::zero(),
            upper: BigRational::zero(),
        }
    }
}

impl RatInterval {
    /// Magnitude of the interval width, as `floor(log2(width)) + 1`-style
    /// upper bound; `i32::MIN` for a degenerate interval.
    pub fn magnitude(&self) -> i32 {
        let w = &self.upper - &self.lower;
        if w.is_zero() {
            return i32::MIN;
        }
        debug_assert!(w.is_positive());
        (w.numer().bits() as i64 - w.denom().bits() as i64 + 1) as i32
    }
}
