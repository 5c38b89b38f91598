//! Value representation.
//!
//! A value is either an arbitrary-precision rational or a rational function
//! over a field extension, with coefficients that are themselves values of
//! strictly lower rank. Zero is represented uniformly as `None`, so every
//! stored value is non-zero. Values are shared through `Rc`; the rank
//! invariant makes reference cycles impossible.

use crate::extension::{ExtCell, ExtKind};
use crate::interval::DyadicInterval;
use num_rational::BigRational;
use num_traits::{One, Signed};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

/// A shared, possibly-zero value. `None` is the zero value.
pub(crate) type Val = Option<Rc<ValueCell>>;

/// A polynomial as a coefficient sequence `c0, c1, ..., cn` with `cn`
/// non-zero when the sequence is non-empty; the empty sequence is the zero
/// polynomial. Interior zero coefficients are `None`.
pub(crate) type Poly = SmallVec<[Val; 8]>;

/// A non-zero value with its interval approximation.
pub(crate) struct ValueCell {
    /// Dyadic enclosure of the value. For rationals this is computed lazily;
    /// until then it is the full interval.
    pub(crate) interval: RefCell<DyadicInterval>,
    /// Interval saved before a precision-hungry refinement, restored when the
    /// enclosing public operation finishes.
    pub(crate) saved_interval: RefCell<Option<DyadicInterval>>,
    pub(crate) kind: ValueKind,
}

pub(crate) enum ValueKind {
    Rational(BigRational),
    RationalFunction(RatFun),
}

/// A rational function `num(x)/den(x)` in the extension element `ext`.
pub(crate) struct RatFun {
    pub(crate) ext: Rc<ExtCell>,
    pub(crate) num: Poly,
    pub(crate) den: Poly,
    /// True if the value does not depend on any infinitesimal extension.
    pub(crate) real: bool,
}

impl ValueCell {
    pub(crate) fn new_rational(q: BigRational) -> Self {
        Self {
            interval: RefCell::new(DyadicInterval::full()),
            saved_interval: RefCell::new(None),
            kind: ValueKind::Rational(q),
        }
    }

    pub(crate) fn as_rational(&self) -> Option<&BigRational> {
        match &self.kind {
            ValueKind::Rational(q) => Some(q),
            ValueKind::RationalFunction(_) => None,
        }
    }

    pub(crate) fn as_rat_fun(&self) -> Option<&RatFun> {
        match &self.kind {
            ValueKind::Rational(_) => None,
            ValueKind::RationalFunction(rf) => Some(rf),
        }
    }
}

/// True if `v` is the zero value.
pub(crate) fn is_zero(v: &Val) -> bool {
    v.is_none()
}

/// True if `v` is a non-zero rational.
pub(crate) fn is_nz_rational(v: &Val) -> bool {
    v.as_ref().is_some_and(|c| c.as_rational().is_some())
}

/// True if `v` is represented as the rational one. This checks the
/// representation, not semantic equality to one.
pub(crate) fn is_rational_one(v: &Val) -> bool {
    v.as_ref()
        .and_then(|c| c.as_rational())
        .is_some_and(|q| q.is_one())
}

/// True if `v` is represented as the rational minus one.
pub(crate) fn is_rational_minus_one(v: &Val) -> bool {
    v.as_ref()
        .and_then(|c| c.as_rational())
        .is_some_and(|q| (-q).is_one())
}

/// True if `p` is the constant polynomial `[1]`.
pub(crate) fn is_one_poly(p: &[Val]) -> bool {
    p.len() == 1 && is_rational_one(&p[0])
}

/// Rank of a value: rationals (and zero) rank below every rational function;
/// rational functions compare by extension rank.
pub(crate) fn rank(v: &Val) -> Option<(ExtKind, u32)> {
    v.as_ref()
        .and_then(|c| c.as_rat_fun())
        .map(|rf| rf.ext.rank())
}

/// Three-way rank comparison of two non-zero values.
pub(crate) fn compare_rank(a: &Rc<ValueCell>, b: &Rc<ValueCell>) -> i32 {
    match (a.as_rat_fun(), b.as_rat_fun()) {
        (None, None) => 0,
        (None, Some(_)) => -1,
        (Some(_), None) => 1,
        (Some(ra), Some(rb)) => match ra.ext.rank().cmp(&rb.ext.rank()) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        },
    }
}

/// Sign of a value, read from its representation. For rational functions the
/// stored interval excludes zero by construction.
pub(crate) fn sign(v: &Val) -> i32 {
    match v {
        None => 0,
        Some(c) => match &c.kind {
            ValueKind::Rational(q) => {
                if q.is_positive() {
                    1
                } else {
                    -1
                }
            }
            ValueKind::RationalFunction(_) => {
                let i = c.interval.borrow();
                debug_assert!(!i.contains_zero());
                if i.is_pos() {
                    1
                } else {
                    -1
                }
            }
        },
    }
}

/// True if `v` is definitely real (does not depend on an infinitesimal).
pub(crate) fn is_real(v: &Val) -> bool {
    match v {
        None => true,
        Some(c) => match &c.kind {
            ValueKind::Rational(_) => true,
            ValueKind::RationalFunction(rf) => rf.real,
        },
    }
}

/// True if every coefficient of `p` is real.
pub(crate) fn is_real_poly(p: &[Val]) -> bool {
    p.iter().all(is_real)
}

/// Index of the first non-zero coefficient of a non-zero polynomial.
pub(crate) fn first_non_zero(p: &[Val]) -> Option<usize> {
    p.iter().position(|c| c.is_some())
}
