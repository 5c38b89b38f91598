//! Arithmetic orchestration over values.
//!
//! Binary operations dispatch on representation: rational pairs delegate to
//! exact rational arithmetic, everything else compares extension ranks and
//! operates on the rational-function layer of the higher-rank operand. New
//! rational-function values get an interval lifted from the operands and go
//! through sign determination before they are returned.

use crate::error::{RcfError, Result};
use crate::extension::ExtCell;
use crate::interval::DyadicInterval;
use crate::value::{
    compare_rank, is_one_poly, is_rational_minus_one, is_rational_one, is_real_poly, Poly, RatFun,
    Val, ValueCell, ValueKind,
};
use crate::manager::RcfManager;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use smallvec::smallvec;
use std::cell::RefCell;
use std::rc::Rc;

impl RcfManager {
    /// Wrap a non-zero rational as a value. The dyadic interval is computed
    /// lazily on first use.
    pub(crate) fn mk_rational_value(&self, q: BigRational) -> Val {
        debug_assert!(!q.is_zero());
        Some(Rc::new(ValueCell::new_rational(q)))
    }

    /// Integer convenience constructor; zero maps to the zero value.
    pub(crate) fn mk_int_value(&self, n: i64) -> Val {
        if n == 0 {
            None
        } else {
            self.mk_rational_value(BigRational::from_integer(BigInt::from(n)))
        }
    }

    /// Build a rational-function value over `ext` without an interval (the
    /// caller installs one). The real flag is derived from the extension and
    /// the coefficients.
    pub(crate) fn mk_rf_core(&self, ext: Rc<ExtCell>, num: Poly, den: Poly) -> Rc<ValueCell> {
        debug_assert!(!num.is_empty() && num.last().is_some_and(|c| c.is_some()));
        debug_assert!(!den.is_empty() && den.last().is_some_and(|c| c.is_some()));
        let real = ext.is_real() && is_real_poly(&num) && is_real_poly(&den);
        Rc::new(ValueCell {
            interval: RefCell::new(DyadicInterval::full()),
            saved_interval: RefCell::new(None),
            kind: ValueKind::RationalFunction(RatFun {
                ext,
                num,
                den,
                real,
            }),
        })
    }

    /// The fresh constant for an extension: `x/1` with the extension's own
    /// interval.
    pub(crate) fn mk_rf_constant(&self, ext: &Rc<ExtCell>) -> Val {
        let num: Poly = smallvec![None, self.one_val()];
        let den: Poly = smallvec![self.one_val()];
        let v = self.mk_rf_core(ext.clone(), num, den);
        *v.interval.borrow_mut() = ext.interval.borrow().clone();
        Some(v)
    }

    /// Normalization rules producing a pair in normal form:
    /// a constant denominator is folded into the numerator; a constant
    /// numerator becomes one over a monic denominator; otherwise both are
    /// divided by their gcd.
    pub(crate) fn normalize(&mut self, p1: &[Val], p2: &[Val]) -> Result<(Poly, Poly)> {
        debug_assert!(!p1.is_empty() && !p2.is_empty());
        if p2.len() == 1 {
            let num = self.poly_div_by_value(p1, &p2[0])?;
            return Ok((num, smallvec![self.one_val()]));
        }
        if p1.len() == 1 {
            let mut den = self.poly_div_by_value(p2, &p1[0])?;
            let mut num: Poly = smallvec![self.one_val()];
            let lead = den[den.len() - 1].clone();
            if !is_rational_one(&lead) {
                num[0] = self.vinv(&lead)?;
                den = self.poly_div_by_value(&den, &lead)?;
            }
            return Ok((num, den));
        }
        let g = self.poly_gcd(p1, p2)?;
        if is_one_poly(&g) {
            return Ok((Poly::from(p1), Poly::from(p2)));
        }
        let q1 = self.poly_div(p1, &g)?;
        let q2 = self.poly_div(p2, &g)?;
        if q1.len() == 1 || q2.len() == 1 {
            self.normalize(&q1, &q2)
        } else {
            Ok((q1, q2))
        }
    }

    /// Assemble an addition result: install the lifted interval and run sign
    /// determination. A `1/1` pair collapses to its constant coefficient.
    fn mk_add_value(
        &mut self,
        ext: &Rc<ExtCell>,
        ia: &DyadicInterval,
        ib: &DyadicInterval,
        num: Poly,
        den: Poly,
    ) -> Result<Val> {
        if num.len() == 1 && den.len() == 1 {
            debug_assert!(is_rational_one(&den[0]));
            return Ok(num[0].clone());
        }
        let r = self.mk_rf_core(ext.clone(), num, den);
        *r.interval.borrow_mut() = ia.add(ib);
        if self.determine_sign(&r)? {
            Ok(Some(r))
        } else {
            Ok(None)
        }
    }

    /// Assemble a multiplication result, as [`Self::mk_add_value`] but with
    /// the product interval.
    fn mk_mul_value(
        &mut self,
        ext: &Rc<ExtCell>,
        ia: &DyadicInterval,
        ib: &DyadicInterval,
        num: Poly,
        den: Poly,
    ) -> Result<Val> {
        if num.len() == 1 && den.len() == 1 {
            debug_assert!(is_rational_one(&den[0]));
            return Ok(num[0].clone());
        }
        let r = self.mk_rf_core(ext.clone(), num, den);
        *r.interval.borrow_mut() = ia.mul(ib);
        if self.determine_sign(&r)? {
            Ok(Some(r))
        } else {
            Ok(None)
        }
    }

    /// `a + b` where `rank(a) > rank(b)`: `b` folds into the constant
    /// coefficient of the numerator.
    fn add_rf_v(&mut self, a: &Rc<ValueCell>, b: &Val) -> Result<Val> {
        let (ext, num, den) = {
            let Some(rf) = a.as_rat_fun() else {
                return Err(RcfError::Internal("rank dispatch on a rational"));
            };
            (rf.ext.clone(), rf.num.clone(), rf.den.clone())
        };
        let ia = a.interval.borrow().clone();
        let ib = self.val_interval(b)?;
        if is_one_poly(&den) {
            debug_assert!(num.len() > 1);
            let new_num = self.poly_add_scalar(&num, b)?;
            debug_assert_eq!(new_num.len(), num.len());
            return self.mk_add_value(&ext, &ia, &ib, new_num, den);
        }
        let b_den = self.poly_mul_scalar(b, &den)?;
        let new_num = self.poly_add(&num, &b_den)?;
        if new_num.is_empty() {
            return Ok(None);
        }
        let (num, den) = self.normalize(&new_num, &den)?;
        self.mk_add_value(&ext, &ia, &ib, num, den)
    }

    /// `a + b` where both operands live over the same extension.
    fn add_rf_rf(&mut self, a: &Rc<ValueCell>, b: &Rc<ValueCell>) -> Result<Val> {
        debug_assert_eq!(compare_rank(a, b), 0);
        let (ext, an, ad) = {
            let Some(rf) = a.as_rat_fun() else {
                return Err(RcfError::Internal("rank dispatch on a rational"));
            };
            (rf.ext.clone(), rf.num.clone(), rf.den.clone())
        };
        let (bn, bd) = {
            let Some(rf) = b.as_rat_fun() else {
                return Err(RcfError::Internal("rank dispatch on a rational"));
            };
            (rf.num.clone(), rf.den.clone())
        };
        let ia = a.interval.borrow().clone();
        let ib = b.interval.borrow().clone();
        if is_one_poly(&ad) && is_one_poly(&bd) {
            let new_num = self.poly_add(&an, &bn)?;
            if new_num.is_empty() {
                return Ok(None);
            }
            return self.mk_add_value(&ext, &ia, &ib, new_num, ad);
        }
        let an_bd = self.poly_mul(&an, &bd)?;
        let bn_ad = self.poly_mul(&bn, &ad)?;
        let num = self.poly_add(&an_bd, &bn_ad)?;
        if num.is_empty() {
            return Ok(None);
        }
        let den = self.poly_mul(&ad, &bd)?;
        let (num, den) = self.normalize(&num, &den)?;
        self.mk_add_value(&ext, &ia, &ib, num, den)
    }

    /// `a + b`.
    pub(crate) fn vadd(&mut self, a: &Val, b: &Val) -> Result<Val> {
        match (a, b) {
            (None, _) => Ok(b.clone()),
            (_, None) => Ok(a.clone()),
            (Some(ca), Some(cb)) => {
                if let (Some(qa), Some(qb)) = (ca.as_rational(), cb.as_rational()) {
                    let r = qa + qb;
                    return Ok(if r.is_zero() {
                        None
                    } else {
                        self.mk_rational_value(r)
                    });
                }
                match compare_rank(ca, cb) {
                    -1 => self.add_rf_v(cb, a),
                    0 => self.add_rf_rf(ca, cb),
                    _ => self.add_rf_v(ca, b),
                }
            }
        }
    }

    /// `a - b`, as `a + (-b)`.
    pub(crate) fn vsub(&mut self, a: &Val, b: &Val) -> Result<Val> {
        match (a, b) {
            (_, None) => Ok(a.clone()),
            (Some(ca), Some(cb)) => {
                if let (Some(qa), Some(qb)) = (ca.as_rational(), cb.as_rational()) {
                    let r = qa - qb;
                    return Ok(if r.is_zero() {
                        None
                    } else {
                        self.mk_rational_value(r)
                    });
                }
                let neg_b = self.vneg(b);
                self.vadd(a, &neg_b)
            }
            (None, _) => Ok(self.vneg(b)),
        }
    }

    /// `-a`. Negates the numerator and the interval; the sign stays decided.
    pub(crate) fn vneg(&self, a: &Val) -> Val {
        match a {
            None => None,
            Some(c) => match &c.kind {
                ValueKind::Rational(q) => self.mk_rational_value(-q),
                ValueKind::RationalFunction(rf) => {
                    let new_num = self.poly_neg(&rf.num);
                    let r = self.mk_rf_core(rf.ext.clone(), new_num, rf.den.clone());
                    *r.interval.borrow_mut() = c.interval.borrow().neg();
                    Some(r)
                }
            },
        }
    }

    /// `a * b` where `rank(a) > rank(b)`: `b` scales the numerator.
    fn mul_rf_v(&mut self, a: &Rc<ValueCell>, b: &Val) -> Result<Val> {
        debug_assert!(b.is_some());
        let (ext, num, den) = {
            let Some(rf) = a.as_rat_fun() else {
                return Err(RcfError::Internal("rank dispatch on a rational"));
            };
            (rf.ext.clone(), rf.num.clone(), rf.den.clone())
        };
        let ia = a.interval.borrow().clone();
        let ib = self.val_interval(b)?;
        let new_num = self.poly_mul_scalar(b, &num)?;
        debug_assert_eq!(new_num.len(), num.len());
        if is_one_poly(&den) {
            debug_assert!(num.len() > 1);
            return self.mk_mul_value(&ext, &ia, &ib, new_num, den);
        }
        let (num, den) = self.normalize(&new_num, &den)?;
        self.mk_mul_value(&ext, &ia, &ib, num, den)
    }

    /// `a * b` where both operands live over the same extension.
    fn mul_rf_rf(&mut self, a: &Rc<ValueCell>, b: &Rc<ValueCell>) -> Result<Val> {
        debug_assert_eq!(compare_rank(a, b), 0);
        let (ext, an, ad) = {
            let Some(rf) = a.as_rat_fun() else {
                return Err(RcfError::Internal("rank dispatch on a rational"));
            };
            (rf.ext.clone(), rf.num.clone(), rf.den.clone())
        };
        let (bn, bd) = {
            let Some(rf) = b.as_rat_fun() else {
                return Err(RcfError::Internal("rank dispatch on a rational"));
            };
            (rf.num.clone(), rf.den.clone())
        };
        let ia = a.interval.borrow().clone();
        let ib = b.interval.borrow().clone();
        let num = self.poly_mul(&an, &bn)?;
        debug_assert!(!num.is_empty());
        if is_one_poly(&ad) && is_one_poly(&bd) {
            return self.mk_mul_value(&ext, &ia, &ib, num, ad);
        }
        let den = self.poly_mul(&ad, &bd)?;
        let (num, den) = self.normalize(&num, &den)?;
        self.mk_mul_value(&ext, &ia, &ib, num, den)
    }

    /// `a * b`.
    pub(crate) fn vmul(&mut self, a: &Val, b: &Val) -> Result<Val> {
        if a.is_none() || b.is_none() {
            return Ok(None);
        }
        if is_rational_one(a) {
            return Ok(b.clone());
        }
        if is_rational_one(b) {
            return Ok(a.clone());
        }
        if is_rational_minus_one(a) {
            return Ok(self.vneg(b));
        }
        if is_rational_minus_one(b) {
            return Ok(self.vneg(a));
        }
        let (ca, cb) = match (a, b) {
            (Some(ca), Some(cb)) => (ca, cb),
            _ => return Ok(None),
        };
        if let (Some(qa), Some(qb)) = (ca.as_rational(), cb.as_rational()) {
            return Ok(self.mk_rational_value(qa * qb));
        }
        match compare_rank(ca, cb) {
            -1 => self.mul_rf_v(cb, a),
            0 => self.mul_rf_rf(ca, cb),
            _ => self.mul_rf_v(ca, b),
        }
    }

    /// `1/a`. Swapping numerator and denominator preserves normal form
    /// (their gcd is one), so only the interval needs inverting.
    pub(crate) fn vinv(&mut self, a: &Val) -> Result<Val> {
        match a {
            None => Err(RcfError::DivisionByZero),
            Some(c) => match &c.kind {
                ValueKind::Rational(q) => {
                    Ok(self.mk_rational_value(BigRational::new(
                        q.denom().clone(),
                        q.numer().clone(),
                    )))
                }
                ValueKind::RationalFunction(rf) => {
                    let r = self.mk_rf_core(rf.ext.clone(), rf.den.clone(), rf.num.clone());
                    let inv = c.interval.borrow().inv(self.config.div_precision);
                    debug_assert!(!inv.contains_zero());
                    *r.interval.borrow_mut() = inv;
                    Ok(Some(r))
                }
            },
        }
    }

    /// `a / b`.
    pub(crate) fn vdiv(&mut self, a: &Val, b: &Val) -> Result<Val> {
        if b.is_none() {
            return Err(RcfError::DivisionByZero);
        }
        if a.is_none() {
            return Ok(None);
        }
        if is_rational_one(b) {
            return Ok(a.clone());
        }
        if is_rational_one(a) {
            return self.vinv(b);
        }
        if is_rational_minus_one(b) {
            return Ok(self.vneg(a));
        }
        let (ca, cb) = match (a, b) {
            (Some(ca), Some(cb)) => (ca, cb),
            _ => return Ok(None),
        };
        if let (Some(qa), Some(qb)) = (ca.as_rational(), cb.as_rational()) {
            return Ok(self.mk_rational_value(qa / qb));
        }
        let inv_b = self.vinv(b)?;
        let Some(ci) = &inv_b else {
            return Err(RcfError::Internal("inverse of a non-zero value is zero"));
        };
        match compare_rank(ca, ci) {
            -1 => self.mul_rf_v(ci, a),
            0 => self.mul_rf_rf(ca, ci),
            _ => self.mul_rf_v(ca, &inv_b),
        }
    }

    /// Hook: materialize the root of `poly` selected by the isolation data.
    pub(crate) fn mk_algebraic_root(&mut self, _poly: Poly) -> Result<Val> {
        Err(RcfError::Unsupported("algebraic root isolation"))
    }
}
