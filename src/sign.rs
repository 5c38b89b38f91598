//! Sign determination and ordered comparison.
//!
//! A freshly built rational-function value starts with an interval lifted
//! from its operands, which may contain zero. Sign determination sharpens
//! the interval until zero is excluded, or proves the value zero. The
//! procedure depends on the extension kind: transcendental and infinitesimal
//! expressions are never zero (a transcendental element is not a root of any
//! non-zero polynomial over its subfield, and an infinitesimal is
//! transcendental over any subfield), so only the algebraic hook can report
//! zero.

use crate::dyadic::Dyadic;
use crate::error::{RcfError, Result};
use crate::extension::ExtData;
use crate::interval::DyadicInterval;
use crate::manager::RcfManager;
use crate::refine::inc_precision;
use crate::value::{self, first_non_zero, Val, ValueCell, ValueKind};
use std::rc::Rc;

/// Sign of the first non-zero coefficient at or after `start`.
fn sign_of_first_non_zero(p: &[Val], start: usize) -> Result<i32> {
    p[start..]
        .iter()
        .find(|c| c.is_some())
        .map(value::sign)
        .ok_or(RcfError::Internal("no non-zero coefficient"))
}

impl RcfManager {
    /// Widen a possibly-closed interval to an open one that still encloses
    /// `value + eps` (`plus_eps`) or `value - eps`. A closed endpoint on the
    /// shifted side moves by `tiny`, halved until the shift does not cross
    /// zero.
    pub(crate) fn tiny_shift(
        &mut self,
        input: &DyadicInterval,
        plus_eps: bool,
        tiny: &Dyadic,
    ) -> Result<DyadicInterval> {
        let mut out = input.clone();
        if plus_eps {
            if !input.upper_is_open() {
                let mut t = tiny.clone();
                loop {
                    let shifted = input.upper().add(&t);
                    if shifted.is_pos() == input.upper().is_pos() {
                        out.set_upper(shifted, true);
                        break;
                    }
                    t = t.div2();
                    self.checkpoint()?;
                }
            }
            if !input.lower_is_inf() {
                out.set_lower(input.lower().clone(), true);
            }
        } else {
            if !input.lower_is_open() {
                let mut t = tiny.clone();
                loop {
                    let shifted = input.lower().sub(&t);
                    if shifted.is_pos() == input.lower().is_pos() {
                        out.set_lower(shifted, true);
                        break;
                    }
                    t = t.div2();
                    self.checkpoint()?;
                }
            }
            if !input.upper_is_inf() {
                out.set_upper(input.upper().clone(), true);
            }
        }
        Ok(out)
    }

    /// Interval of the leading quotient `num[0]/den[0]` of an expression in
    /// an infinitesimal, widening closed coefficient intervals by a tiny
    /// shift in the direction of the first-order contribution.
    pub(crate) fn leading_quotient_interval(
        &mut self,
        num: &[Val],
        den: &[Val],
        tiny_bits: u32,
        div_prec: u32,
    ) -> Result<DyadicInterval> {
        let num_i = self.val_interval(&num[0])?;
        let den_i = self.val_interval(&den[0])?;
        debug_assert!(!num_i.contains_zero());
        debug_assert!(!den_i.contains_zero());
        if num_i.is_open() && den_i.is_open() {
            // Adding or subtracting an infinitesimal cannot leave an open
            // interval.
            return Ok(num_i.div(&den_i, div_prec));
        }
        let tiny = Dyadic::two_pow(-(tiny_bits as i32));
        let new_num = if num.len() > 1 {
            let up = sign_of_first_non_zero(num, 1)? > 0;
            self.tiny_shift(&num_i, up, &tiny)?
        } else {
            num_i
        };
        let new_den = if den.len() > 1 {
            let up = sign_of_first_non_zero(den, 1)? > 0;
            self.tiny_shift(&den_i, up, &tiny)?
        } else {
            den_i
        };
        Ok(new_num.div(&new_den, div_prec))
    }

    /// Sharpen the interval of a transcendental expression until it excludes
    /// zero. Such expressions are never zero, so this terminates.
    pub(crate) fn determine_transcendental_sign(&mut self, v: &Rc<ValueCell>) -> Result<()> {
        let m = v.interval.borrow().magnitude();
        let mut prec = if m < 0 { (-(m as i64)) as u32 + 1 } else { 1 };
        loop {
            let contains = v.interval.borrow().contains_zero();
            if !contains {
                return Ok(());
            }
            self.refine_transcendental_value(v, prec)?;
            prec = inc_precision(prec, 1);
        }
    }

    /// Determine the sign of an expression in an infinitesimal from the
    /// first non-zero coefficients of its numerator and denominator. Such
    /// expressions are never zero.
    pub(crate) fn determine_infinitesimal_sign(&mut self, v: &Rc<ValueCell>) -> Result<()> {
        let (num, den) = {
            let ValueKind::RationalFunction(rf) = &v.kind else {
                return Err(RcfError::Internal("not a rational-function value"));
            };
            (rf.num.clone(), rf.den.clone())
        };
        let num_idx = first_non_zero(&num)
            .ok_or(RcfError::Internal("zero numerator in a stored value"))?;
        let den_idx = first_non_zero(&den)
            .ok_or(RcfError::Internal("zero denominator in a stored value"))?;
        let ini = self.config.initial_precision;
        if num_idx == 0 && den_idx == 0 {
            let i = self.leading_quotient_interval(&num, &den, ini, ini)?;
            *v.interval.borrow_mut() = i;
        } else if num_idx == 0 {
            // Leading denominator coefficient vanishes: the value is larger
            // in magnitude than every dyadic rational.
            let s = value::sign(&num[num_idx]) * value::sign(&den[den_idx]);
            let mut i = DyadicInterval::full();
            if s > 0 {
                i.set_lower(self.plus_inf_approx.clone(), true);
                i.set_upper_inf();
            } else {
                i.set_lower_inf();
                i.set_upper(self.minus_inf_approx.clone(), true);
            }
            *v.interval.borrow_mut() = i;
        } else {
            // Leading numerator coefficient vanishes: infinitesimally close
            // to zero, on the side given by the leading coefficients.
            let s = value::sign(&num[num_idx]) * value::sign(&den[den_idx]);
            let mut i = DyadicInterval::full();
            if s > 0 {
                i.set_lower(Dyadic::zero(), true);
                i.set_upper(Dyadic::two_pow(-(ini as i32)), true);
            } else {
                i.set_lower(Dyadic::two_pow(-(ini as i32)).neg(), true);
                i.set_upper(Dyadic::zero(), true);
            }
            *v.interval.borrow_mut() = i;
        }
        debug_assert!(!v.interval.borrow().contains_zero());
        Ok(())
    }

    /// Hook: decide the sign of an algebraic expression from its sign
    /// conditions and Sturm data.
    pub(crate) fn determine_algebraic_sign(&mut self, _v: &Rc<ValueCell>) -> Result<bool> {
        Err(RcfError::Unsupported("algebraic sign determination"))
    }

    /// Sharpen the interval of a newly built rational-function value until
    /// zero is excluded, or prove the value zero. Returns true if the value
    /// is non-zero.
    pub(crate) fn determine_sign(&mut self, v: &Rc<ValueCell>) -> Result<bool> {
        self.stats.sign_determinations += 1;
        if !v.interval.borrow().contains_zero() {
            return Ok(true);
        }
        let ValueKind::RationalFunction(rf) = &v.kind else {
            return Err(RcfError::Internal("sign determination on a rational"));
        };
        match &rf.ext.data {
            ExtData::Transcendental(_) => {
                self.determine_transcendental_sign(v)?;
                Ok(true)
            }
            ExtData::Infinitesimal(_) => {
                self.determine_infinitesimal_sign(v)?;
                Ok(true)
            }
            ExtData::Algebraic(_) => self.determine_algebraic_sign(v),
        }
    }

    /// Three-way ordered comparison: interval disjointness first, difference
    /// sign as the fallback.
    pub(crate) fn compare_values(&mut self, a: &Val, b: &Val) -> Result<i32> {
        self.stats.comparisons += 1;
        match (a, b) {
            (None, _) => Ok(-value::sign(b)),
            (_, None) => Ok(value::sign(a)),
            (Some(ca), Some(cb)) => {
                if let (Some(qa), Some(qb)) = (ca.as_rational(), cb.as_rational()) {
                    return Ok(if qa < qb {
                        -1
                    } else if qa > qb {
                        1
                    } else {
                        0
                    });
                }
                let ia = self.cell_interval(ca)?;
                let ib = self.cell_interval(cb)?;
                if ia.before(&ib) {
                    Ok(-1)
                } else if ib.before(&ia) {
                    Ok(1)
                } else {
                    let diff = self.vsub(a, b)?;
                    Ok(value::sign(&diff))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    fn dy(m: i64, k: u32) -> Dyadic {
        Dyadic::new(BigInt::from(m), k)
    }

    #[test]
    fn test_sign_of_first_non_zero() {
        let m = RcfManager::new();
        let p = [None, m.mk_int_value(-3), m.mk_int_value(1)];
        assert_eq!(sign_of_first_non_zero(&p, 0).unwrap(), -1);
        assert_eq!(sign_of_first_non_zero(&p, 2).unwrap(), 1);
        assert!(sign_of_first_non_zero(&p[..1], 0).is_err());
    }

    #[test]
    fn test_tiny_shift_plus() {
        let mut m = RcfManager::new();
        // [2, 2] shifted for value + eps: (2, 2 + delta), delta <= tiny.
        let i = DyadicInterval::point(dy(2, 0));
        let out = m.tiny_shift(&i, true, &dy(1, 4)).unwrap();
        assert!(out.lower_is_open() && out.upper_is_open());
        assert_eq!(out.lower(), &dy(2, 0));
        assert!(out.upper() > &dy(2, 0));
        assert!(out.upper() <= &dy(2, 0).add(&dy(1, 4)));
    }

    #[test]
    fn test_tiny_shift_minus_halves_to_keep_sign() {
        let mut m = RcfManager::new();
        // [1/4, 1/4] shifted downward with tiny = 1/2 must halve until the
        // lower endpoint stays positive.
        let i = DyadicInterval::point(dy(1, 2));
        let out = m.tiny_shift(&i, false, &dy(1, 1)).unwrap();
        assert!(out.lower().is_pos());
        assert!(out.lower() < &dy(1, 2));
        assert!(!out.contains_zero());
    }

    #[test]
    fn test_compare_rationals() {
        let mut m = RcfManager::new();
        let a = m.mk_rational_value(BigRational::new(BigInt::from(1), BigInt::from(3)));
        let b = m.mk_rational_value(BigRational::new(BigInt::from(1), BigInt::from(2)));
        assert_eq!(m.compare_values(&a, &b).unwrap(), -1);
        assert_eq!(m.compare_values(&b, &a).unwrap(), 1);
        assert_eq!(m.compare_values(&a, &a.clone()).unwrap(), 0);
        assert_eq!(m.compare_values(&None, &a).unwrap(), -1);
        assert_eq!(m.compare_values(&a, &None).unwrap(), 1);
        assert_eq!(m.compare_values(&None, &None).unwrap(), 0);
    }
}
