//! Interval refinement driver.
//!
//! Every sign and comparison decision is driven by refining value intervals
//! on demand. Refinement can temporarily shrink intervals far below what
//! later operations need; the first shrink of an already-small interval is
//! saved and restored when the enclosing public operation finishes, so
//! precision costs stay confined to the operation that required them.

use crate::dyadic::{floor_scaled, refine_lower, refine_upper, Dyadic};
use crate::error::{RcfError, Result};
use crate::extension::{ExtCell, ExtData};
use crate::interval::{DyadicInterval, RatInterval};
use crate::manager::RcfManager;
use crate::value::{first_non_zero, is_one_poly, Val, ValueCell, ValueKind};
use num_rational::BigRational;
use std::rc::Rc;

/// Bumped precision, saturating once precisions stop being small.
pub(crate) fn inc_precision(prec: u32, inc: u32) -> u32 {
    const SMALL: u32 = 1 << 16;
    if prec < SMALL {
        prec + inc
    } else {
        prec
    }
}

impl RcfManager {
    /// True if the interval is below the configured minimum magnitude.
    pub(crate) fn too_small(&self, i: &DyadicInterval) -> bool {
        i.magnitude() < self.min_magnitude
    }

    /// Save the current interval of `v` so the enclosing restore scope can
    /// put it back. Only the first save per scope is kept.
    pub(crate) fn save_interval(&mut self, v: &Rc<ValueCell>) {
        if v.saved_interval.borrow().is_some() {
            return;
        }
        *v.saved_interval.borrow_mut() = Some(v.interval.borrow().clone());
        self.to_restore.push(v.clone());
        self.stats.interval_saves += 1;
    }

    pub(crate) fn save_interval_if_too_small(&mut self, v: &Rc<ValueCell>) {
        let small = self.too_small(&v.interval.borrow());
        if small {
            self.save_interval(v);
        }
    }

    /// Restore every interval saved since the current restore scope opened.
    pub(crate) fn restore_saved_intervals(&mut self) {
        let to_restore = std::mem::take(&mut self.to_restore);
        for v in to_restore {
            if let Some(old) = v.saved_interval.borrow_mut().take() {
                *v.interval.borrow_mut() = old;
            }
        }
    }

    /// Convert a rational to a dyadic enclosure of width below `1/2^k`,
    /// excluding zero and with non-zero endpoints unless `q` itself is
    /// dyadic (then the enclosure is an exact point).
    pub(crate) fn rational_to_interval(
        &mut self,
        q: &BigRational,
        k: u32,
    ) -> Result<DyadicInterval> {
        if let Some(d) = Dyadic::from_rational(q) {
            return Ok(DyadicInterval::point(d));
        }
        let mut b = k + 1;
        loop {
            self.checkpoint()?;
            let f = floor_scaled(q, b);
            let lower = Dyadic::new(f.clone(), b);
            let upper = Dyadic::new(f + 1, b);
            if !lower.is_zero() && !upper.is_zero() {
                return Ok(DyadicInterval::open(lower, upper));
            }
            b += 1;
        }
    }

    /// Make sure the interval of a rational value has been computed. For
    /// rational functions the interval is always valid.
    pub(crate) fn ensure_interval(&mut self, v: &Rc<ValueCell>) -> Result<()> {
        let needs_init = v.interval.borrow().contains_zero();
        if needs_init {
            let ValueKind::Rational(q) = &v.kind else {
                return Err(RcfError::Internal("rational-function interval contains zero"));
            };
            let i = self.rational_to_interval(q, self.config.initial_precision)?;
            *v.interval.borrow_mut() = i;
        }
        Ok(())
    }

    /// Current interval of a non-zero value.
    pub(crate) fn cell_interval(&mut self, v: &Rc<ValueCell>) -> Result<DyadicInterval> {
        self.ensure_interval(v)?;
        Ok(v.interval.borrow().clone())
    }

    /// Current interval of a value known to be non-zero.
    pub(crate) fn val_interval(&mut self, v: &Val) -> Result<DyadicInterval> {
        match v {
            Some(c) => self.cell_interval(c),
            None => Err(RcfError::Internal("interval of the zero value")),
        }
    }

    fn refine_rational_interval(&mut self, v: &Rc<ValueCell>, prec: u32) -> Result<()> {
        let ValueKind::Rational(q) = &v.kind else {
            return Err(RcfError::Internal("not a rational value"));
        };
        let q = q.clone();
        let mut i = v.interval.borrow().clone();
        if !i.lower_is_open() && !i.upper_is_open() {
            // Exact dyadic: nothing to refine.
            debug_assert!(i.lower() == i.upper());
            return Ok(());
        }
        while !i.check_precision(prec) {
            self.checkpoint()?;
            let (mut lower, mut upper) = (i.lower().clone(), i.upper().clone());
            refine_lower(&q, &mut lower, &upper);
            refine_upper(&q, &lower, &mut upper);
            i.set_lower(lower, true);
            i.set_upper(upper, true);
        }
        *v.interval.borrow_mut() = i;
        Ok(())
    }

    /// Refine the interval of every non-zero coefficient of `p`. Fails only
    /// if a coefficient depends on an infinitesimal whose expression is
    /// infinite.
    pub(crate) fn refine_coeffs_interval(&mut self, p: &[Val], prec: u32) -> Result<bool> {
        for c in p {
            if let Some(cell) = c {
                if !self.refine_interval(cell, prec)? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Interval of `p(x)` by the Horner scheme, skipping zero coefficients.
    pub(crate) fn polynomial_interval(
        &mut self,
        p: &[Val],
        x: &DyadicInterval,
    ) -> Result<DyadicInterval> {
        debug_assert!(!p.is_empty());
        let sz = p.len();
        if sz == 1 {
            return self.val_interval(&p[0]);
        }
        let mut r = self.val_interval(&p[sz - 1])?.mul(x);
        let mut i = sz - 1;
        while i > 0 {
            i -= 1;
            if let Some(c) = &p[i] {
                r = r.add(&self.cell_interval(c)?);
            }
            if i > 0 {
                r = r.mul(x);
            }
        }
        Ok(r)
    }

    /// Recompute the interval of a rational-function value from the
    /// intervals of its extension and coefficients.
    pub(crate) fn update_rf_interval(&mut self, v: &Rc<ValueCell>, prec: u32) -> Result<()> {
        let ValueKind::RationalFunction(rf) = &v.kind else {
            return Err(RcfError::Internal("not a rational-function value"));
        };
        let x = rf.ext.interval.borrow().clone();
        let i = if is_one_poly(&rf.den) {
            self.polynomial_interval(&rf.num, &x)?
        } else {
            let num_i = self.polynomial_interval(&rf.num, &x)?;
            let den_i = self.polynomial_interval(&rf.den, &x)?;
            num_i.div(&den_i, inc_precision(prec, 2))
        };
        *v.interval.borrow_mut() = i;
        Ok(())
    }

    /// One refinement step on a transcendental extension: advance its
    /// producer and re-convert the rational enclosure to dyadic.
    pub(crate) fn refine_transcendental_ext(&mut self, ext: &Rc<ExtCell>) -> Result<()> {
        let k = {
            let ExtData::Transcendental(t) = &ext.data else {
                return Err(RcfError::Internal("not a transcendental extension"));
            };
            let k = t.k.get() + 1;
            t.k.set(k);
            k
        };
        self.set_transcendental_enclosure(ext, k)
    }

    /// Query the producer at `k` and install the converted dyadic enclosure.
    pub(crate) fn set_transcendental_enclosure(
        &mut self,
        ext: &Rc<ExtCell>,
        k: u32,
    ) -> Result<()> {
        let qi = {
            let ExtData::Transcendental(t) = &ext.data else {
                return Err(RcfError::Internal("not a transcendental extension"));
            };
            let mut qi = RatInterval::default();
            t.producer.produce(k, &mut qi);
            qi
        };
        let m = qi.magnitude();
        tracing::trace!(target: "rcf", k, magnitude = m, "refine transcendental enclosure");
        let bits = if m >= 0 || m == i32::MIN {
            self.config.initial_precision
        } else {
            inc_precision((-m) as u32, 8)
        };
        let li = self.rational_to_interval(&qi.lower, bits)?;
        let ui = self.rational_to_interval(&qi.upper, bits)?;
        let mut i = DyadicInterval::full();
        i.set_lower(li.lower().clone(), li.lower_is_open());
        i.set_upper(ui.upper().clone(), ui.upper_is_open());
        *ext.interval.borrow_mut() = i;
        Ok(())
    }

    /// Refine a transcendental extension's interval below `1/2^prec`.
    pub(crate) fn refine_transcendental_ext_to(
        &mut self,
        ext: &Rc<ExtCell>,
        prec: u32,
    ) -> Result<()> {
        loop {
            let done = ext.interval.borrow().check_precision(prec);
            if done {
                return Ok(());
            }
            self.checkpoint()?;
            self.refine_transcendental_ext(ext)?;
        }
    }

    /// Refine a transcendental-expression value below `1/2^prec`. Always
    /// succeeds: transcendental expressions never depend on infinitesimals.
    pub(crate) fn refine_transcendental_value(
        &mut self,
        v: &Rc<ValueCell>,
        prec: u32,
    ) -> Result<()> {
        let (num, den, ext) = {
            let ValueKind::RationalFunction(rf) = &v.kind else {
                return Err(RcfError::Internal("not a rational-function value"));
            };
            (rf.num.clone(), rf.den.clone(), rf.ext.clone())
        };
        let mut p = prec;
        loop {
            self.refine_coeffs_interval(&num, p)?;
            self.refine_coeffs_interval(&den, p)?;
            self.refine_transcendental_ext_to(&ext, p)?;
            self.update_rf_interval(v, prec)?;
            if v.interval.borrow().check_precision(prec) {
                return Ok(());
            }
            p = inc_precision(p, 1);
        }
    }

    /// Refine an infinitesimal-expression value below `1/2^prec`. Returns
    /// false when the value is infinite: no dyadic interval of the requested
    /// width exists.
    pub(crate) fn refine_infinitesimal_value(
        &mut self,
        v: &Rc<ValueCell>,
        prec: u32,
    ) -> Result<bool> {
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
        if num_idx == 0 && den_idx == 0 {
            let mut p = prec;
            loop {
                self.checkpoint()?;
                if let Some(c) = &num[0] {
                    self.refine_interval(c, p)?;
                }
                if let Some(c) = &den[0] {
                    self.refine_interval(c, p)?;
                }
                let i = self.leading_quotient_interval(&num, &den, 2 * p, inc_precision(prec, 2))?;
                *v.interval.borrow_mut() = i;
                if v.interval.borrow().check_precision(prec) {
                    return Ok(true);
                }
                p = inc_precision(p, 1);
            }
        } else if num_idx == 0 {
            // gcd(num, den) = 1 rules out num_idx > 0 && den_idx > 0; a
            // leading denominator zero makes the value infinite.
            Ok(false)
        } else {
            let s = crate::value::sign(&num[num_idx]) * crate::value::sign(&den[den_idx]);
            let mut i = DyadicInterval::full();
            if s > 0 {
                i.set_lower(Dyadic::zero(), true);
                i.set_upper(Dyadic::two_pow(-(prec as i32)), true);
            } else {
                i.set_lower(Dyadic::two_pow(-(prec as i32)).neg(), true);
                i.set_upper(Dyadic::zero(), true);
            }
            *v.interval.borrow_mut() = i;
            Ok(true)
        }
    }

    /// Hook: refine the isolating interval of an algebraic-expression value.
    pub(crate) fn refine_algebraic_value(
        &mut self,
        _v: &Rc<ValueCell>,
        _prec: u32,
    ) -> Result<bool> {
        Err(RcfError::Unsupported("algebraic interval refinement"))
    }

    /// Refine the interval of `v` below `1/2^prec`. Returns false when no
    /// such interval exists (infinite values over infinitesimals).
    pub(crate) fn refine_interval(&mut self, v: &Rc<ValueCell>, prec: u32) -> Result<bool> {
        self.checkpoint()?;
        self.ensure_interval(v)?;
        let m = v.interval.borrow().magnitude();
        if m == i32::MIN || (m < 0 && (-(m as i64)) as u64 > prec as u64) {
            return Ok(true);
        }
        self.stats.refinements += 1;
        self.save_interval_if_too_small(v);
        match &v.kind {
            ValueKind::Rational(_) => {
                self.refine_rational_interval(v, prec)?;
                Ok(true)
            }
            ValueKind::RationalFunction(rf) => match &rf.ext.data {
                ExtData::Transcendental(_) => {
                    self.refine_transcendental_value(v, prec)?;
                    Ok(true)
                }
                ExtData::Infinitesimal(_) => self.refine_infinitesimal_value(v, prec),
                ExtData::Algebraic(_) => self.refine_algebraic_value(v, prec),
            },
        }
    }
}
