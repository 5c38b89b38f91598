//! Polynomial kernel over the value ring.
//!
//! Polynomials are coefficient sequences of (shared, possibly-zero) values.
//! Division operates in the fraction field, so the leading coefficient of a
//! divisor must be non-zero; `gcd` results are forced monic. Inner loops hit
//! a cooperation point per iteration.

use crate::error::Result;
use crate::manager::RcfManager;
use crate::value::{is_rational_one, Poly, Val};
use smallvec::smallvec;

/// Trim trailing zero coefficients.
pub(crate) fn adjust_size(p: &mut Poly) {
    while p.last().is_some_and(|c| c.is_none()) {
        p.pop();
    }
}

impl RcfManager {
    /// `p1 + p2`, positional.
    pub(crate) fn poly_add(&mut self, p1: &[Val], p2: &[Val]) -> Result<Poly> {
        let mut r: Poly = Poly::new();
        let min = p1.len().min(p2.len());
        for i in 0..min {
            r.push(self.vadd(&p1[i], &p2[i])?);
        }
        r.extend(p1[min..].iter().cloned());
        r.extend(p2[min..].iter().cloned());
        adjust_size(&mut r);
        Ok(r)
    }

    /// `p + a` on the constant coefficient.
    pub(crate) fn poly_add_scalar(&mut self, p: &[Val], a: &Val) -> Result<Poly> {
        debug_assert!(!p.is_empty());
        let mut r: Poly = Poly::new();
        r.push(self.vadd(&p[0], a)?);
        r.extend(p[1..].iter().cloned());
        adjust_size(&mut r);
        Ok(r)
    }

    /// `p1 - p2`, positional.
    pub(crate) fn poly_sub(&mut self, p1: &[Val], p2: &[Val]) -> Result<Poly> {
        let mut r: Poly = Poly::new();
        let min = p1.len().min(p2.len());
        for i in 0..min {
            r.push(self.vsub(&p1[i], &p2[i])?);
        }
        r.extend(p1[min..].iter().cloned());
        for c in &p2[min..] {
            r.push(self.vneg(c));
        }
        adjust_size(&mut r);
        Ok(r)
    }

    /// `a * p`.
    pub(crate) fn poly_mul_scalar(&mut self, a: &Val, p: &[Val]) -> Result<Poly> {
        let mut r: Poly = Poly::new();
        if a.is_none() {
            return Ok(r);
        }
        for c in p {
            r.push(self.vmul(a, c)?);
        }
        Ok(r)
    }

    /// `p1 * p2`, naive convolution.
    pub(crate) fn poly_mul(&mut self, p1: &[Val], p2: &[Val]) -> Result<Poly> {
        let mut r: Poly = smallvec![None; p1.len() * p2.len()];
        let (p1, p2) = if p1.len() < p2.len() { (p2, p1) } else { (p1, p2) };
        for (i, a) in p1.iter().enumerate() {
            self.checkpoint()?;
            if a.is_none() {
                continue;
            }
            for (j, b) in p2.iter().enumerate() {
                let t = self.vmul(a, b)?;
                r[i + j] = self.vadd(&r[i + j], &t)?;
            }
        }
        adjust_size(&mut r);
        Ok(r)
    }

    /// `-p`.
    pub(crate) fn poly_neg(&self, p: &[Val]) -> Poly {
        p.iter().map(|c| self.vneg(c)).collect()
    }

    /// `p / a` coefficient-wise; `a` must be non-zero.
    pub(crate) fn poly_div_by_value(&mut self, p: &[Val], a: &Val) -> Result<Poly> {
        debug_assert!(a.is_some());
        if is_rational_one(a) {
            return Ok(Poly::from(p));
        }
        let mut r: Poly = Poly::new();
        for c in p {
            r.push(self.vdiv(c, a)?);
        }
        Ok(r)
    }

    /// Long division: `(quotient, remainder)` of `p1` by `p2` in the
    /// fraction field of the coefficients.
    pub(crate) fn poly_div_rem(&mut self, p1: &[Val], p2: &[Val]) -> Result<(Poly, Poly)> {
        debug_assert!(!p2.is_empty());
        if p2.len() == 1 {
            return Ok((self.poly_div_by_value(p1, &p2[0])?, Poly::new()));
        }
        let mut q: Poly = Poly::new();
        let mut r: Poly = Poly::from(p1);
        if p1.len() > 1 {
            if p1.len() >= p2.len() {
                q = smallvec![None; p1.len() - p2.len() + 1];
            }
            let b_n = p2[p2.len() - 1].clone();
            debug_assert!(b_n.is_some());
            loop {
                self.checkpoint()?;
                let sz1 = r.len();
                if sz1 < p2.len() {
                    adjust_size(&mut q);
                    break;
                }
                let m_n = sz1 - p2.len();
                let ratio = self.vdiv(&r[sz1 - 1], &b_n)?;
                q[m_n] = self.vadd(&q[m_n], &ratio)?;
                for i in 0..p2.len() - 1 {
                    let t = self.vmul(&ratio, &p2[i])?;
                    r[i + m_n] = self.vsub(&r[i + m_n], &t)?;
                }
                // The leading term cancels by construction.
                r.truncate(sz1 - 1);
                adjust_size(&mut r);
            }
        }
        Ok((q, r))
    }

    /// Quotient of `p1` by `p2`.
    pub(crate) fn poly_div(&mut self, p1: &[Val], p2: &[Val]) -> Result<Poly> {
        Ok(self.poly_div_rem(p1, p2)?.0)
    }

    /// Remainder of `p1` by `p2`.
    pub(crate) fn poly_rem(&mut self, p1: &[Val], p2: &[Val]) -> Result<Poly> {
        Ok(self.poly_div_rem(p1, p2)?.1)
    }

    /// Signed remainder: `-rem(p1, p2)`.
    pub(crate) fn poly_srem(&mut self, p1: &[Val], p2: &[Val]) -> Result<Poly> {
        let r = self.poly_rem(p1, p2)?;
        Ok(self.poly_neg(&r))
    }

    /// Force the leading coefficient of `p` to be the rational one.
    pub(crate) fn mk_monic(&mut self, p: &mut Poly) -> Result<()> {
        let sz = p.len();
        if sz == 0 {
            return Ok(());
        }
        debug_assert!(p[sz - 1].is_some());
        if is_rational_one(&p[sz - 1]) {
            return Ok(());
        }
        let lead = p[sz - 1].clone();
        for i in 0..sz - 1 {
            p[i] = self.vdiv(&p[i], &lead)?;
        }
        p[sz - 1] = self.one_val();
        Ok(())
    }

    /// Monic `gcd(p1, p2)` by the Euclidean algorithm.
    pub(crate) fn poly_gcd(&mut self, p1: &[Val], p2: &[Val]) -> Result<Poly> {
        if p1.is_empty() {
            let mut r = Poly::from(p2);
            self.mk_monic(&mut r)?;
            return Ok(r);
        }
        if p2.is_empty() {
            let mut r = Poly::from(p1);
            self.mk_monic(&mut r)?;
            return Ok(r);
        }
        let mut a = Poly::from(p1);
        let mut b = Poly::from(p2);
        loop {
            if b.is_empty() {
                self.mk_monic(&mut a)?;
                return Ok(a);
            }
            let r = self.poly_rem(&a, &b)?;
            a = b;
            b = r;
        }
    }

    /// `dp/dx`.
    pub(crate) fn poly_derivative(&mut self, p: &[Val]) -> Result<Poly> {
        let mut r: Poly = Poly::new();
        if p.len() > 1 {
            for (i, c) in p.iter().enumerate().skip(1) {
                let i_value = self.mk_int_value(i as i64);
                r.push(self.vmul(&i_value, c)?);
            }
            adjust_size(&mut r);
        }
        Ok(r)
    }

    /// Square-free part: `p / gcd(p, p')`, or `p` itself when the gcd is
    /// constant.
    pub(crate) fn poly_square_free(&mut self, p: &[Val]) -> Result<Poly> {
        if p.len() <= 1 {
            return Ok(Poly::from(p));
        }
        let p_prime = self.poly_derivative(p)?;
        let g = self.poly_gcd(p, &p_prime)?;
        if g.len() <= 1 {
            Ok(Poly::from(p))
        } else {
            self.poly_div(p, &g)
        }
    }

    /// Extend `(p1; p2)` into a Sturm sequence by signed remainders until a
    /// zero remainder.
    fn sturm_seq_core(&mut self, seq: &mut Vec<Poly>) -> Result<()> {
        loop {
            self.checkpoint()?;
            let n = seq.len();
            let r = self.poly_srem(&seq[n - 2], &seq[n - 1])?;
            if r.is_empty() {
                return Ok(());
            }
            seq.push(r);
        }
    }

    /// Sturm sequence for `(p; p')`.
    pub(crate) fn sturm_seq(&mut self, p: &[Val]) -> Result<Vec<Poly>> {
        let mut seq = vec![Poly::from(p), self.poly_derivative(p)?];
        self.sturm_seq_core(&mut seq)?;
        Ok(seq)
    }

    /// Sturm-Tarski sequence for `(p1; p1' * p2)`.
    pub(crate) fn sturm_tarski_seq(&mut self, p1: &[Val], p2: &[Val]) -> Result<Vec<Poly>> {
        let d = self.poly_derivative(p1)?;
        let second = self.poly_mul(&d, p2)?;
        let mut seq = vec![Poly::from(p1), second];
        self.sturm_seq_core(&mut seq)?;
        Ok(seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{self, is_one_poly};

    fn mgr() -> RcfManager {
        RcfManager::new()
    }

    fn ints(m: &RcfManager, cs: &[i64]) -> Poly {
        let mut p: Poly = cs.iter().map(|&c| m.mk_int_value(c)).collect();
        adjust_size(&mut p);
        p
    }

    fn as_ints(p: &[Val]) -> Vec<Option<i64>> {
        p.iter()
            .map(|c| {
                c.as_ref().map(|cell| {
                    let q = cell.as_rational().expect("rational coefficient");
                    assert!(q.is_integer());
                    i64::try_from(q.to_integer()).expect("small coefficient")
                })
            })
            .collect()
    }

    #[test]
    fn test_add_sub_trims() {
        let mut m = mgr();
        let p = ints(&m, &[1, 2, 1]); // 1 + 2x + x^2
        let q = ints(&m, &[0, 0, -1]); // -x^2
        let s = m.poly_add(&p, &q).unwrap();
        assert_eq!(as_ints(&s), vec![Some(1), Some(2)]);
        let d = m.poly_sub(&p, &p).unwrap();
        assert!(d.is_empty());
    }

    #[test]
    fn test_mul_convolution() {
        let mut m = mgr();
        // (1 + x)(1 - x) = 1 - x^2
        let p = ints(&m, &[1, 1]);
        let q = ints(&m, &[1, -1]);
        let r = m.poly_mul(&p, &q).unwrap();
        assert_eq!(as_ints(&r), vec![Some(1), None, Some(-1)]);
    }

    #[test]
    fn test_div_rem() {
        let mut m = mgr();
        // x^2 - 1 = (x + 1)(x - 1) + 0
        let p = ints(&m, &[-1, 0, 1]);
        let d = ints(&m, &[1, 1]);
        let (q, r) = m.poly_div_rem(&p, &d).unwrap();
        assert_eq!(as_ints(&q), vec![Some(-1), Some(1)]);
        assert!(r.is_empty());
        // x^2 + 1 by (x + 1): quotient x - 1, remainder 2
        let p = ints(&m, &[1, 0, 1]);
        let (q, r) = m.poly_div_rem(&p, &d).unwrap();
        assert_eq!(as_ints(&q), vec![Some(-1), Some(1)]);
        assert_eq!(as_ints(&r), vec![Some(2)]);
    }

    #[test]
    fn test_gcd_is_monic() {
        let mut m = mgr();
        // gcd(2x^2 - 2, 3x - 3) = x - 1
        let p = ints(&m, &[-2, 0, 2]);
        let q = ints(&m, &[-3, 3]);
        let g = m.poly_gcd(&p, &q).unwrap();
        assert_eq!(as_ints(&g), vec![Some(-1), Some(1)]);
        // Coprime inputs: gcd is the constant 1.
        let p = ints(&m, &[1, 0, 1]);
        let q = ints(&m, &[1, 1]);
        let g = m.poly_gcd(&p, &q).unwrap();
        assert!(is_one_poly(&g));
    }

    #[test]
    fn test_derivative() {
        let mut m = mgr();
        // (1 + 2x + 3x^2)' = 2 + 6x
        let p = ints(&m, &[1, 2, 3]);
        let d = m.poly_derivative(&p).unwrap();
        assert_eq!(as_ints(&d), vec![Some(2), Some(6)]);
        assert!(m.poly_derivative(&ints(&m, &[5])).unwrap().is_empty());
    }

    #[test]
    fn test_square_free() {
        let mut m = mgr();
        // (x - 1)^2 = 1 - 2x + x^2 has square-free part x - 1.
        let p = ints(&m, &[1, -2, 1]);
        let sf = m.poly_square_free(&p).unwrap();
        assert_eq!(as_ints(&sf), vec![Some(-1), Some(1)]);
        // Already square-free input comes back unchanged.
        let p = ints(&m, &[-2, 0, 1]);
        let sf = m.poly_square_free(&p).unwrap();
        assert_eq!(as_ints(&sf), vec![Some(-2), None, Some(1)]);
    }

    #[test]
    fn test_sturm_seq_shape() {
        let mut m = mgr();
        // x^2 - 2: sequence x^2 - 2, 2x, 2.
        let p = ints(&m, &[-2, 0, 1]);
        let seq = m.sturm_seq(&p).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(as_ints(&seq[1]), vec![None, Some(2)]);
        assert_eq!(as_ints(&seq[2]), vec![Some(2)]);
        // Signs of the last entry: positive constant.
        assert_eq!(value::sign(&seq[2][0]), 1);
    }

    #[test]
    fn test_sturm_tarski_seq() {
        let mut m = mgr();
        let p = ints(&m, &[-2, 0, 1]);
        let q = ints(&m, &[0, 1]);
        let seq = m.sturm_tarski_seq(&p, &q).unwrap();
        // Starts with p and p'*q = 2x^2.
        assert_eq!(as_ints(&seq[0]), vec![Some(-2), None, Some(1)]);
        assert_eq!(as_ints(&seq[1]), vec![None, None, Some(2)]);
        assert!(seq.len() >= 3);
    }

    #[test]
    fn test_monic() {
        let mut m = mgr();
        let mut p = ints(&m, &[4, 2]);
        m.mk_monic(&mut p).unwrap();
        assert_eq!(as_ints(&p), vec![Some(2), Some(1)]);
    }
}
