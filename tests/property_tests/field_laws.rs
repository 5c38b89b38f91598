//! Field laws over small generated expressions.
//!
//! Expressions are built as `q0 + q1*eps` or `q0 + q1*pi` from small
//! rational coefficients, then combined through the engine; equalities are
//! decided by the engine itself (subtract and test for zero).

use num_bigint::BigInt;
use num_rational::BigRational;
use proptest::prelude::*;
use rcf::{Numeral, RcfManager};

fn rat(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

/// `q0 + q1 * x` through the engine.
fn affine(m: &mut RcfManager, x: &Numeral, q0: &BigRational, q1: &BigRational) -> Numeral {
    let c0 = m.mk_rational(q0);
    let c1 = m.mk_rational(q1);
    let t = m.mul(&c1, x).expect("mul");
    m.add(&c0, &t).expect("add")
}

fn coeff() -> impl Strategy<Value = BigRational> {
    (-6i64..=6, 1i64..=4).prop_map(|(n, d)| rat(n, d))
}

/// Three engine values mixing rational, eps- and pi-parts, driven by the
/// same generated coefficients.
fn mixed_triple(
    m: &mut RcfManager,
    cs: &[(BigRational, BigRational); 3],
) -> (Numeral, Numeral, Numeral) {
    let eps = m.mk_infinitesimal(Some("eps"));
    let pi = m.mk_pi().expect("pi");
    let a = affine(m, &eps, &cs[0].0, &cs[0].1);
    let b = affine(m, &pi, &cs[1].0, &cs[1].1);
    let c = affine(m, &eps, &cs[2].0, &cs[2].1);
    (a, b, c)
}

fn assert_engine_eq(m: &mut RcfManager, x: &Numeral, y: &Numeral) {
    let d = m.sub(x, y).expect("sub");
    assert!(m.is_zero(&d), "expected equal values");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_additive_group(c0 in coeff(), c1 in coeff(), c2 in coeff(), c3 in coeff(), c4 in coeff(), c5 in coeff()) {
        let mut m = RcfManager::new();
        let cs = [(c0, c1), (c2, c3), (c4, c5)];
        let (a, b, c) = mixed_triple(&mut m, &cs);
        let zero = Numeral::new();

        // a + 0 = a
        let s = m.add(&a, &zero).unwrap();
        assert_engine_eq(&mut m, &s, &a);
        // a + (-a) = 0
        let na = m.neg(&a);
        let z = m.add(&a, &na).unwrap();
        prop_assert!(m.is_zero(&z));
        // (a + b) + c = a + (b + c)
        let l = m.add(&a, &b).unwrap();
        let l = m.add(&l, &c).unwrap();
        let r = m.add(&b, &c).unwrap();
        let r = m.add(&a, &r).unwrap();
        assert_engine_eq(&mut m, &l, &r);
        // a + b = b + a
        let ab = m.add(&a, &b).unwrap();
        let ba = m.add(&b, &a).unwrap();
        assert_engine_eq(&mut m, &ab, &ba);
    }

    #[test]
    fn prop_multiplicative_laws(c0 in coeff(), c1 in coeff(), c2 in coeff(), c3 in coeff(), c4 in coeff(), c5 in coeff()) {
        let mut m = RcfManager::new();
        let cs = [(c0, c1), (c2, c3), (c4, c5)];
        let (a, b, c) = mixed_triple(&mut m, &cs);
        let one = m.mk_int(1);
        let zero = Numeral::new();

        // a * 1 = a, 0 * a = 0
        let p = m.mul(&a, &one).unwrap();
        assert_engine_eq(&mut m, &p, &a);
        let z = m.mul(&zero, &a).unwrap();
        prop_assert!(m.is_zero(&z));
        // (a * b) * c = a * (b * c)
        let l = m.mul(&a, &b).unwrap();
        let l = m.mul(&l, &c).unwrap();
        let r = m.mul(&b, &c).unwrap();
        let r = m.mul(&a, &r).unwrap();
        assert_engine_eq(&mut m, &l, &r);
        // a * b = b * a
        let ab = m.mul(&a, &b).unwrap();
        let ba = m.mul(&b, &a).unwrap();
        assert_engine_eq(&mut m, &ab, &ba);
    }

    #[test]
    fn prop_distribution(c0 in coeff(), c1 in coeff(), c2 in coeff(), c3 in coeff(), c4 in coeff(), c5 in coeff()) {
        let mut m = RcfManager::new();
        let cs = [(c0, c1), (c2, c3), (c4, c5)];
        let (a, b, c) = mixed_triple(&mut m, &cs);
        // a * (b + c) = a*b + a*c
        let bc = m.add(&b, &c).unwrap();
        let l = m.mul(&a, &bc).unwrap();
        let ab = m.mul(&a, &b).unwrap();
        let ac = m.mul(&a, &c).unwrap();
        let r = m.add(&ab, &ac).unwrap();
        assert_engine_eq(&mut m, &l, &r);
    }

    #[test]
    fn prop_inversion(c0 in coeff(), c1 in coeff()) {
        let mut m = RcfManager::new();
        let eps = m.mk_infinitesimal(Some("eps"));
        let a = affine(&mut m, &eps, &c0, &c1);
        if m.is_zero(&a) {
            return Ok(());
        }
        // a * inv(a) = 1
        let inv = m.inv(&a).unwrap();
        let p = m.mul(&a, &inv).unwrap();
        let one = m.mk_int(1);
        assert_engine_eq(&mut m, &p, &one);
        // inv(inv(a)) = a
        let back = m.inv(&inv).unwrap();
        assert_engine_eq(&mut m, &back, &a);
    }

    #[test]
    fn prop_power_laws(c0 in coeff(), c1 in coeff(), k in 0u32..5) {
        let mut m = RcfManager::new();
        let eps = m.mk_infinitesimal(Some("eps"));
        let a = affine(&mut m, &eps, &c0, &c1);
        // power(a, 0) = 1
        let p0 = m.power(&a, 0).unwrap();
        let one = m.mk_int(1);
        assert_engine_eq(&mut m, &p0, &one);
        // power(a, k + 1) = a * power(a, k)
        let pk = m.power(&a, k).unwrap();
        let pk1 = m.power(&a, k + 1).unwrap();
        let apk = m.mul(&a, &pk).unwrap();
        assert_engine_eq(&mut m, &pk1, &apk);
    }

    #[test]
    fn prop_sub_is_add_neg(c0 in coeff(), c1 in coeff(), c2 in coeff(), c3 in coeff()) {
        let mut m = RcfManager::new();
        let eps = m.mk_infinitesimal(Some("eps"));
        let pi = m.mk_pi().unwrap();
        let a = affine(&mut m, &eps, &c0, &c1);
        let b = affine(&mut m, &pi, &c2, &c3);
        let l = m.sub(&a, &b).unwrap();
        let nb = m.neg(&b);
        let r = m.add(&a, &nb).unwrap();
        assert_engine_eq(&mut m, &l, &r);
    }
}
