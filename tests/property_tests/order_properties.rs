//! Order axioms and sign cross-checks.
//!
//! The engine's sign of `q0 + q1*eps` is checked against exact
//! non-Archimedean reasoning: the rational part decides unless it is zero,
//! in which case the eps coefficient decides.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use proptest::prelude::*;
use rcf::{Numeral, RcfManager};

fn rat(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

fn coeff() -> impl Strategy<Value = BigRational> {
    (-6i64..=6, 1i64..=4).prop_map(|(n, d)| rat(n, d))
}

fn affine(m: &mut RcfManager, x: &Numeral, q0: &BigRational, q1: &BigRational) -> Numeral {
    let c0 = m.mk_rational(q0);
    let c1 = m.mk_rational(q1);
    let t = m.mul(&c1, x).expect("mul");
    m.add(&c0, &t).expect("add")
}

fn expected_sign(q0: &BigRational, q1: &BigRational) -> i32 {
    if !q0.is_zero() {
        if q0.is_positive() {
            1
        } else {
            -1
        }
    } else if q1.is_zero() {
        0
    } else if q1.is_positive() {
        1
    } else {
        -1
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_sign_matches_leading_coefficients(q0 in coeff(), q1 in coeff()) {
        let mut m = RcfManager::new();
        let eps = m.mk_infinitesimal(Some("eps"));
        let a = affine(&mut m, &eps, &q0, &q1);
        prop_assert_eq!(m.sign(&a), expected_sign(&q0, &q1));
        // The interval-derived sign agrees with a fresh comparison to zero.
        let zero = Numeral::new();
        prop_assert_eq!(m.compare(&a, &zero).unwrap(), m.sign(&a));
    }

    #[test]
    fn prop_trichotomy(q0 in coeff(), q1 in coeff(), q2 in coeff(), q3 in coeff()) {
        let mut m = RcfManager::new();
        let eps = m.mk_infinitesimal(Some("eps"));
        let a = affine(&mut m, &eps, &q0, &q1);
        let b = affine(&mut m, &eps, &q2, &q3);
        let lt = m.lt(&a, &b).unwrap();
        let eq = m.eq(&a, &b).unwrap();
        let gt = m.gt(&a, &b).unwrap();
        prop_assert_eq!(u8::from(lt) + u8::from(eq) + u8::from(gt), 1);
        // Comparison is antisymmetric.
        prop_assert_eq!(m.compare(&a, &b).unwrap(), -m.compare(&b, &a).unwrap());
    }

    #[test]
    fn prop_order_respects_addition(
        q0 in coeff(), q1 in coeff(), q2 in coeff(), q3 in coeff(), q4 in coeff(), q5 in coeff()
    ) {
        let mut m = RcfManager::new();
        let eps = m.mk_infinitesimal(Some("eps"));
        let pi = m.mk_pi().unwrap();
        let a = affine(&mut m, &eps, &q0, &q1);
        let b = affine(&mut m, &eps, &q2, &q3);
        let c = affine(&mut m, &pi, &q4, &q5);
        if m.lt(&a, &b).unwrap() {
            let ac = m.add(&a, &c).unwrap();
            let bc = m.add(&b, &c).unwrap();
            prop_assert!(m.lt(&ac, &bc).unwrap());
        }
    }

    #[test]
    fn prop_order_respects_positive_scaling(
        q0 in coeff(), q1 in coeff(), q2 in coeff(), q3 in coeff(), q4 in coeff(), q5 in coeff()
    ) {
        let mut m = RcfManager::new();
        let eps = m.mk_infinitesimal(Some("eps"));
        let a = affine(&mut m, &eps, &q0, &q1);
        let b = affine(&mut m, &eps, &q2, &q3);
        let c = affine(&mut m, &eps, &q4, &q5);
        if m.lt(&a, &b).unwrap() && m.is_pos(&c) {
            let ac = m.mul(&a, &c).unwrap();
            let bc = m.mul(&b, &c).unwrap();
            prop_assert!(m.lt(&ac, &bc).unwrap());
        }
    }

    #[test]
    fn prop_eps_below_every_positive_rational(n in 1i64..=1_000_000) {
        let mut m = RcfManager::new();
        let eps = m.mk_infinitesimal(Some("eps"));
        let q = m.mk_rational(&rat(1, n));
        prop_assert!(m.lt(&eps, &q).unwrap());
        let huge = m.inv(&eps).unwrap();
        let big = m.mk_rational(&rat(n, 1));
        prop_assert!(m.gt(&huge, &big).unwrap());
    }
}
