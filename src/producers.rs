//! Interval producers for computable transcendental constants.
//!
//! A producer is a capability object that, for any `k`, fills a rational
//! interval of width at most `1/2^k` containing the constant's true value.
//! Two built-ins are always available, for pi and e; embedders can plug in
//! their own producers through the same trait.

use crate::interval::RatInterval;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

/// A computable real: fills `out` with a rational interval of width at most
/// `1/2^k` containing the value.
///
/// Producers must be deterministic. They are invoked with strictly
/// increasing `k` by the refinement driver and need not be thread-safe.
pub trait IntervalProducer {
    /// Populate `out` with an enclosure of width at most `1/2^k`.
    fn produce(&self, k: u32, out: &mut RatInterval);
}

/// Producer for pi, via Machin's formula
/// `pi = 16*atan(1/5) - 4*atan(1/239)` with alternating-series tail bounds.
#[derive(Debug, Clone, Copy)]
pub struct PiProducer;

/// Producer for Euler's number e, via the series `sum 1/i!` with a factorial
/// tail bound.
#[derive(Debug, Clone, Copy)]
pub struct EProducer;

fn pow2_inv(k: u32) -> BigRational {
    BigRational::new(BigInt::one(), BigInt::one() << (k as usize))
}

/// Bounds for `atan(1/x)`, `x >= 2`, with error below `1/2^bits`:
/// partial sums of the alternating series, bracketed by the first omitted
/// term.
fn atan_inv_bounds(x: u64, bits: u32) -> (BigRational, BigRational) {
    let threshold = pow2_inv(bits);
    let x = BigInt::from(x);
    let x2 = &x * &x;
    let mut sum = BigRational::zero();
    let mut x_pow = x.clone(); // x^(2i+1)
    let mut i: u64 = 0;
    loop {
        let term = BigRational::new(BigInt::one(), BigInt::from(2 * i + 1) * &x_pow);
        if term < threshold {
            // |atan(1/x) - sum| < term by the alternating series bound.
            return (&sum - &term, &sum + &term);
        }
        if i % 2 == 0 {
            sum += term;
        } else {
            sum -= term;
        }
        x_pow *= &x2;
        i += 1;
    }
}

impl IntervalProducer for PiProducer {
    fn produce(&self, k: u32, out: &mut RatInterval) {
        // 16 and 4 amplify the per-series error; 6 guard bits absorb that.
        let (lo5, hi5) = atan_inv_bounds(5, k + 6);
        let (lo239, hi239) = atan_inv_bounds(239, k + 6);
        let sixteen = BigRational::from_integer(BigInt::from(16));
        let four = BigRational::from_integer(BigInt::from(4));
        out.lower = &sixteen * &lo5 - &four * &hi239;
        out.upper = &sixteen * &hi5 - &four * &lo239;
    }
}

impl IntervalProducer for EProducer {
    fn produce(&self, k: u32, out: &mut RatInterval) {
        let threshold = pow2_inv(k + 1);
        let mut sum = BigRational::zero();
        let mut factorial = BigInt::one();
        let mut i: u64 = 0;
        loop {
            sum += BigRational::new(BigInt::one(), factorial.clone());
            i += 1;
            factorial *= BigInt::from(i);
            // Tail after n terms is below 2/(n+1)!.
            let tail = BigRational::new(BigInt::from(2), factorial.clone());
            if tail < threshold {
                out.lower = sum.clone();
                out.upper = sum + tail;
                return;
            }
        }
    }
}
