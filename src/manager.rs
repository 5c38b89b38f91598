//! Manager and public façade.
//!
//! An [`RcfManager`] owns the extension pools, the cached constants, the
//! configuration, and the interval restore list. [`Numeral`] is the public
//! handle to a value; handles are cheap to clone and share structure. A
//! manager is single-threaded: only the cancel flag may be touched from
//! another thread.
//!
//! Every public operation that can refine intervals runs inside a *restore
//! scope*: intervals shrunk during the operation (beyond the configured
//! threshold) are saved on entry to the shrink and restored when the
//! operation finishes, successfully or not.

use crate::config::RcfConfig;
use crate::dyadic::Dyadic;
use crate::error::{RcfError, Result};
use crate::extension::{ExtCell, ExtData, ExtKind, InfinitesimalExt, TranscendentalExt};
use crate::interval::DyadicInterval;
use crate::producers::{EProducer, IntervalProducer, PiProducer};
use crate::value::{self, Poly, Val, ValueCell};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use smallvec::smallvec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A handle to an exact real (possibly non-Archimedean) number.
///
/// The default numeral is zero. Cloning shares the underlying value.
#[derive(Clone, Default)]
pub struct Numeral {
    pub(crate) value: Val,
}

impl Numeral {
    /// The zero numeral.
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for Numeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            None => write!(f, "Numeral(0)"),
            Some(_) => write!(f, "Numeral(..)"),
        }
    }
}

/// Operation counters, reset on demand.
#[derive(Debug, Clone, Default)]
pub struct RcfStats {
    /// Interval refinement invocations.
    pub refinements: u64,
    /// Sign determinations on freshly built values.
    pub sign_determinations: u64,
    /// Ordered comparisons.
    pub comparisons: u64,
    /// Intervals saved for scope restoration.
    pub interval_saves: u64,
}

/// Arithmetic manager for the real closure of the rationals extended with
/// computable transcendentals and infinitesimals.
pub struct RcfManager {
    pub(crate) config: RcfConfig,
    /// Magnitude threshold below which intervals are saved before refining.
    pub(crate) min_magnitude: i32,
    /// Finite stand-in bound for `+oo`: `2^inf_precision`.
    pub(crate) plus_inf_approx: Dyadic,
    /// Finite stand-in bound for `-oo`.
    pub(crate) minus_inf_approx: Dyadic,
    /// Extension pools, indexed by kind ordinal. Slots hold weak references;
    /// a slot dies with the last value over its extension.
    pools: [Vec<Weak<ExtCell>>; 3],
    one: Rc<ValueCell>,
    pi: Val,
    e: Val,
    /// Values whose intervals were saved in the current restore scope.
    pub(crate) to_restore: Vec<Rc<ValueCell>>,
    cancel: Arc<AtomicBool>,
    yield_hook: Option<Box<dyn FnMut()>>,
    pub(crate) stats: RcfStats,
}

impl RcfManager {
    /// Create a manager with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RcfConfig::default())
    }

    /// Create a manager with the given configuration.
    pub fn with_config(config: RcfConfig) -> Self {
        let one = Rc::new(ValueCell::new_rational(BigRational::new(
            BigInt::from(1),
            BigInt::from(1),
        )));
        let mut m = Self {
            min_magnitude: 0,
            plus_inf_approx: Dyadic::zero(),
            minus_inf_approx: Dyadic::zero(),
            pools: [Vec::new(), Vec::new(), Vec::new()],
            one,
            pi: None,
            e: None,
            to_restore: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            yield_hook: None,
            stats: RcfStats::default(),
            config: RcfConfig::default(),
        };
        m.update_params(config);
        m
    }

    /// Replace the configuration. Derived bounds are recomputed; live
    /// intervals are not touched.
    pub fn update_params(&mut self, config: RcfConfig) {
        self.min_magnitude = -(config.min_mag as i32);
        self.plus_inf_approx = Dyadic::two_pow(config.inf_precision as i32);
        self.minus_inf_approx = self.plus_inf_approx.neg();
        tracing::debug!(
            target: "rcf",
            initial_precision = config.initial_precision,
            div_precision = config.div_precision,
            "updated parameters"
        );
        self.config = config;
    }

    /// Current configuration.
    pub fn config(&self) -> &RcfConfig {
        &self.config
    }

    /// Operation counters.
    pub fn stats(&self) -> &RcfStats {
        &self.stats
    }

    /// Reset the operation counters.
    pub fn reset_stats(&mut self) {
        self.stats = RcfStats::default();
    }

    /// Set or clear the cancel flag. The next cooperation point raises
    /// [`RcfError::Cancelled`] while the flag is set.
    pub fn set_cancel(&self, flag: bool) {
        self.cancel.store(flag, Ordering::Relaxed);
    }

    /// Shared cancel flag, for setting from another thread.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Install (or remove) a callback invoked at every cooperation point.
    pub fn set_yield_hook(&mut self, hook: Option<Box<dyn FnMut()>>) {
        self.yield_hook = hook;
    }

    /// Cooperation point: observes the cancel flag and yields to the
    /// embedder. Called at the head of every long-running inner loop.
    pub(crate) fn checkpoint(&mut self) -> Result<()> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(RcfError::Cancelled);
        }
        if let Some(hook) = &mut self.yield_hook {
            hook();
        }
        Ok(())
    }

    /// The cached rational one.
    pub(crate) fn one_val(&self) -> Val {
        Some(self.one.clone())
    }

    /// Run `f` inside a restore scope: intervals saved during `f` are
    /// restored afterwards, on success and on error alike.
    pub(crate) fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let r = f(self);
        self.restore_saved_intervals();
        r
    }

    fn pool(&mut self, kind: ExtKind) -> &mut Vec<Weak<ExtCell>> {
        &mut self.pools[kind as usize]
    }

    /// Next free index in a pool, reusing cleaned-up trailing holes.
    fn next_idx(&mut self, kind: ExtKind) -> u32 {
        let pool = self.pool(kind);
        while pool.last().is_some_and(|w| w.strong_count() == 0) {
            pool.pop();
        }
        pool.len() as u32
    }

    fn register_ext(&mut self, ext: &Rc<ExtCell>) {
        debug_assert_eq!(ext.idx as usize, self.pool(ext.kind()).len());
        let weak = Rc::downgrade(ext);
        self.pool(ext.kind()).push(weak);
    }

    // ----- injection ------------------------------------------------------

    /// Numeral from a machine integer.
    pub fn mk_int(&mut self, n: i64) -> Numeral {
        Numeral {
            value: self.mk_int_value(n),
        }
    }

    /// Numeral from an arbitrary-precision integer.
    pub fn mk_integer(&mut self, n: &BigInt) -> Numeral {
        if n.is_zero() {
            return Numeral::default();
        }
        Numeral {
            value: self.mk_rational_value(BigRational::from_integer(n.clone())),
        }
    }

    /// Numeral from an exact rational.
    pub fn mk_rational(&mut self, q: &BigRational) -> Numeral {
        if q.is_zero() {
            return Numeral::default();
        }
        Numeral {
            value: self.mk_rational_value(q.clone()),
        }
    }

    /// Reset `a` to zero.
    pub fn reset(&self, a: &mut Numeral) {
        a.value = None;
    }

    /// `a <- b`.
    pub fn set(&self, a: &mut Numeral, b: &Numeral) {
        a.value = b.value.clone();
    }

    /// Exchange two numerals.
    pub fn swap(&self, a: &mut Numeral, b: &mut Numeral) {
        std::mem::swap(&mut a.value, &mut b.value);
    }

    // ----- constants ------------------------------------------------------

    /// Create a fresh infinitesimal: a positive element smaller than every
    /// positive rational. An anonymous infinitesimal displays as `eps!i`.
    pub fn mk_infinitesimal(&mut self, name: Option<&str>) -> Numeral {
        let idx = self.next_idx(ExtKind::Infinitesimal);
        let mut interval = DyadicInterval::full();
        interval.set_lower(Dyadic::zero(), true);
        interval.set_upper(
            Dyadic::two_pow(-(self.config.initial_precision as i32)),
            true,
        );
        let ext = Rc::new(ExtCell {
            idx,
            interval: RefCell::new(interval),
            data: ExtData::Infinitesimal(InfinitesimalExt {
                name: name.map(String::from),
            }),
        });
        self.register_ext(&ext);
        let value = self.mk_rf_constant(&ext);
        debug_assert_eq!(value::sign(&value), 1);
        debug_assert!(!value::is_real(&value));
        Numeral { value }
    }

    /// Create a fresh transcendental from a producer. The initial interval
    /// comes from the producer at `k = 0` and is refined until it excludes
    /// zero.
    pub fn mk_transcendental(
        &mut self,
        name: Option<&str>,
        producer: Box<dyn IntervalProducer>,
    ) -> Result<Numeral> {
        let idx = self.next_idx(ExtKind::Transcendental);
        let ext = Rc::new(ExtCell {
            idx,
            interval: RefCell::new(DyadicInterval::full()),
            data: ExtData::Transcendental(TranscendentalExt {
                name: name.map(String::from),
                k: Cell::new(0),
                producer,
            }),
        });
        self.register_ext(&ext);
        self.set_transcendental_enclosure(&ext, 0)?;
        loop {
            let contains = ext.interval.borrow().contains_zero();
            if !contains {
                break;
            }
            self.checkpoint()?;
            self.refine_transcendental_ext(&ext)?;
        }
        let value = self.mk_rf_constant(&ext);
        debug_assert!(value::is_real(&value));
        Ok(Numeral { value })
    }

    /// The constant pi. Memoized: one shared value per manager.
    pub fn mk_pi(&mut self) -> Result<Numeral> {
        if self.pi.is_none() {
            let n = self.mk_transcendental(Some("pi"), Box::new(PiProducer))?;
            self.pi = n.value;
        }
        Ok(Numeral {
            value: self.pi.clone(),
        })
    }

    /// The constant e. Memoized: one shared value per manager.
    pub fn mk_e(&mut self) -> Result<Numeral> {
        if self.e.is_none() {
            let n = self.mk_transcendental(Some("e"), Box::new(EProducer))?;
            self.e = n.value;
        }
        Ok(Numeral {
            value: self.e.clone(),
        })
    }

    // ----- arithmetic -----------------------------------------------------

    /// `a + b`.
    pub fn add(&mut self, a: &Numeral, b: &Numeral) -> Result<Numeral> {
        let value = self.scoped(|m| m.vadd(&a.value, &b.value))?;
        Ok(Numeral { value })
    }

    /// `a - b`.
    pub fn sub(&mut self, a: &Numeral, b: &Numeral) -> Result<Numeral> {
        let value = self.scoped(|m| m.vsub(&a.value, &b.value))?;
        Ok(Numeral { value })
    }

    /// `a * b`.
    pub fn mul(&mut self, a: &Numeral, b: &Numeral) -> Result<Numeral> {
        let value = self.scoped(|m| m.vmul(&a.value, &b.value))?;
        Ok(Numeral { value })
    }

    /// `a / b`. Fails with [`RcfError::DivisionByZero`] when `b` is zero.
    pub fn div(&mut self, a: &Numeral, b: &Numeral) -> Result<Numeral> {
        let value = self.scoped(|m| m.vdiv(&a.value, &b.value))?;
        Ok(Numeral { value })
    }

    /// `-a`.
    pub fn neg(&self, a: &Numeral) -> Numeral {
        Numeral {
            value: self.vneg(&a.value),
        }
    }

    /// `1/a`. Fails with [`RcfError::DivisionByZero`] when `a` is zero.
    pub fn inv(&mut self, a: &Numeral) -> Result<Numeral> {
        let value = self.scoped(|m| m.vinv(&a.value))?;
        Ok(Numeral { value })
    }

    /// `a^k` by binary exponentiation; `a^0 = 1`.
    pub fn power(&mut self, a: &Numeral, k: u32) -> Result<Numeral> {
        let value = self.scoped(|m| {
            let mut result = m.one_val();
            let mut base = a.value.clone();
            let mut exp = k;
            loop {
                m.checkpoint()?;
                if exp & 1 == 1 {
                    result = m.vmul(&result, &base)?;
                }
                exp >>= 1;
                if exp == 0 {
                    break;
                }
                base = m.vmul(&base, &base)?;
            }
            Ok(result)
        })?;
        Ok(Numeral { value })
    }

    /// `k`-th root. `k = 0` and even roots of negatives are domain errors;
    /// the general case defers to the algebraic-root hook.
    pub fn root(&mut self, a: &Numeral, k: u32) -> Result<Numeral> {
        let value = self.scoped(|m| {
            if k == 0 {
                return Err(RcfError::Domain("zeroth root is indeterminate"));
            }
            if k == 1 || a.value.is_none() {
                return Ok(a.value.clone());
            }
            if value::sign(&a.value) < 0 && k % 2 == 0 {
                return Err(RcfError::Domain("even root of negative number"));
            }
            // x^k - a
            let mut p: Poly = smallvec![m.vneg(&a.value)];
            for _ in 0..k - 1 {
                p.push(None);
            }
            p.push(m.one_val());
            m.mk_algebraic_root(p)
        })?;
        Ok(Numeral { value })
    }

    // ----- predicates and comparison --------------------------------------

    /// Sign of `a`: -1, 0 or +1.
    pub fn sign(&self, a: &Numeral) -> i32 {
        value::sign(&a.value)
    }

    /// True if `a` is zero.
    pub fn is_zero(&self, a: &Numeral) -> bool {
        self.sign(a) == 0
    }

    /// True if `a` is strictly positive.
    pub fn is_pos(&self, a: &Numeral) -> bool {
        self.sign(a) > 0
    }

    /// True if `a` is strictly negative.
    pub fn is_neg(&self, a: &Numeral) -> bool {
        self.sign(a) < 0
    }

    /// True if `a` is known to be an integer. Conservative: non-rational
    /// values report false.
    pub fn is_int(&self, a: &Numeral) -> bool {
        match &a.value {
            None => true,
            Some(c) => c.as_rational().is_some_and(|q| q.is_integer()),
        }
    }

    /// True if `a` does not depend on any infinitesimal extension.
    pub fn is_real(&self, a: &Numeral) -> bool {
        value::is_real(&a.value)
    }

    /// True if `a` is represented as a rational.
    pub fn is_rational(&self, a: &Numeral) -> bool {
        a.value.is_none() || value::is_nz_rational(&a.value)
    }

    /// Exact rational readback, when `a` is represented as a rational.
    pub fn to_rational(&self, a: &Numeral) -> Option<BigRational> {
        match &a.value {
            None => Some(BigRational::zero()),
            Some(c) => c.as_rational().cloned(),
        }
    }

    /// Three-way comparison of `a` and `b`.
    pub fn compare(&mut self, a: &Numeral, b: &Numeral) -> Result<i32> {
        self.scoped(|m| m.compare_values(&a.value, &b.value))
    }

    /// `a == b`.
    pub fn eq(&mut self, a: &Numeral, b: &Numeral) -> Result<bool> {
        Ok(self.compare(a, b)? == 0)
    }

    /// `a < b`.
    pub fn lt(&mut self, a: &Numeral, b: &Numeral) -> Result<bool> {
        Ok(self.compare(a, b)? < 0)
    }

    /// `a > b`.
    pub fn gt(&mut self, a: &Numeral, b: &Numeral) -> Result<bool> {
        Ok(self.compare(a, b)? > 0)
    }

    // ----- algebraic hooks ------------------------------------------------

    /// Hook: isolate the real roots of the polynomial with the given
    /// numeral coefficients.
    pub fn isolate_roots(&mut self, _coeffs: &[Numeral]) -> Result<Vec<Numeral>> {
        Err(RcfError::Unsupported("root isolation"))
    }

    /// Hook: a value strictly between `prev` and `next`.
    pub fn select(&mut self, _prev: &Numeral, _next: &Numeral) -> Result<Numeral> {
        Err(RcfError::Unsupported("root selection"))
    }
}

impl Default for RcfManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RcfManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RcfManager")
            .field("config", &self.config)
            .field("transcendentals", &self.pools[0].len())
            .field("infinitesimals", &self.pools[1].len())
            .field("algebraics", &self.pools[2].len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn test_int_predicates() {
        let mut m = RcfManager::new();
        let z = Numeral::new();
        assert!(m.is_zero(&z));
        assert!(m.is_int(&z));
        assert!(m.is_real(&z));
        let five = m.mk_int(5);
        assert!(m.is_int(&five));
        assert!(m.is_pos(&five));
        let half = m.mk_rational(&rat(1, 2));
        assert!(!m.is_int(&half));
        assert_eq!(m.to_rational(&half), Some(rat(1, 2)));
        let eps = m.mk_infinitesimal(None);
        assert!(!m.is_int(&eps));
        assert!(!m.is_real(&eps));
        assert!(m.is_rational(&half));
        assert!(!m.is_rational(&eps));
    }

    #[test]
    fn test_set_swap_reset() {
        let mut m = RcfManager::new();
        let mut a = m.mk_int(3);
        let mut b = m.mk_int(7);
        m.swap(&mut a, &mut b);
        assert_eq!(m.to_rational(&a), Some(rat(7, 1)));
        assert_eq!(m.to_rational(&b), Some(rat(3, 1)));
        m.set(&mut a, &b);
        assert_eq!(m.to_rational(&a), Some(rat(3, 1)));
        m.reset(&mut a);
        assert!(m.is_zero(&a));
    }

    #[test]
    fn test_power() {
        let mut m = RcfManager::new();
        let two = m.mk_int(2);
        let p = m.power(&two, 10).unwrap();
        assert_eq!(m.to_rational(&p), Some(rat(1024, 1)));
        let p0 = m.power(&two, 0).unwrap();
        assert_eq!(m.to_rational(&p0), Some(rat(1, 1)));
        let z = Numeral::new();
        let zp = m.power(&z, 3).unwrap();
        assert!(m.is_zero(&zp));
        let zp0 = m.power(&z, 0).unwrap();
        assert_eq!(m.to_rational(&zp0), Some(rat(1, 1)));
    }

    #[test]
    fn test_root_domain_errors() {
        let mut m = RcfManager::new();
        let four = m.mk_int(4);
        let neg = m.mk_int(-4);
        assert!(matches!(m.root(&four, 0), Err(RcfError::Domain(_))));
        assert!(matches!(m.root(&neg, 2), Err(RcfError::Domain(_))));
        // k = 1 and zero operands pass through.
        let r = m.root(&four, 1).unwrap();
        assert_eq!(m.to_rational(&r), Some(rat(4, 1)));
        let z = Numeral::new();
        let zr = m.root(&z, 3).unwrap();
        assert!(m.is_zero(&zr));
        // The general case is deferred to the stubbed hook.
        assert!(matches!(m.root(&four, 2), Err(RcfError::Unsupported(_))));
    }

    #[test]
    fn test_hooks_unsupported() {
        let mut m = RcfManager::new();
        let a = m.mk_int(1);
        let b = m.mk_int(2);
        assert!(matches!(
            m.isolate_roots(&[a.clone(), b.clone()]),
            Err(RcfError::Unsupported(_))
        ));
        assert!(matches!(m.select(&a, &b), Err(RcfError::Unsupported(_))));
    }

    #[test]
    fn test_cancellation() {
        let mut m = RcfManager::new();
        let third = m.mk_rational(&rat(1, 3));
        let pi = m.mk_pi().unwrap();
        m.set_cancel(true);
        let r = m.sub(&pi, &third);
        assert!(matches!(r, Err(RcfError::Cancelled)));
        m.set_cancel(false);
        let r = m.sub(&pi, &third).unwrap();
        assert_eq!(m.sign(&r), 1);
    }

    #[test]
    fn test_yield_hook_runs() {
        let mut m = RcfManager::new();
        let count = Rc::new(Cell::new(0u32));
        let c = count.clone();
        m.set_yield_hook(Some(Box::new(move || c.set(c.get() + 1))));
        let _pi = m.mk_pi().unwrap();
        assert!(count.get() > 0);
    }

    #[test]
    fn test_pi_memoized() {
        let mut m = RcfManager::new();
        let a = m.mk_pi().unwrap();
        let b = m.mk_pi().unwrap();
        // One shared transcendental slot, not two.
        assert_eq!(m.pools[ExtKind::Transcendental as usize].len(), 1);
        assert!(m.eq(&a, &b).unwrap());
    }

    #[test]
    fn test_extension_pool_reuse() {
        let mut m = RcfManager::new();
        let a = m.mk_infinitesimal(None);
        let b = m.mk_infinitesimal(None);
        assert_eq!(m.pools[ExtKind::Infinitesimal as usize].len(), 2);
        drop(b);
        // The trailing slot is dead; its index is reused.
        let c = m.mk_infinitesimal(None);
        assert_eq!(m.pools[ExtKind::Infinitesimal as usize].len(), 2);
        drop(a);
        drop(c);
        let _d = m.mk_infinitesimal(None);
        assert_eq!(m.pools[ExtKind::Infinitesimal as usize].len(), 1);
    }

    #[test]
    fn test_stats_move() {
        let mut m = RcfManager::new();
        let a = m.mk_rational(&rat(1, 3));
        let b = m.mk_rational(&rat(1, 2));
        let _ = m.compare(&a, &b).unwrap();
        assert_eq!(m.stats().comparisons, 1);
        m.reset_stats();
        assert_eq!(m.stats().comparisons, 0);
    }

    #[test]
    fn test_update_params() {
        let mut m = RcfManager::new();
        let mut cfg = RcfConfig::default();
        cfg.inf_precision = 8;
        cfg.min_mag = 32;
        m.update_params(cfg);
        assert_eq!(m.plus_inf_approx, Dyadic::from_int(256));
        assert_eq!(m.min_magnitude, -32);
    }
}
