//! Exact arithmetic over the real closure of the rationals, extended with
//! computable transcendental numbers (e.g. pi and e) and infinitesimals.
//!
//! Values are exact: every operation preserves the ability to decide the
//! sign and order of the result. Decisions are driven by interval
//! arithmetic over binary rationals, refined lazily until the question at
//! hand is settled; precision spent inside one operation is rolled back
//! when it finishes.
//!
//! # Examples
//!
//! ## Rationals, pi and ordering
//!
//! ```
//! use rcf::RcfManager;
//! use num_bigint::BigInt;
//! use num_rational::BigRational;
//!
//! let mut m = RcfManager::new();
//! let pi = m.mk_pi().unwrap();
//! assert_eq!(m.display(&pi), "pi");
//! assert_eq!(m.display_decimal(&pi, 5).unwrap(), "3.14159");
//!
//! let almost = m.mk_rational(&BigRational::new(BigInt::from(314), BigInt::from(100)));
//! assert!(m.gt(&pi, &almost).unwrap());
//! ```
//!
//! ## Infinitesimals
//!
//! ```
//! use rcf::RcfManager;
//!
//! let mut m = RcfManager::new();
//! let eps = m.mk_infinitesimal(Some("eps"));
//! let one = m.mk_int(1);
//!
//! // Positive, but below every positive rational.
//! assert_eq!(m.sign(&eps), 1);
//! assert!(m.lt(&eps, &one).unwrap());
//!
//! // 1/eps is larger than every rational.
//! let huge = m.inv(&eps).unwrap();
//! let big = m.mk_int(i64::MAX);
//! assert!(m.gt(&huge, &big).unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod arith;
pub mod config;
mod display;
pub mod dyadic;
pub mod error;
mod extension;
pub mod interval;
pub mod manager;
mod poly;
pub mod producers;
mod refine;
mod sign;
mod value;

pub use config::RcfConfig;
pub use error::{RcfError, Result};
pub use manager::{Numeral, RcfManager, RcfStats};
pub use producers::{EProducer, IntervalProducer, PiProducer};
