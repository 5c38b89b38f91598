//! Property tests for the arithmetic engine:
//! - field laws over generated expressions in eps and pi
//! - order axioms and their interaction with arithmetic
//! - sign cross-checks against exact leading-coefficient reasoning

mod field_laws;
mod order_properties;
