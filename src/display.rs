//! Rendering of numerals.
//!
//! Three modes: fully expanded, compact (algebraic extensions appear as
//! `r!i` with a trailing dictionary of their definitions), and decimal at a
//! requested digit count. Decimal rendering refines the interval first and
//! prints a truncated endpoint; values that are infinite through an
//! infinitesimal render as `?` or `-?` by sign.

use crate::error::Result;
use crate::extension::{ExtCell, ExtData};
use crate::manager::{Numeral, RcfManager};
use crate::value::{self, is_rational_one, Val, ValueKind};
use num_traits::{Signed, Zero};
use rustc_hash::FxHashSet;
use std::fmt::Write as _;
use std::rc::Rc;

/// What stands in for the indeterminate when printing a polynomial.
enum VarName<'a> {
    /// The placeholder `#` used inside algebraic definitions.
    Free,
    /// The extension element itself.
    Ext(&'a Rc<ExtCell>, bool),
}

impl RcfManager {
    fn use_parenthesis(&self, v: &Val) -> bool {
        match v {
            None => false,
            Some(c) => match &c.kind {
                ValueKind::Rational(_) => false,
                ValueKind::RationalFunction(rf) => {
                    rf.num.len() > 1 || !is_rational_one(&rf.den[0]) || rf.den.len() > 1
                }
            },
        }
    }

    fn write_var(&self, out: &mut String, var: &VarName<'_>) {
        match var {
            VarName::Free => out.push('#'),
            VarName::Ext(ext, compact) => self.write_ext(out, ext, *compact),
        }
    }

    fn write_polynomial(&self, out: &mut String, p: &[Val], var: &VarName<'_>, compact: bool) {
        debug_assert!(!p.is_empty());
        let mut first = true;
        for i in (0..p.len()).rev() {
            if p[i].is_none() {
                continue;
            }
            if first {
                first = false;
            } else {
                out.push_str(" + ");
            }
            if i == 0 {
                self.write_value(out, &p[i], compact);
            } else {
                if !is_rational_one(&p[i]) {
                    if self.use_parenthesis(&p[i]) {
                        out.push('(');
                        self.write_value(out, &p[i], compact);
                        out.push_str(")*");
                    } else {
                        self.write_value(out, &p[i], compact);
                        out.push('*');
                    }
                }
                self.write_var(out, var);
                if i > 1 {
                    let _ = write!(out, "^{}", i);
                }
            }
        }
    }

    fn write_algebraic_def(&self, out: &mut String, ext: &Rc<ExtCell>, compact: bool) {
        let ExtData::Algebraic(a) = &ext.data else {
            return;
        };
        out.push_str("root(");
        self.write_polynomial(out, &a.poly, &VarName::Free, compact);
        let _ = write!(out, ", {}, {{", ext.interval.borrow());
        for (i, (p, s)) in a.sign_conditions.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_polynomial(out, p, &VarName::Free, compact);
            out.push_str(match s.signum() {
                -1 => " < 0",
                0 => " = 0",
                _ => " > 0",
            });
        }
        out.push_str("})");
    }

    fn write_ext(&self, out: &mut String, ext: &Rc<ExtCell>, compact: bool) {
        match &ext.data {
            ExtData::Transcendental(t) => match &t.name {
                Some(n) => out.push_str(n),
                None => {
                    let _ = write!(out, "t!{}", ext.idx);
                }
            },
            ExtData::Infinitesimal(i) => match &i.name {
                Some(n) => out.push_str(n),
                None => {
                    let _ = write!(out, "eps!{}", ext.idx);
                }
            },
            ExtData::Algebraic(_) => {
                if compact {
                    let _ = write!(out, "r!{}", ext.idx);
                } else {
                    self.write_algebraic_def(out, ext, compact);
                }
            }
        }
    }

    fn write_value(&self, out: &mut String, v: &Val, compact: bool) {
        match v {
            None => out.push('0'),
            Some(c) => match &c.kind {
                ValueKind::Rational(q) => {
                    let _ = write!(out, "{}", q);
                }
                ValueKind::RationalFunction(rf) => {
                    let var = VarName::Ext(&rf.ext, compact);
                    if rf.den.len() == 1 && is_rational_one(&rf.den[0]) {
                        self.write_polynomial(out, &rf.num, &var, compact);
                    } else if rf.num.len() == 1 && is_rational_one(&rf.num[0]) {
                        out.push_str("1/(");
                        self.write_polynomial(out, &rf.den, &var, compact);
                        out.push(')');
                    } else {
                        out.push('(');
                        self.write_polynomial(out, &rf.num, &var, compact);
                        out.push_str(")/(");
                        self.write_polynomial(out, &rf.den, &var, compact);
                        out.push(')');
                    }
                }
            },
        }
    }

    fn collect_algebraic_refs(&self, v: &Val, visited: &mut FxHashSet<u32>, found: &mut Vec<Rc<ExtCell>>) {
        let Some(c) = v else {
            return;
        };
        let ValueKind::RationalFunction(rf) = &c.kind else {
            return;
        };
        if let ExtData::Algebraic(a) = &rf.ext.data {
            if visited.insert(rf.ext.idx) {
                found.push(rf.ext.clone());
                for coeff in &a.poly {
                    self.collect_algebraic_refs(coeff, visited, found);
                }
            }
        }
        for coeff in rf.num.iter().chain(rf.den.iter()) {
            self.collect_algebraic_refs(coeff, visited, found);
        }
    }

    /// Fully expanded rendering.
    pub fn display(&self, a: &Numeral) -> String {
        let mut out = String::new();
        self.write_value(&mut out, &a.value, false);
        out
    }

    /// Compact rendering: shared algebraic extensions appear as `r!i`, with
    /// a trailing dictionary of their definitions.
    pub fn display_compact(&self, a: &Numeral) -> String {
        let mut visited = FxHashSet::default();
        let mut found = Vec::new();
        self.collect_algebraic_refs(&a.value, &mut visited, &mut found);
        let mut out = String::new();
        if found.is_empty() {
            self.write_value(&mut out, &a.value, true);
            return out;
        }
        found.sort_by_key(|e| e.rank());
        out.push('[');
        self.write_value(&mut out, &a.value, true);
        for ext in &found {
            let _ = write!(out, ", r!{} = ", ext.idx);
            self.write_algebraic_def(&mut out, ext, true);
        }
        out.push(']');
        out
    }

    /// Decimal rendering at `precision` digits, truncating. Refines the
    /// interval to about four bits per requested digit; a value that cannot
    /// be refined (infinite through an infinitesimal) renders as `?`/`-?`.
    pub fn display_decimal(&mut self, a: &Numeral, precision: u32) -> Result<String> {
        match &a.value {
            None => Ok("0".to_string()),
            Some(c) => match &c.kind {
                ValueKind::Rational(q) => Ok(rational_decimal(q, precision)),
                ValueKind::RationalFunction(_) => {
                    let r = self.scoped(|m| {
                        let cell = c.clone();
                        if m.refine_interval(&cell, precision * 4)? {
                            let i = cell.interval.borrow();
                            // Prefer the lower endpoint; fall back to the
                            // upper one when the lower is an integer.
                            if i.lower().is_int() {
                                Ok(Some(i.upper().display_decimal(precision)))
                            } else {
                                Ok(Some(i.lower().display_decimal(precision)))
                            }
                        } else {
                            Ok(None)
                        }
                    })?;
                    Ok(match r {
                        Some(s) => s,
                        None => {
                            if value::sign(&a.value) > 0 {
                                "?".to_string()
                            } else {
                                "-?".to_string()
                            }
                        }
                    })
                }
            },
        }
    }

    /// Render the current interval of the numeral.
    pub fn display_interval(&mut self, a: &Numeral) -> Result<String> {
        match &a.value {
            None => Ok("[0, 0]".to_string()),
            Some(c) => {
                self.ensure_interval(c)?;
                Ok(c.interval.borrow().to_string())
            }
        }
    }
}

/// Truncated decimal rendering of a rational, toward zero.
fn rational_decimal(q: &num_rational::BigRational, precision: u32) -> String {
    let mut out = String::new();
    if q.is_negative() {
        out.push('-');
    }
    let abs = q.abs();
    let int_part = abs.to_integer();
    out.push_str(&int_part.to_string());
    let mut frac = &abs - &abs.trunc();
    if frac.is_zero() || precision == 0 {
        return out;
    }
    out.push('.');
    for _ in 0..precision {
        if frac.is_zero() {
            break;
        }
        frac *= num_bigint::BigInt::from(10);
        let digit = frac.to_integer();
        out.push_str(&digit.to_string());
        frac -= num_rational::BigRational::from_integer(digit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn test_rational_decimal() {
        assert_eq!(rational_decimal(&rat(1, 2), 5), "0.5");
        assert_eq!(rational_decimal(&rat(-7, 4), 5), "-1.75");
        assert_eq!(rational_decimal(&rat(22, 7), 3), "3.142");
        assert_eq!(rational_decimal(&rat(5, 1), 3), "5");
        assert_eq!(rational_decimal(&rat(1, 3), 4), "0.3333");
    }

    #[test]
    fn test_display_zero_and_rational() {
        let mut m = RcfManager::new();
        let z = Numeral::default();
        assert_eq!(m.display(&z), "0");
        assert_eq!(m.display_decimal(&z, 3).unwrap(), "0");
        assert_eq!(m.display_interval(&z).unwrap(), "[0, 0]");
        let half = m.mk_rational(&rat(1, 2));
        assert_eq!(m.display(&half), "1/2");
        assert_eq!(m.display_decimal(&half, 4).unwrap(), "0.5");
        let three = m.mk_int(3);
        assert_eq!(m.display(&three), "3");
    }

    #[test]
    fn test_display_polynomial_forms() {
        let mut m = RcfManager::new();
        let eps = m.mk_infinitesimal(Some("eps"));
        let one = m.mk_int(1);
        // 1 + eps displays highest power first.
        let s = m.add(&eps, &one).unwrap();
        assert_eq!(m.display(&s), "eps + 1");
        let two_eps = m.add(&eps, &eps).unwrap();
        assert_eq!(m.display(&two_eps), "2*eps");
        // Negative coefficients ride along with the coefficient rendering.
        let neg = m.neg(&s);
        assert_eq!(m.display(&neg), "-1*eps + -1");
    }

    #[test]
    fn test_display_unnamed_infinitesimal() {
        let mut m = RcfManager::new();
        let d = m.mk_infinitesimal(None);
        assert_eq!(m.display(&d), "eps!0");
        assert_eq!(m.display_compact(&d), "eps!0");
    }
}
