//! Field extensions: transcendental, infinitesimal, algebraic.
//!
//! Extensions are totally ordered by *rank*: the pair (kind ordinal, pool
//! index). Every rational-function value is built over exactly one extension,
//! and all of its coefficients have strictly lower rank, which keeps the
//! ownership graph acyclic.

use crate::interval::DyadicInterval;
use crate::producers::IntervalProducer;
use crate::value::Poly;
use std::cell::{Cell, RefCell};
use std::fmt;

/// Extension kinds, in rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum ExtKind {
    Transcendental = 0,
    Infinitesimal = 1,
    Algebraic = 2,
}

/// A field extension with its shared interval approximation.
pub(crate) struct ExtCell {
    /// Index in the pool of this extension's kind.
    pub(crate) idx: u32,
    /// Current dyadic enclosure of the extension element.
    pub(crate) interval: RefCell<DyadicInterval>,
    pub(crate) data: ExtData,
}

pub(crate) enum ExtData {
    Transcendental(TranscendentalExt),
    Infinitesimal(InfinitesimalExt),
    Algebraic(AlgebraicExt),
}

pub(crate) struct TranscendentalExt {
    pub(crate) name: Option<String>,
    /// Refinement counter: the producer has been queried up to this k.
    pub(crate) k: Cell<u32>,
    pub(crate) producer: Box<dyn IntervalProducer>,
}

pub(crate) struct InfinitesimalExt {
    pub(crate) name: Option<String>,
}

/// An algebraic extension: the unique root of `poly` inside the isolating
/// interval satisfying the sign conditions. Consumed by the algebraic hooks.
pub(crate) struct AlgebraicExt {
    pub(crate) poly: Poly,
    /// Sign conditions (polynomial, sign) pinning down the root.
    pub(crate) sign_conditions: Vec<(Poly, i32)>,
    /// Under-approximation: true implies the root is real.
    pub(crate) real: bool,
}

impl ExtCell {
    pub(crate) fn kind(&self) -> ExtKind {
        match self.data {
            ExtData::Transcendental(_) => ExtKind::Transcendental,
            ExtData::Infinitesimal(_) => ExtKind::Infinitesimal,
            ExtData::Algebraic(_) => ExtKind::Algebraic,
        }
    }

    /// Rank: kind first, then pool index.
    pub(crate) fn rank(&self) -> (ExtKind, u32) {
        (self.kind(), self.idx)
    }

    /// True if the extension element is known to be real (not depending on
    /// any infinitesimal). Approximate for algebraic extensions: `true` is
    /// always correct, `false` means unknown.
    pub(crate) fn is_real(&self) -> bool {
        match &self.data {
            ExtData::Transcendental(_) => true,
            ExtData::Infinitesimal(_) => false,
            ExtData::Algebraic(a) => a.real,
        }
    }
}

pub(crate) fn rank_lt(a: &ExtCell, b: &ExtCell) -> bool {
    a.rank() < b.rank()
}

pub(crate) fn rank_eq(a: &ExtCell, b: &ExtCell) -> bool {
    a.rank() == b.rank()
}

impl fmt::Debug for ExtCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            ExtData::Transcendental(t) => f
                .debug_struct("Transcendental")
                .field("idx", &self.idx)
                .field("name", &t.name)
                .field("k", &t.k.get())
                .finish(),
            ExtData::Infinitesimal(i) => f
                .debug_struct("Infinitesimal")
                .field("idx", &self.idx)
                .field("name", &i.name)
                .finish(),
            ExtData::Algebraic(_) => f
                .debug_struct("Algebraic")
                .field("idx", &self.idx)
                .finish(),
        }
    }
}
