use std::ops::Range;
use serde::{Deserialize, Serialize};




/**
 * Identifier for a Cartesian axis
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    I,
    J,
}




/**
 * Identifier for the low or high side of an index space along some axis
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Lo,
    Hi,
}




// ============================================================================
impl Axis {

    pub const ALL: [Axis; 2] = [Axis::I, Axis::J];


    /**
     * Return the index offset of a unit step along this axis.
     */
    pub fn unit(self) -> (i64, i64) {
        match self {
            Axis::I => (1, 0),
            Axis::J => (0, 1),
        }
    }


    /**
     * Return the component of an index along this axis.
     */
    pub fn component(self, index: (i64, i64)) -> i64 {
        match self {
            Axis::I => index.0,
            Axis::J => index.1,
        }
    }
}




// ============================================================================
impl Side {

    pub const ALL: [Side; 2] = [Side::Lo, Side::Hi];


    /**
     * Return -1 for the low side and +1 for the high side: the sign of the
     * outward normal.
     */
    pub fn sign(self) -> i64 {
        match self {
            Side::Lo => -1,
            Side::Hi => 1,
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Side::Lo => Side::Hi,
            Side::Hi => Side::Lo,
        }
    }
}




/**
 * A box of zone indexes, `lo` inclusive and `hi` exclusive on both axes
 */
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpace {
    lo: (i64, i64),
    hi: (i64, i64),
}




// ============================================================================
impl IndexSpace {


    pub fn new(di: Range<i64>, dj: Range<i64>) -> Self {
        assert!(di.start <= di.end && dj.start <= dj.end, "inverted index range {:?} x {:?}", di, dj);
        Self { lo: (di.start, dj.start), hi: (di.end, dj.end) }
    }

    fn with_ranges(&self, f: impl Fn(Axis, Range<i64>) -> Range<i64>) -> Self {
        Self::new(f(Axis::I, self.range(Axis::I)), f(Axis::J, self.range(Axis::J)))
    }

    /**
     * Zone counts along `I` and `J`
     */
    pub fn dim(&self) -> (usize, usize) {
        let (ni, nj) = (self.hi.0 - self.lo.0, self.hi.1 - self.lo.1);
        (ni as usize, nj as usize)
    }

    pub fn len(&self) -> usize {
        self.dim().0 * self.dim().1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn start(&self) -> (i64, i64) {
        self.lo
    }

    pub fn end(&self) -> (i64, i64) {
        self.hi
    }

    pub fn range(&self, axis: Axis) -> Range<i64> {
        axis.component(self.lo)..axis.component(self.hi)
    }

    pub fn contains(&self, index: (i64, i64)) -> bool {
        Axis::ALL.iter().all(|&a| self.range(a).contains(&a.component(index)))
    }

    /**
     * Whether `other` lies entirely inside this box. Empty boxes are
     * treated like any other.
     */
    pub fn contains_space(&self, other: &Self) -> bool {
        Axis::ALL.iter().all(|&a| {
            let (outer, inner) = (self.range(a), other.range(a));
            outer.start <= inner.start && inner.end <= outer.end
        })
    }

    /**
     * Grow the box by `delta` zones on every side. A negative `delta`
     * shrinks it.
     */
    pub fn extend_all(&self, delta: i64) -> Self {
        self.with_ranges(|_, r| r.start - delta..r.end + delta)
    }

    /**
     * Grow the box on the high side of one axis only. With `delta = 1` this
     * gives the faces normal to `axis`; face `i` is the low face of zone `i`.
     */
    pub fn extend_upper(&self, delta: i64, axis: Axis) -> Self {
        self.with_ranges(|a, r| if a == axis { r.start..r.end + delta } else { r })
    }

    /**
     * The layer of `width` zones just outside one side of the box, without
     * corners.
     */
    pub fn adjacent(&self, axis: Axis, side: Side, width: i64) -> Self {
        self.with_ranges(|a, r| match (a == axis, side) {
            (false, _) => r,
            (true, Side::Lo) => r.start - width..r.start,
            (true, Side::Hi) => r.end..r.end + width,
        })
    }

    /**
     * The overlap of two boxes, `None` when they share no zone.
     */
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let lo = (self.lo.0.max(other.lo.0), self.lo.1.max(other.lo.1));
        let hi = (self.hi.0.min(other.hi.0), self.hi.1.min(other.hi.1));

        if lo.0 < hi.0 && lo.1 < hi.1 {
            Some(Self { lo, hi })
        } else {
            None
        }
    }

    pub fn refine_by(&self, factor: i64) -> Self {
        self.with_ranges(|_, r| r.start * factor..r.end * factor)
    }

    /**
     * The smallest box at `factor` times coarser resolution covering this
     * one. Division rounds towards negative infinity at `lo` and towards
     * positive infinity at `hi`.
     */
    pub fn coarsen_by(&self, factor: i64) -> Self {
        self.with_ranges(|_, r| r.start.div_euclid(factor)..-(-r.end).div_euclid(factor))
    }

    pub fn is_coarsenable_by(&self, factor: i64) -> bool {
        self.coarsen_by(factor).refine_by(factor) == *self
    }

    /**
     * Position of an index in a row-major buffer over this box (`J`
     * fastest).
     */
    pub fn row_major_offset(&self, index: (i64, i64)) -> usize {
        let (_, nj) = self.dim();
        (index.0 - self.lo.0) as usize * nj + (index.1 - self.lo.1) as usize
    }

    /**
     * Every index of the box, in row-major order.
     */
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        let dj = self.range(Axis::J);
        self.range(Axis::I).flat_map(move |i| dj.clone().map(move |j| (i, j)))
    }
}




pub fn range2d(di: Range<i64>, dj: Range<i64>) -> IndexSpace {
    IndexSpace::new(di, dj)
}




/**
 * Return the neighbor of an index, one step along `axis` towards `side`.
 */
pub fn step(index: (i64, i64), axis: Axis, side: Side) -> (i64, i64) {
    let (di, dj) = axis.unit();
    let s = side.sign();
    (index.0 + s * di, index.1 + s * dj)
}
