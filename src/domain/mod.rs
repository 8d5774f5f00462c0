//! The domain store: an ordered union of disjoint closed intervals per variable, plus the
//! arithmetic (intersection, negation, translation, scaling, Minkowski sum) needed to propagate
//! those unions through affine expressions and the objective.

mod interval;
mod store;

use interval::Interval;

pub(crate) use store::DomainEvent;
pub(crate) use store::DomainStore;

/// The maximum number of intervals a [`Domain`] is allowed to carry before an operation that
/// would grow it further instead widens the result to its convex hull. Keeps every domain
/// operation linear in a bounded constant rather than in the number of holes a pathological
/// rewrite chain could otherwise accumulate.
const MAX_INTERVALS: usize = 128;

/// An ordered union of disjoint, non-touching closed integer intervals: `domain[i].upper_bound <
/// domain[i + 1].lower_bound - 1` for consecutive intervals. Never empty in a variable's domain
/// slot unless the context has recorded `is_unsat`; an explicitly empty [`Domain`] value is used
/// as an intermediate result (e.g. the output of an intersection) before that check happens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Domain {
    intervals: Vec<Interval>,
}

impl Domain {
    /// The empty domain.
    pub fn empty() -> Self {
        Domain {
            intervals: Vec::new(),
        }
    }

    /// The domain containing only `value`.
    pub fn fixed(value: i64) -> Self {
        Domain {
            intervals: vec![Interval::singleton(value)],
        }
    }

    /// The domain `[lower_bound, upper_bound]`. Empty when `lower_bound > upper_bound`.
    pub fn range(lower_bound: i64, upper_bound: i64) -> Self {
        if lower_bound > upper_bound {
            Domain::empty()
        } else {
            Domain {
                intervals: vec![Interval::new(lower_bound, upper_bound)],
            }
        }
    }

    /// Builds a domain from an arbitrary (possibly unsorted, possibly overlapping) collection of
    /// closed intervals, normalizing to the sorted, disjoint, non-touching representation.
    pub fn from_intervals(mut raw: Vec<(i64, i64)>) -> Self {
        raw.retain(|(lb, ub)| lb <= ub);
        raw.sort_unstable();

        let mut intervals: Vec<Interval> = Vec::with_capacity(raw.len());
        for (lb, ub) in raw {
            let candidate = Interval::new(lb, ub);
            match intervals.last_mut() {
                Some(last) if last.adjacent_or_overlapping(&candidate) => {
                    *last = last.hull(&candidate);
                }
                _ => intervals.push(candidate),
            }
        }

        Domain { intervals }.capped()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// `true` iff the domain contains exactly one value.
    pub fn is_fixed(&self) -> bool {
        self.intervals.len() == 1 && self.intervals[0].lower_bound == self.intervals[0].upper_bound
    }

    /// The number of disjoint intervals making up this domain.
    pub fn num_intervals(&self) -> usize {
        self.intervals.len()
    }

    /// The number of distinct values in the domain.
    pub fn size(&self) -> u64 {
        self.intervals
            .iter()
            .map(|i| (i.upper_bound - i.lower_bound) as u64 + 1)
            .sum()
    }

    /// `true` iff the domain contains exactly two values `{a, b}` with `a < b`.
    pub fn is_two_valued(&self) -> Option<(i64, i64)> {
        match self.intervals.as_slice() {
            [a, b] if a.is_empty() == false && b.is_empty() == false => {
                let a_is_point = a.lower_bound == a.upper_bound;
                let b_is_point = b.lower_bound == b.upper_bound;
                (a_is_point && b_is_point).then_some((a.lower_bound, b.lower_bound))
            }
            [single] => {
                (single.upper_bound == single.lower_bound + 1)
                    .then_some((single.lower_bound, single.upper_bound))
            }
            _ => None,
        }
    }

    pub fn min(&self) -> Option<i64> {
        self.intervals.first().map(|i| i.lower_bound)
    }

    pub fn max(&self) -> Option<i64> {
        self.intervals.last().map(|i| i.upper_bound)
    }

    pub fn contains(&self, value: i64) -> bool {
        self.intervals
            .binary_search_by(|interval| {
                if value < interval.lower_bound {
                    std::cmp::Ordering::Greater
                } else if value > interval.upper_bound {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// `true` iff `other` contains every value of `self`, i.e. intersecting `self` with `other`
    /// is a no-op.
    pub fn is_subset_of(&self, other: &Domain) -> bool {
        self.intersect(other) == *self
    }

    pub fn intersect(&self, other: &Domain) -> Domain {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < self.intervals.len() && j < other.intervals.len() {
            let a = self.intervals[i];
            let b = other.intervals[j];
            let overlap = a.intersect(&b);
            if !overlap.is_empty() {
                result.push(overlap);
            }

            if a.upper_bound < b.upper_bound {
                i += 1;
            } else {
                j += 1;
            }
        }

        Domain { intervals: result }.capped()
    }

    /// The domain of `-x` given the domain of `x`.
    pub fn negated(&self) -> Domain {
        let mut intervals: Vec<Interval> = self.intervals.iter().map(Interval::negated).collect();
        intervals.reverse();
        Domain { intervals }
    }

    /// The domain of `x + offset` given the domain of `x`.
    pub fn offset_by(&self, offset: i64) -> Domain {
        Domain {
            intervals: self
                .intervals
                .iter()
                .map(|i| i.offset_by(offset))
                .collect(),
        }
    }

    /// The domain of `scale * x` given the domain of `x`. `scale == 0` collapses to `{0}`
    /// whenever `self` is non-empty.
    pub fn scaled(&self, scale: i64) -> Domain {
        if scale == 0 {
            return if self.is_empty() {
                Domain::empty()
            } else {
                Domain::fixed(0)
            };
        }

        let mut intervals: Vec<Interval> = self.intervals.iter().map(|i| i.scaled(scale)).collect();
        if scale < 0 {
            intervals.reverse();
        }
        Domain { intervals }
    }

    /// The Minkowski sum `{a + b : a in self, b in other}`, widened to its hull once the exact
    /// union would exceed [`MAX_INTERVALS`].
    pub fn added(&self, other: &Domain) -> Domain {
        if self.is_empty() || other.is_empty() {
            return Domain::empty();
        }

        if self.intervals.len().saturating_mul(other.intervals.len()) > MAX_INTERVALS {
            return self.hull().added(&other.hull());
        }

        let mut raw = Vec::with_capacity(self.intervals.len() * other.intervals.len());
        for a in &self.intervals {
            for b in &other.intervals {
                let sum = a.added(b);
                raw.push((sum.lower_bound, sum.upper_bound));
            }
        }

        Domain::from_intervals(raw)
    }

    /// The convex hull of the domain: the single interval from its minimum to its maximum.
    pub fn hull(&self) -> Domain {
        match (self.min(), self.max()) {
            (Some(lb), Some(ub)) => Domain::range(lb, ub),
            _ => Domain::empty(),
        }
    }

    /// Merges adjacent intervals whose gap does not intersect `implied`, reducing the interval
    /// count without changing `self.intersect(implied)`. Used by objective canonicalization to
    /// keep `objective_domain` cheap to represent once the implied domain has already ruled out
    /// the gaps.
    pub fn simplify_given(&self, implied: &Domain) -> Domain {
        if self.intervals.is_empty() {
            return self.clone();
        }

        let mut merged: Vec<Interval> = Vec::with_capacity(self.intervals.len());
        merged.push(self.intervals[0]);

        for &next in &self.intervals[1..] {
            let last = *merged.last().unwrap();
            let gap = Interval::new(last.upper_bound.saturating_add(1), next.lower_bound - 1);
            let gap_is_reachable = !gap.is_empty() && !implied.intersect(&Domain::range(gap.lower_bound, gap.upper_bound)).is_empty();

            if gap_is_reachable {
                merged.push(next);
            } else {
                *merged.last_mut().unwrap() = last.hull(&next);
            }
        }

        Domain { intervals: merged }
    }

    /// Widens to the hull once the interval count exceeds the configured cap; the "too complex"
    /// fallback mentioned throughout the domain arithmetic spec.
    fn capped(self) -> Domain {
        if self.intervals.len() > MAX_INTERVALS {
            self.hull()
        } else {
            self
        }
    }

    /// Iterates the `(lower_bound, upper_bound)` pairs making up this domain, in increasing
    /// order. Used for proto emission and debug printing.
    pub fn iter_intervals(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.intervals.iter().map(|i| (i.lower_bound, i.upper_bound))
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "{{}}");
        }

        let parts: Vec<String> = self
            .intervals
            .iter()
            .map(|i| {
                if i.lower_bound == i.upper_bound {
                    format!("{}", i.lower_bound)
                } else {
                    format!("[{}, {}]", i.lower_bound, i.upper_bound)
                }
            })
            .collect();
        write!(f, "{}", parts.join(" u "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_narrows_domain() {
        let d = Domain::range(0, 4);
        let narrowed = d.intersect(&Domain::range(2, 100));
        assert_eq!(narrowed, Domain::range(2, 4));
    }

    #[test]
    fn intersect_with_superset_is_idempotent() {
        let d = Domain::from_intervals(vec![(0, 2), (5, 7)]);
        assert_eq!(d.intersect(&Domain::range(-10, 10)), d);
    }

    #[test]
    fn negated_domain_mirrors_holes() {
        let d = Domain::from_intervals(vec![(0, 2), (5, 7)]);
        assert_eq!(d.negated(), Domain::from_intervals(vec![(-7, -5), (-2, 0)]));
    }

    #[test]
    fn scaled_by_gcd_then_back_round_trips_on_support() {
        let d = Domain::from_intervals(vec![(0, 0), (6, 6), (9, 9)]);
        let scaled = d.scaled(3);
        assert_eq!(scaled, Domain::from_intervals(vec![(0, 0), (18, 18), (27, 27)]));
    }

    #[test]
    fn is_two_valued_detects_exactly_two_points() {
        let d = Domain::from_intervals(vec![(5, 5), (10, 10)]);
        assert_eq!(d.is_two_valued(), Some((5, 10)));

        let boolean = Domain::range(0, 1);
        assert_eq!(boolean.is_two_valued(), Some((0, 1)));

        let three = Domain::from_intervals(vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(three.is_two_valued(), None);
    }

    #[test]
    fn added_computes_minkowski_sum() {
        let a = Domain::from_intervals(vec![(0, 1)]);
        let b = Domain::from_intervals(vec![(0, 0), (10, 10)]);
        assert_eq!(a.added(&b), Domain::from_intervals(vec![(0, 1), (10, 11)]));
    }

    #[test]
    fn simplify_given_merges_unreachable_gaps() {
        let d = Domain::from_intervals(vec![(0, 0), (10, 10)]);
        let implied = Domain::range(0, 1);
        // The gap (1..=9) is not reachable under `implied`, so it can be folded away.
        let simplified = d.simplify_given(&implied);
        assert_eq!(simplified, Domain::range(0, 10));
        assert_eq!(simplified.intersect(&implied), d.intersect(&implied));
    }
}
