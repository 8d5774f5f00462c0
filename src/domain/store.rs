//! The indexed collection of per-variable [`Domain`]s, plus the bookkeeping (modified-domain
//! tracking, the sticky unsat flag) that presolve rules expect to find alongside it.

use enumset::EnumSet;
use enumset::EnumSetType;
use fnv::FnvHashMap;

use super::Domain;
use crate::basic_types::KeyedVec;
use crate::reference::VariableId;

/// A description of the kind of narrowing a domain went through, mirroring the teacher's
/// `IntDomainEvent` bit-set of watch reasons. Several may apply to the same [`DomainStore::intersect_domain`]
/// call (e.g. narrowing both bounds at once also collapses to `Assign`).
#[derive(Debug, EnumSetType)]
pub enum DomainEvent {
    /// The domain collapsed to a single value.
    Assign,
    /// The lower bound tightened.
    LowerBound,
    /// The upper bound tightened.
    UpperBound,
    /// A value strictly between the bounds was removed without moving either bound.
    Removal,
}

/// Owns one [`Domain`] per variable and tracks which variables have had their domain narrowed,
/// and how, since the last [`DomainStore::drain_modified`] call, so that rules can be re-woken
/// only where something actually changed and only for the event kinds they care about.
#[derive(Default, Debug)]
pub(crate) struct DomainStore {
    domains: KeyedVec<VariableId, Domain>,
    modified: FnvHashMap<VariableId, EnumSet<DomainEvent>>,
}

impl DomainStore {
    pub(crate) fn new() -> Self {
        DomainStore {
            domains: KeyedVec::default(),
            modified: FnvHashMap::default(),
        }
    }

    /// Allocates a new variable with the given initial domain, returning its id.
    pub(crate) fn new_variable(&mut self, initial_domain: Domain) -> VariableId {
        let id = VariableId::create_from_index(self.domains.len());
        self.domains.push(initial_domain);
        id
    }

    pub(crate) fn num_variables(&self) -> usize {
        self.domains.len()
    }

    pub(crate) fn domain(&self, variable: VariableId) -> &Domain {
        &self.domains[variable]
    }

    pub(crate) fn contains(&self, variable: VariableId, value: i64) -> bool {
        self.domains[variable].contains(value)
    }

    pub(crate) fn is_fixed(&self, variable: VariableId) -> bool {
        self.domains[variable].is_fixed()
    }

    /// Intersects `variable`'s domain with `with`, recording which [`DomainEvent`]s fired when
    /// the domain actually shrank. Returns `false` when the intersection is empty, signaling
    /// unsatisfiability to the caller (the sticky unsat flag itself lives on
    /// [`crate::context::Context`], not here, since emptiness alone does not say which rule
    /// caused it).
    pub(crate) fn intersect_domain(&mut self, variable: VariableId, with: &Domain) -> bool {
        let current = &self.domains[variable];
        if current.is_subset_of(with) {
            return true;
        }

        let old_min = current.min();
        let old_max = current.max();
        let narrowed = current.intersect(with);
        let is_nonempty = !narrowed.is_empty();

        let mut events = EnumSet::empty();
        if narrowed.min() != old_min {
            events |= DomainEvent::LowerBound;
        }
        if narrowed.max() != old_max {
            events |= DomainEvent::UpperBound;
        }
        if narrowed.is_fixed() {
            events |= DomainEvent::Assign;
        }
        if events.is_empty() && is_nonempty {
            // Bounds held but an interior value vanished (a hole was punched in the domain).
            events |= DomainEvent::Removal;
        }

        self.domains[variable] = narrowed;
        *self.modified.entry(variable).or_insert(EnumSet::empty()) |= events;
        is_nonempty
    }

    /// Restricts `variable`'s domain to exactly `{value}`. Equivalent to
    /// `intersect_domain(variable, &Domain::fixed(value))`, named separately because fixing a
    /// literal to true/false is the overwhelmingly common case callers reach for.
    pub(crate) fn fix(&mut self, variable: VariableId, value: i64) -> bool {
        self.intersect_domain(variable, &Domain::fixed(value))
    }

    /// Drains and returns the map of variables modified since the last call to the [`DomainEvent`]s
    /// that fired for each, leaving the tracking map empty.
    pub(crate) fn drain_modified(&mut self) -> FnvHashMap<VariableId, EnumSet<DomainEvent>> {
        std::mem::take(&mut self.modified)
    }

    /// Explicitly marks `variable` as modified by every [`DomainEvent`] kind, for call sites
    /// (affine merges) that change a variable's representative without narrowing its domain
    /// directly: a rule watching any reason should still be revisited.
    pub(crate) fn mark_modified(&mut self, variable: VariableId) {
        *self.modified.entry(variable).or_insert(EnumSet::empty()) |= EnumSet::all();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (VariableId, &Domain)> {
        self.domains.keys().map(|key| (key, &self.domains[key]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_domain_tracks_modification_only_on_change() {
        let mut store = DomainStore::new();
        let v = store.new_variable(Domain::range(0, 10));

        assert!(store.intersect_domain(v, &Domain::range(-5, 20)));
        assert!(store.drain_modified().is_empty());

        assert!(store.intersect_domain(v, &Domain::range(0, 5)));
        let modified = store.drain_modified();
        assert!(modified.contains_key(&v));
        assert!(modified[&v].contains(DomainEvent::UpperBound));
        assert!(!modified[&v].contains(DomainEvent::LowerBound));
        assert_eq!(store.domain(v), &Domain::range(0, 5));
    }

    #[test]
    fn intersect_domain_signals_emptiness() {
        let mut store = DomainStore::new();
        let v = store.new_variable(Domain::range(0, 2));
        assert!(!store.intersect_domain(v, &Domain::range(5, 9)));
        assert!(store.domain(v).is_empty());
    }

    #[test]
    fn fix_narrows_to_singleton() {
        let mut store = DomainStore::new();
        let v = store.new_variable(Domain::range(0, 10));
        assert!(store.fix(v, 7));
        assert!(store.domain(v).is_fixed());
        assert_eq!(store.domain(v).min(), Some(7));
        let modified = store.drain_modified();
        assert!(modified[&v].contains(DomainEvent::Assign));
    }

    #[test]
    fn removing_an_interior_hole_without_moving_bounds_is_a_removal_event() {
        let mut store = DomainStore::new();
        let v = store.new_variable(Domain::from_intervals(vec![(0, 10)]));
        assert!(store.intersect_domain(v, &Domain::from_intervals(vec![(0, 4), (6, 10)])));
        let modified = store.drain_modified();
        assert!(modified[&v].contains(DomainEvent::Removal));
        assert!(!modified[&v].contains(DomainEvent::LowerBound));
        assert!(!modified[&v].contains(DomainEvent::UpperBound));
    }

    #[test]
    fn mark_modified_sets_every_event_kind() {
        let mut store = DomainStore::new();
        let v = store.new_variable(Domain::range(0, 10));
        store.mark_modified(v);
        let modified = store.drain_modified();
        assert_eq!(modified[&v], EnumSet::all());
    }
}
