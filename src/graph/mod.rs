//! The bipartite constraint-variable usage graph: per constraint, which variables and intervals
//! it touches; inverse, per variable, which constraints touch it (with a sentinel entry for the
//! objective).

use fnv::FnvHashMap;
use fnv::FnvHashSet;

use crate::basic_types::KeyedVec;
use crate::model::ConstraintId;
use crate::reference::VariableId;

/// A constraint index, or the sentinel meaning "the objective". Mirrors the `-1` convention from
/// the data model without smuggling a magic number through call sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ConstraintRef {
    Constraint(ConstraintId),
    Objective,
}

#[derive(Default, Debug)]
pub(crate) struct ConstraintVariableGraph {
    constraint_to_vars: KeyedVec<ConstraintId, Vec<VariableId>>,
    constraint_to_intervals: KeyedVec<ConstraintId, Vec<u32>>,
    var_to_constraints: FnvHashMap<VariableId, FnvHashSet<ConstraintRef>>,
    var_to_num_linear1: FnvHashMap<VariableId, u32>,
    interval_usage: FnvHashMap<u32, u32>,
}

impl ConstraintVariableGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `used_vars`/`used_intervals` for a freshly appended constraint, growing the
    /// per-constraint vectors to cover it. Called by [`Self::update_new_constraints_variable_usage`]
    /// for a whole batch at once, or directly when a single constraint is appended.
    pub(crate) fn add_variable_usage(
        &mut self,
        ct: ConstraintId,
        mut used_vars: Vec<VariableId>,
        used_intervals: Vec<u32>,
        is_linear1: bool,
    ) {
        used_vars.sort_unstable();
        used_vars.dedup();

        self.constraint_to_vars.accomodate(ct, Vec::new());
        self.constraint_to_intervals.accomodate(ct, Vec::new());
        self.constraint_to_vars[ct] = used_vars.clone();
        self.constraint_to_intervals[ct] = used_intervals.clone();

        for &v in &used_vars {
            self.var_to_constraints
                .entry(v)
                .or_default()
                .insert(ConstraintRef::Constraint(ct));
        }

        for interval in used_intervals {
            *self.interval_usage.entry(interval).or_insert(0) += 1;
        }

        if is_linear1 {
            if let Some(&v) = used_vars.first() {
                *self.var_to_num_linear1.entry(v).or_insert(0) += 1;
            }
        }
    }

    /// Recomputes usage for an existing constraint and diffs it against the stored vector,
    /// touching only the variables whose membership actually changed.
    pub(crate) fn update_constraint_variable_usage(
        &mut self,
        ct: ConstraintId,
        mut new_used_vars: Vec<VariableId>,
        new_used_intervals: Vec<u32>,
    ) {
        new_used_vars.sort_unstable();
        new_used_vars.dedup();

        self.constraint_to_vars.accomodate(ct, Vec::new());
        let old_used_vars = std::mem::replace(&mut self.constraint_to_vars[ct], new_used_vars.clone());

        let (mut i, mut j) = (0, 0);
        while i < old_used_vars.len() || j < new_used_vars.len() {
            match (old_used_vars.get(i), new_used_vars.get(j)) {
                (Some(&old), Some(&new)) if old == new => {
                    i += 1;
                    j += 1;
                }
                (Some(&old), Some(&new)) if old < new => {
                    self.remove_usage(old, ct);
                    i += 1;
                }
                (Some(&old), None) => {
                    self.remove_usage(old, ct);
                    i += 1;
                }
                (_, Some(&new)) => {
                    self.var_to_constraints
                        .entry(new)
                        .or_default()
                        .insert(ConstraintRef::Constraint(ct));
                    j += 1;
                }
                (None, None) => unreachable!(),
            }
        }

        self.constraint_to_intervals.accomodate(ct, Vec::new());
        self.constraint_to_intervals[ct] = new_used_intervals;
    }

    fn remove_usage(&mut self, v: VariableId, ct: ConstraintId) {
        if let Some(set) = self.var_to_constraints.get_mut(&v) {
            set.remove(&ConstraintRef::Constraint(ct));
        }
    }

    /// Updates the linear-1 usage counter for a constraint whose single-variable-linear status
    /// may have changed between `was_linear1` and `is_linear1`.
    pub(crate) fn update_linear1_usage(&mut self, var: VariableId, was_linear1: bool, is_linear1: bool) {
        if was_linear1 && !is_linear1 {
            if let Some(count) = self.var_to_num_linear1.get_mut(&var) {
                *count = count.saturating_sub(1);
            }
        } else if is_linear1 && !was_linear1 {
            *self.var_to_num_linear1.entry(var).or_insert(0) += 1;
        }
    }

    /// Records that `var` participates in the objective (the `-1` sentinel).
    pub(crate) fn add_objective_usage(&mut self, var: VariableId) {
        self.var_to_constraints
            .entry(var)
            .or_default()
            .insert(ConstraintRef::Objective);
    }

    pub(crate) fn remove_objective_usage(&mut self, var: VariableId) {
        if let Some(set) = self.var_to_constraints.get_mut(&var) {
            set.remove(&ConstraintRef::Objective);
        }
    }

    pub(crate) fn used_vars(&self, ct: ConstraintId) -> &[VariableId] {
        if ct.index() < self.constraint_to_vars.len() {
            &self.constraint_to_vars[ct]
        } else {
            &[]
        }
    }

    pub(crate) fn constraints_touching(&self, v: VariableId) -> Option<&FnvHashSet<ConstraintRef>> {
        self.var_to_constraints.get(&v)
    }

    pub(crate) fn interval_usage(&self, interval: u32) -> u32 {
        self.interval_usage.get(&interval).copied().unwrap_or(0)
    }

    /// `true` iff `v` is touched by exactly one constraint, not the representative of a
    /// non-trivial equivalence class, and the caller is not keeping every feasible solution.
    pub(crate) fn variable_is_unique_and_removable(
        &self,
        v: VariableId,
        is_equivalence_representative_of_nontrivial_class: bool,
        keep_all_feasible_solutions: bool,
    ) -> bool {
        !keep_all_feasible_solutions
            && !is_equivalence_representative_of_nontrivial_class
            && self.constraints_touching(v).map(|s| s.len()).unwrap_or(0) == 1
    }

    /// As [`Self::variable_is_unique_and_removable`], but for a variable that also appears in the
    /// objective: exactly two usage entries, one of which is the objective sentinel.
    pub(crate) fn variable_with_cost_is_unique_and_removable(
        &self,
        v: VariableId,
        is_equivalence_representative_of_nontrivial_class: bool,
        keep_all_feasible_solutions: bool,
    ) -> bool {
        if keep_all_feasible_solutions || is_equivalence_representative_of_nontrivial_class {
            return false;
        }

        match self.constraints_touching(v) {
            Some(set) => set.len() == 2 && set.contains(&ConstraintRef::Objective),
            None => false,
        }
    }

    pub(crate) fn variable_is_not_used_anymore(&self, v: VariableId) -> bool {
        self.constraints_touching(v).map(|s| s.is_empty()).unwrap_or(true)
    }

    /// `true` iff every constraint touching `v` is counted as a single-variable linear
    /// (domain-restriction half-reification), i.e. removing `v`'s encoding constraints would
    /// make it unused.
    pub(crate) fn variable_is_only_used_in_encoding(&self, v: VariableId) -> bool {
        let touching = self.constraints_touching(v).map(|s| s.len()).unwrap_or(0);
        let linear1_count = self.var_to_num_linear1.get(&v).copied().unwrap_or(0) as usize;
        touching > 0 && touching == linear1_count
    }

    /// Debug invariant: for every constraint, the stored usage vector equals what a fresh
    /// recomputation (passed in by the caller, which owns the constraint list) would produce.
    pub(crate) fn constraint_variable_usage_is_consistent(
        &self,
        recompute: impl Fn(ConstraintId) -> Vec<VariableId>,
    ) -> bool {
        self.constraint_to_vars.keys().all(|ct| {
            let mut fresh = recompute(ct);
            fresh.sort_unstable();
            fresh.dedup();
            self.constraint_to_vars[ct] == fresh
        })
    }
}
