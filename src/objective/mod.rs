//! The linear objective in canonical form: a sparse coefficient map, an integer domain
//! constraining the raw value, and the floating offset/scaling factor mapping it to user-visible
//! units.

use fnv::FnvHashMap;

use crate::domain::Domain;
use crate::error::PresolveError;
use crate::reference::VariableId;

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[derive(Debug)]
pub(crate) struct Objective {
    objective_map: FnvHashMap<VariableId, i64>,
    objective_domain: Domain,
    objective_offset: f64,
    objective_scaling_factor: f64,
    objective_domain_is_constraining: bool,
}

impl Default for Objective {
    fn default() -> Self {
        Objective {
            objective_map: FnvHashMap::default(),
            objective_domain: Domain::range(i64::MIN, i64::MAX),
            objective_offset: 0.0,
            objective_scaling_factor: 1.0,
            objective_domain_is_constraining: false,
        }
    }
}

impl Objective {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn coefficient(&self, v: VariableId) -> i64 {
        self.objective_map.get(&v).copied().unwrap_or(0)
    }

    pub(crate) fn contains(&self, v: VariableId) -> bool {
        self.objective_map.contains_key(&v)
    }

    pub(crate) fn domain(&self) -> &Domain {
        &self.objective_domain
    }

    pub(crate) fn is_constraining(&self) -> bool {
        self.objective_domain_is_constraining
    }

    pub(crate) fn offset(&self) -> f64 {
        self.objective_offset
    }

    pub(crate) fn scaling_factor(&self) -> f64 {
        self.objective_scaling_factor
    }

    /// Populates the map from signed `(variable, coefficient)` pairs: a negative reference folds
    /// its sign into the coefficient (`coeff(¬v) = -coeff(v)`) so the map is keyed purely on
    /// positive variables. Zero coefficients, after folding, are dropped.
    pub(crate) fn read_from_proto(
        &mut self,
        terms: impl IntoIterator<Item = (crate::reference::Reference, i64)>,
        domain: Domain,
        offset: f64,
        scaling_factor: f64,
    ) -> impl Iterator<Item = VariableId> {
        self.objective_map.clear();
        for (reference, coeff) in terms {
            let signed_coeff = if reference.is_positive() { coeff } else { -coeff };
            if signed_coeff != 0 {
                *self.objective_map.entry(reference.variable()).or_insert(0) += signed_coeff;
            }
        }
        self.objective_map.retain(|_, c| *c != 0);

        self.objective_domain = if domain.is_empty() {
            Domain::range(i64::MIN, i64::MAX)
        } else {
            domain
        };
        self.objective_offset = offset;
        self.objective_scaling_factor = scaling_factor;
        self.objective_domain_is_constraining = !self.objective_domain.is_empty()
            && self.objective_domain != Domain::range(i64::MIN, i64::MAX);

        self.objective_map.keys().copied().collect::<Vec<_>>().into_iter()
    }

    /// Step 1 of canonicalization: fixes out variables that are unused elsewhere (when the
    /// domain is not constraining) and rewrites everything else through its affine
    /// representative. Returns the accumulated integer offset change and the set of variables
    /// that should be checked for having become unused.
    pub(crate) fn rewrite_through_representatives(
        &mut self,
        mut is_unused_outside_objective: impl FnMut(VariableId) -> bool,
        mut domain_of: impl FnMut(VariableId) -> Domain,
        mut affine_representative: impl FnMut(VariableId) -> (VariableId, i64, i64),
    ) -> (i64, Vec<VariableId>) {
        let snapshot: Vec<(VariableId, i64)> = self
            .objective_map
            .iter()
            .map(|(&v, &c)| (v, c))
            .collect();

        let mut offset_change: i64 = 0;
        let mut fixed_out = Vec::new();

        for (v, coeff) in snapshot {
            if coeff == 0 {
                continue;
            }

            if is_unused_outside_objective(v) && !self.objective_domain_is_constraining {
                let d = domain_of(v);
                let chosen = if coeff > 0 { d.min() } else { d.max() };
                if let Some(value) = chosen {
                    offset_change += coeff * value;
                    self.objective_map.remove(&v);
                    fixed_out.push(v);
                    continue;
                }
            }

            let (rep, coeff_rel, offset_rel) = affine_representative(v);
            if rep == v && coeff_rel == 1 && offset_rel == 0 {
                continue;
            }

            self.objective_map.remove(&v);
            offset_change += coeff * offset_rel;
            if coeff_rel != 0 {
                *self.objective_map.entry(rep).or_insert(0) += coeff * coeff_rel;
            }
        }

        self.objective_map.retain(|_, c| *c != 0);
        (offset_change, fixed_out)
    }

    /// Steps 2-5 of canonicalization. `domain_of` gives the current domain of a variable keyed
    /// on the (by now representative-only) objective map.
    pub(crate) fn canonicalize(&mut self, mut domain_of: impl FnMut(VariableId) -> Domain, offset_change: i64) -> bool {
        let mut implied_domain = Domain::fixed(0);
        let mut coeff_gcd: i64 = 0;

        let mut entries: Vec<(VariableId, i64)> =
            self.objective_map.iter().map(|(&v, &c)| (v, c)).collect();
        entries.sort_unstable();

        for (v, coeff) in &entries {
            let contribution = domain_of(*v).scaled(*coeff);
            implied_domain = implied_domain.added(&contribution);
            coeff_gcd = gcd(coeff_gcd, *coeff);
        }

        self.objective_domain = self
            .objective_domain
            .offset_by(-offset_change)
            .intersect(&implied_domain)
            .simplify_given(&implied_domain);

        if self.objective_domain.is_empty() {
            return false;
        }

        if coeff_gcd > 1 {
            for (_, coeff) in self.objective_map.iter_mut() {
                *coeff /= coeff_gcd;
            }
            self.objective_domain = Domain::from_intervals(
                self.objective_domain
                    .iter_intervals()
                    .map(|(lb, ub)| {
                        (
                            div_round_up(lb, coeff_gcd),
                            div_round_down(ub, coeff_gcd),
                        )
                    })
                    .collect(),
            );
            self.objective_scaling_factor *= coeff_gcd as f64;
            self.objective_offset /= coeff_gcd as f64;
            // Every term folded into `implied_domain` had a coefficient divisible by `coeff_gcd`,
            // so its bounds are too; rescale it the same way to compare against the now-divided
            // `objective_domain` below.
            implied_domain = Domain::from_intervals(
                implied_domain
                    .iter_intervals()
                    .map(|(lb, ub)| (lb / coeff_gcd, ub / coeff_gcd))
                    .collect(),
            );
        }

        let unconstrained_above = match self.objective_domain.max() {
            Some(max) => implied_domain
                .intersect(&Domain::range(i64::MIN, max))
                .is_subset_of(&self.objective_domain),
            None => true,
        };
        self.objective_domain_is_constraining = !unconstrained_above;

        true
    }

    /// Substitutes `var` out of the objective using the equality `var + eq_other = k` supplied
    /// as `eq_other: [(other_var, coeff)]` and `eq_constant: k`, where `coeff_in_eq` is `var`'s
    /// own coefficient in that equality.
    pub(crate) fn substitute_variable(
        &mut self,
        var: VariableId,
        coeff_in_eq: i64,
        eq_other: &[(VariableId, i64)],
        eq_constant: i64,
        remove_objective_usage: impl FnOnce(VariableId),
    ) -> Result<Vec<VariableId>, PresolveError> {
        let coeff_in_objective = self
            .objective_map
            .get(&var)
            .copied()
            .ok_or(PresolveError::NotInObjective(var))?;

        crate::asserts::presolve_assert_simple!(coeff_in_objective % coeff_in_eq == 0);
        let multiplier = coeff_in_objective / coeff_in_eq;

        let mut new_vars = Vec::new();
        for &(other, coeff) in eq_other {
            let delta = coeff * multiplier;
            let entry = self.objective_map.entry(other).or_insert(0);
            let was_zero = *entry == 0;
            *entry -= delta;
            if was_zero && *entry != 0 {
                new_vars.push(other);
            }
        }
        self.objective_map.retain(|_, c| *c != 0);

        self.objective_map.remove(&var);
        remove_objective_usage(var);

        self.objective_offset += eq_constant as f64 * multiplier as f64;
        self.objective_domain = self.objective_domain.offset_by(-(eq_constant * multiplier));
        self.objective_domain_is_constraining = true;

        Ok(new_vars)
    }

    /// Emits `(variable, coefficient)` pairs in sorted key order for determinism. Marks the
    /// model unsat (by returning `None`) if the objective domain has become empty.
    pub(crate) fn write_to_proto(&self) -> Option<Vec<(VariableId, i64)>> {
        if self.objective_domain.is_empty() {
            return None;
        }

        let mut entries: Vec<(VariableId, i64)> =
            self.objective_map.iter().map(|(&v, &c)| (v, c)).collect();
        entries.sort_unstable();
        Some(entries)
    }
}

fn div_round_down(n: i64, d: i64) -> i64 {
    debug_assert!(d > 0);
    n.div_euclid(d)
}

fn div_round_up(n: i64, d: i64) -> i64 {
    debug_assert!(d > 0);
    -((-n).div_euclid(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::StorageKey;
    use crate::reference::Reference;

    fn v(i: u32) -> VariableId {
        VariableId::create_from_index(i as usize)
    }

    #[test]
    fn read_from_proto_folds_signs_and_drops_zeros() {
        let mut objective = Objective::new();
        let terms = vec![
            (Reference::with_sign(v(0), true), 3),
            (Reference::with_sign(v(1), false), 6),
            (Reference::with_sign(v(2), true), 0),
        ];
        let _ = objective.read_from_proto(terms, Domain::range(i64::MIN, i64::MAX), 0.0, 1.0);

        assert_eq!(objective.coefficient(v(0)), 3);
        assert_eq!(objective.coefficient(v(1)), -6);
        assert!(!objective.contains(v(2)));
    }

    #[test]
    fn canonicalize_divides_by_gcd_and_scales() {
        let mut objective = Objective::new();
        let terms = vec![
            (Reference::with_sign(v(0), true), 3),
            (Reference::with_sign(v(1), true), 6),
            (Reference::with_sign(v(2), true), 9),
        ];
        let _ = objective.read_from_proto(terms, Domain::range(i64::MIN, i64::MAX), 0.0, 1.0);

        let domains = |_: VariableId| -> Domain { Domain::range(-5, 5) };

        let (offset_change, _) = objective.rewrite_through_representatives(
            |_| false,
            domains,
            |rep| (rep, 1, 0),
        );
        assert_eq!(offset_change, 0);

        let ok = objective.canonicalize(domains, offset_change);
        assert!(ok);

        assert_eq!(objective.coefficient(v(0)), 1);
        assert_eq!(objective.coefficient(v(1)), 2);
        assert_eq!(objective.coefficient(v(2)), 3);
        assert_eq!(objective.scaling_factor(), 3.0);
    }

    #[test]
    fn substitute_variable_applies_equality_and_reports_new_vars() {
        let mut objective = Objective::new();
        let terms = vec![(Reference::with_sign(v(0), true), 5)];
        let _ = objective.read_from_proto(terms, Domain::range(i64::MIN, i64::MAX), 0.0, 1.0);

        // x + 2y - z = 4, coeff_in_eq for x is 1.
        let new_vars = objective
            .substitute_variable(v(0), 1, &[(v(1), 2), (v(2), -1)], 4, |_| {})
            .unwrap();

        assert_eq!(objective.coefficient(v(1)), -10);
        assert_eq!(objective.coefficient(v(2)), 5);
        assert!(!objective.contains(v(0)));
        assert_eq!(objective.offset(), 20.0);
        assert!(new_vars.contains(&v(1)));
        assert!(new_vars.contains(&v(2)));
    }

    #[test]
    fn substitute_missing_variable_is_an_error() {
        let mut objective = Objective::new();
        let err = objective
            .substitute_variable(v(9), 1, &[], 0, |_| {})
            .unwrap_err();
        assert_eq!(err, PresolveError::NotInObjective(v(9)));
    }
}
