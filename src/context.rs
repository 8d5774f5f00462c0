//! The context façade: the single mutable aggregate every presolve rule reads and mutates. Ties
//! together the domain store, the two union-finds, the encoding table, the constraint-variable
//! graph and the objective, and is the only thing rewrite rules ever hold a reference to.

use enumset::EnumSet;
use fnv::FnvHashMap;

use crate::domain::Domain;
use crate::domain::DomainEvent;
use crate::domain::DomainStore;
use crate::encoding::EncodingTable;
use crate::encoding::HalfEncodingKind;
use crate::encoding::HalfEncodingOutcome;
use crate::error::PresolveError;
use crate::graph::ConstraintVariableGraph;
use crate::model::ConstraintId;
use crate::model::ConstraintKind;
use crate::model::ConstraintProto;
use crate::model::ObjectiveProto;
use crate::objective::Objective;
use crate::options::ContextOptions;
use crate::reference::Reference;
use crate::reference::VariableId;
use crate::stats::PresolveStats;
use crate::union_find::AffineRelations;
use crate::union_find::VarEquivRelations;

/// The presolve context. Owns every piece of shared mutable state described in the module
/// documentation of its constituent types; see [`crate::domain`], [`crate::union_find`],
/// [`crate::encoding`], [`crate::graph`] and [`crate::objective`].
pub struct Context {
    domains: DomainStore,
    affine_relations: AffineRelations,
    var_equiv_relations: VarEquivRelations,
    encoding: EncodingTable,
    graph: ConstraintVariableGraph,
    objective: Objective,
    stats: PresolveStats,
    options: ContextOptions,
    constraints: crate::basic_types::KeyedVec<ConstraintId, ConstraintProto>,
    constant_to_ref: FnvHashMap<i64, VariableId>,
    abs_relations: FnvHashMap<VariableId, Reference>,
    is_unsat: bool,
}

fn used_vars_of(ct: &ConstraintProto) -> Vec<VariableId> {
    let mut vars: Vec<VariableId> = ct
        .enforcement_literals
        .iter()
        .map(|l| l.variable())
        .collect();

    match &ct.kind {
        ConstraintKind::Linear { vars: linear_vars, .. } => {
            vars.extend(linear_vars.iter().map(|r| r.variable()));
        }
        ConstraintKind::BoolAnd(lits) | ConstraintKind::BoolOr(lits) | ConstraintKind::BoolXor(lits) => {
            vars.extend(lits.iter().map(|r| r.variable()));
        }
        ConstraintKind::Interval { start, size, end } => {
            vars.push(start.variable());
            vars.push(size.variable());
            vars.push(end.variable());
        }
    }

    vars
}

fn is_linear1(ct: &ConstraintProto) -> bool {
    matches!(&ct.kind, ConstraintKind::Linear { vars, .. } if vars.len() == 1)
}

/// The interval indices `ct` references, mirroring [`used_vars_of`]. An interval constraint
/// defines the interval named by its own constraint index (the usual proto convention: other
/// constraints referencing an interval elsewhere would name it by that same index); no other
/// constraint kind here touches one.
fn used_intervals_of(ct: &ConstraintProto, id: ConstraintId) -> Vec<u32> {
    match &ct.kind {
        ConstraintKind::Interval { .. } => vec![id.index() as u32],
        _ => Vec::new(),
    }
}

impl Context {
    pub fn new(options: ContextOptions) -> Self {
        Context {
            domains: DomainStore::new(),
            affine_relations: AffineRelations::new(),
            var_equiv_relations: VarEquivRelations::new(),
            encoding: EncodingTable::new(),
            graph: ConstraintVariableGraph::new(),
            objective: Objective::new(),
            stats: PresolveStats::new(),
            options,
            constraints: crate::basic_types::KeyedVec::default(),
            constant_to_ref: FnvHashMap::default(),
            abs_relations: FnvHashMap::default(),
            is_unsat: false,
        }
    }

    // ---- Global flags -----------------------------------------------------------------

    pub fn is_unsat(&self) -> bool {
        self.is_unsat
    }

    pub fn set_unsat(&mut self) {
        self.is_unsat = true;
    }

    pub fn num_variables(&self) -> usize {
        self.domains.num_variables()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn drain_modified_domains(&mut self) -> FnvHashMap<VariableId, EnumSet<DomainEvent>> {
        self.domains.drain_modified()
    }

    pub fn update_rule_stats(&mut self, rule_name: &str) {
        self.stats.record(rule_name, self.options.enable_stats);
    }

    pub fn stats_by_rule_name(&self, rule_name: &str) -> u64 {
        self.stats.by_rule_name(rule_name)
    }

    pub fn num_presolve_operations(&self) -> u64 {
        self.stats.num_presolve_operations()
    }

    // ---- Domain store -------------------------------------------------------------------

    pub fn new_variable(&mut self, domain: Domain) -> VariableId {
        if domain.is_empty() {
            self.is_unsat = true;
        }
        self.domains.new_variable(domain)
    }

    /// Returns the canonical variable whose domain is exactly `{k}`, allocating it on first
    /// request and reusing it afterwards.
    pub fn get_or_create_constant(&mut self, k: i64) -> VariableId {
        if let Some(&v) = self.constant_to_ref.get(&k) {
            return v;
        }
        let v = self.new_variable(Domain::fixed(k));
        self.constant_to_ref.insert(k, v);
        v
    }

    pub fn can_be_literal(&self, r: Reference) -> bool {
        self.domains.domain(r.variable()).is_subset_of(&Domain::range(0, 1))
    }

    pub fn domain_of(&self, r: Reference) -> Domain {
        let d = self.domains.domain(r.variable()).clone();
        if r.is_positive() {
            d
        } else {
            d.negated()
        }
    }

    pub fn domain_contains(&self, r: Reference, value: i64) -> bool {
        self.domain_of(r).contains(value)
    }

    pub fn min_of(&self, r: Reference) -> Option<i64> {
        self.domain_of(r).min()
    }

    pub fn max_of(&self, r: Reference) -> Option<i64> {
        self.domain_of(r).max()
    }

    /// `min`/`max` of `offset + sum(coeff * reference)`, computed by interval arithmetic without
    /// materializing an intermediate [`Domain`].
    pub fn min_of_linear_expr(&self, terms: &[(Reference, i64)], offset: i64) -> Option<i64> {
        let mut total: i64 = offset;
        for &(r, c) in terms {
            let d = self.domain_of(r).scaled(c);
            total = total.saturating_add(d.min()?);
        }
        Some(total)
    }

    pub fn max_of_linear_expr(&self, terms: &[(Reference, i64)], offset: i64) -> Option<i64> {
        let mut total: i64 = offset;
        for &(r, c) in terms {
            let d = self.domain_of(r).scaled(c);
            total = total.saturating_add(d.max()?);
        }
        Some(total)
    }

    /// Intersects the domain named by `r` with `d` (negating `d` first when `r` is negative).
    /// Returns `false` and sets `is_unsat` if the result is empty.
    pub fn intersect_domain(&mut self, r: Reference, d: &Domain) -> bool {
        let signed_domain = if r.is_positive() { d.clone() } else { d.negated() };
        let ok = self.domains.intersect_domain(r.variable(), &signed_domain);
        if !ok {
            self.is_unsat = true;
        }
        ok
    }

    pub fn literal_is_true(&self, l: Reference) -> bool {
        self.domain_of(l) == Domain::fixed(1)
    }

    pub fn literal_is_false(&self, l: Reference) -> bool {
        self.domain_of(l) == Domain::fixed(0)
    }

    pub fn set_literal_true(&mut self, l: Reference) -> bool {
        self.intersect_domain(l, &Domain::fixed(1))
    }

    pub fn set_literal_false(&mut self, l: Reference) -> bool {
        self.intersect_domain(l, &Domain::fixed(0))
    }

    // ---- Affine-relation union-find ------------------------------------------------------

    /// Normalizes `rx = coeff*ry + offset` to positive references (absorbing signs into
    /// `coeff`/`offset`), skips fixed variables, and merges into both union-finds as
    /// appropriate. Returns `true` if a new relation was merged.
    pub fn store_affine_relation(
        &mut self,
        ct: ConstraintId,
        rx: Reference,
        ry: Reference,
        coeff: i64,
        offset: i64,
    ) -> bool {
        if self.domains.is_fixed(rx.variable()) || self.domains.is_fixed(ry.variable()) {
            return false;
        }

        // rx = coeff*ry + offset becomes, in terms of positive variables x = positive(rx),
        // y = positive(ry): sign(rx)*x = coeff*sign(ry)*y + offset.
        let sx = if rx.is_positive() { 1 } else { -1 };
        let sy = if ry.is_positive() { 1 } else { -1 };
        // x = (coeff*sy/sx)*y + offset/sx, and sx is +-1 so division is exact.
        let norm_coeff = coeff * sy * sx;
        let norm_offset = offset * sx;

        let x = rx.variable();
        let y = ry.variable();

        let can_be_literal = |v: VariableId| self.domains.domain(v).is_subset_of(&Domain::range(0, 1));

        let merged = self
            .affine_relations
            .add_relation(x, y, norm_coeff, norm_offset, can_be_literal);

        if merged && norm_coeff.abs() == 1 && norm_offset == 0 {
            self.var_equiv_relations
                .add_relation(x, y, norm_coeff, can_be_literal);
        }

        if merged {
            self.affine_relations.record_defining_constraint(x, ct);
            self.domains.mark_modified(x);
            self.domains.mark_modified(y);
        }

        merged
    }

    /// Looks up in the general repository, then rewrites the representative through the
    /// equivalence repository so the public representative is always an equivalence-class
    /// canonical. `r`'s own sign is applied on the way out.
    pub fn get_affine_relation(&mut self, r: Reference) -> (Reference, i64, i64) {
        let (rep, coeff, offset) = self.affine_relations.find(r.variable());
        let (equiv_rep, equiv_coeff, _) = self.var_equiv_relations.find(rep);

        // rep = equiv_coeff*equiv_rep (+0), so r.variable() = coeff*equiv_coeff*equiv_rep + offset.
        let total_coeff = coeff * equiv_coeff;

        let sign = if r.is_positive() { 1 } else { -1 };
        let out_coeff = total_coeff * sign;
        let out_offset = offset * sign;
        (Reference::positive_reference(equiv_rep), out_coeff, out_offset)
    }

    /// The constraint that was on file as defining `r`'s variable's affine relation when it was
    /// last merged, if any. Downstream passes use this to drop the constraint once the relation
    /// it expresses has been absorbed into the union-find.
    pub fn defining_constraint_of(&self, r: Reference) -> Option<ConstraintId> {
        self.affine_relations.defining_constraint(r.variable())
    }

    pub fn get_variable_representative(&mut self, r: Reference) -> Reference {
        let (rep, coeff, offset) = self.var_equiv_relations.find(r.variable());
        crate::asserts::presolve_assert_simple!(coeff == 1 || coeff == -1);
        crate::asserts::presolve_assert_eq_simple!(offset, 0);
        Reference::with_sign(rep, (coeff == 1) == r.is_positive())
    }

    /// Requires `can_be_literal(l)`. See the design notes on why one of the two sign choices is
    /// always uniquely consistent.
    pub fn get_literal_representative(&mut self, l: Reference) -> Result<Reference, PresolveError> {
        if !self.can_be_literal(l) {
            return Err(PresolveError::NotALiteral(l.variable()));
        }

        let (rep, c, o) = self.get_affine_relation(l.positive());
        if !self.can_be_literal(rep) {
            return Ok(l);
        }

        let positive_possible = o == 0 || c + o == 1;
        let negative_possible = o == 1 || c + o == 0;
        crate::asserts::presolve_assert_simple!(positive_possible != negative_possible);

        let rep_signed = if positive_possible { rep } else { rep.negated() };
        Ok(if l.is_positive() { rep_signed } else { rep_signed.negated() })
    }

    // ---- Encoding table ------------------------------------------------------------------

    pub fn get_or_create_literal_for_equality(&mut self, r: Reference, v: i64) -> Reference {
        if !self.domain_contains(r, v) {
            return self.false_literal();
        }

        let positive_var = r.variable();
        let signed_value = if r.is_positive() { v } else { -v };

        if let Some(existing) = self.encoding.get(positive_var, signed_value) {
            return self
                .get_literal_representative(existing)
                .unwrap_or(existing);
        }

        let domain = self.domains.domain(positive_var).clone();

        if domain.is_fixed() {
            let lit = self.true_literal();
            self.insert_var_value_encoding(lit, positive_var, signed_value);
            return lit;
        }

        if let Some((a, b)) = domain.is_two_valued() {
            let other_value = if signed_value == a { b } else { a };
            if let Some(other_lit) = self.encoding.get(positive_var, other_value) {
                let lit = other_lit.negated();
                self.insert_var_value_encoding(lit, positive_var, signed_value);
                return lit;
            }

            if a == 0 && b == 1 {
                let lit = Reference::with_sign(positive_var, signed_value == 1);
                self.insert_var_value_encoding(lit, positive_var, signed_value);
                return lit;
            }

            let fresh = self.new_variable(Domain::range(0, 1));
            let lit = Reference::positive_reference(fresh);
            self.insert_var_value_encoding(lit, positive_var, signed_value);
            return lit;
        }

        let fresh = self.new_variable(Domain::range(0, 1));
        let lit = Reference::positive_reference(fresh);
        self.insert_var_value_encoding(lit, positive_var, signed_value);
        lit
    }

    pub fn insert_var_value_encoding(&mut self, l: Reference, v: VariableId, val: i64) {
        if let Some(conflicting) = self.encoding.insert(v, val, l) {
            self.store_boolean_equality(l, conflicting);
        }

        let domain = self.domains.domain(v).clone();
        if let Some((a, b)) = domain.is_two_valued() {
            let other_value = if val == a { b } else { a };
            if self.encoding.get(v, other_value).is_none() {
                self.encoding.insert(v, other_value, l.negated());
                // v = other + (val - other) * positive(l): l=1 => v=val, l=0 => v=other, which
                // rearranges to `v + (other - val) * positive(l) = other`. Posted as a genuine
                // linear constraint so the defining-constraint id recorded below actually names
                // something in `self.constraints`, rather than aliasing whatever real constraint
                // the next `add_constraint` call happens to append.
                let ct = self.add_constraint(ConstraintProto {
                    kind: ConstraintKind::Linear {
                        vars: vec![Reference::positive_reference(v), l.positive()],
                        coeffs: vec![1, val - other_value],
                        domain: vec![(other_value, other_value)],
                    },
                    enforcement_literals: Vec::new(),
                });
                let _ = self.store_affine_relation(
                    ct,
                    Reference::positive_reference(v),
                    l.positive(),
                    val - other_value,
                    other_value,
                );
            }
            return;
        }

        if !domain.is_fixed() {
            self.insert_half_encoding(l, v, val, true);
            self.insert_half_encoding(l.negated(), v, val, false);
        }
    }

    pub fn insert_half_encoding(&mut self, l: Reference, v: VariableId, val: i64, imply_eq: bool) {
        let kind = if imply_eq {
            HalfEncodingKind::ImpliesEqual
        } else {
            HalfEncodingKind::ImpliesNotEqual
        };

        match self.encoding.insert_half_encoding(v, val, l, kind) {
            HalfEncodingOutcome::StillHalf => {}
            HalfEncodingOutcome::Promoted {
                value,
                literal,
                merge_with,
            } => {
                self.encoding.insert(v, value, literal);
                if let Some(conflicting) = merge_with {
                    self.store_boolean_equality(literal, conflicting);
                }
            }
        }
    }

    pub fn store_boolean_equality(&mut self, a: Reference, b: Reference) {
        if a == b {
            return;
        }
        if a == b.negated() {
            self.is_unsat = true;
            return;
        }

        if a.is_positive() == b.is_positive() {
            // a = b, i.e. a - b = 0.
            let ct = self.add_constraint(ConstraintProto {
                kind: ConstraintKind::Linear {
                    vars: vec![a.positive(), b.positive()],
                    coeffs: vec![1, -1],
                    domain: vec![(0, 0)],
                },
                enforcement_literals: Vec::new(),
            });
            let _ = self.store_affine_relation(ct, a.positive(), b.positive(), 1, 0);
        } else {
            // a = 1 - b, i.e. a + b = 1.
            let ct = self.add_constraint(ConstraintProto {
                kind: ConstraintKind::Linear {
                    vars: vec![a.positive(), b.positive()],
                    coeffs: vec![1, 1],
                    domain: vec![(1, 1)],
                },
                enforcement_literals: Vec::new(),
            });
            let _ = self.store_affine_relation(ct, a.positive(), b.positive(), -1, 1);
        }
    }

    /// Records `target = |r|`. Returns `false` if a conflicting relation was already on file for
    /// `r`'s variable.
    pub fn store_abs_relation(&mut self, target: Reference, r: Reference) -> bool {
        match self.abs_relations.get(&r.variable()) {
            Some(&existing) if existing != target => false,
            Some(_) => true,
            None => {
                self.abs_relations.insert(r.variable(), target);
                true
            }
        }
    }

    fn true_literal(&mut self) -> Reference {
        Reference::positive_reference(self.get_or_create_constant(1))
    }

    fn false_literal(&mut self) -> Reference {
        Reference::positive_reference(self.get_or_create_constant(0))
    }

    // ---- Constraint-variable graph -------------------------------------------------------

    /// Appends `ct` to the working model, returning its id.
    pub fn add_constraint(&mut self, ct: ConstraintProto) -> ConstraintId {
        let id = ConstraintId::new(self.constraints.len() as u32);
        self.constraints.push(ct);
        id
    }

    pub fn add_variable_usage(&mut self, ct: ConstraintId) {
        let used_vars = used_vars_of(&self.constraints[ct]);
        let used_intervals = used_intervals_of(&self.constraints[ct], ct);
        let linear1 = is_linear1(&self.constraints[ct]);
        self.graph.add_variable_usage(ct, used_vars, used_intervals, linear1);
    }

    pub fn update_constraint_variable_usage(&mut self, ct: ConstraintId) {
        let used_vars = used_vars_of(&self.constraints[ct]);
        let used_intervals = used_intervals_of(&self.constraints[ct], ct);
        self.graph.update_constraint_variable_usage(ct, used_vars, used_intervals);
    }

    pub fn update_linear1_usage(&mut self, var: VariableId, was_linear1: bool, is_linear1: bool) {
        self.graph.update_linear1_usage(var, was_linear1, is_linear1);
    }

    /// Called after a batch of `add_constraint` appends: registers usage for every constraint
    /// not yet known to the graph.
    pub fn update_new_constraints_variable_usage(&mut self) {
        for idx in 0..self.constraints.len() {
            let ct = ConstraintId::new(idx as u32);
            self.add_variable_usage(ct);
        }
    }

    pub fn constraint_variable_usage_is_consistent(&self) -> bool {
        self.graph
            .constraint_variable_usage_is_consistent(|ct| used_vars_of(&self.constraints[ct]))
    }

    /// How many times `interval` is referenced across the constraint list.
    pub fn interval_usage(&self, interval: u32) -> u32 {
        self.graph.interval_usage(interval)
    }

    pub fn variable_is_unique_and_removable(&mut self, r: Reference) -> bool {
        let v = r.variable();
        let (rep, _, _) = self.get_affine_relation(Reference::positive_reference(v));
        let is_nontrivial_representative = rep.variable() != v;
        self.graph.variable_is_unique_and_removable(
            v,
            is_nontrivial_representative,
            self.options.keep_all_feasible_solutions,
        )
    }

    pub fn variable_with_cost_is_unique_and_removable(&mut self, r: Reference) -> bool {
        let v = r.variable();
        let (rep, _, _) = self.get_affine_relation(Reference::positive_reference(v));
        let is_nontrivial_representative = rep.variable() != v;
        self.graph.variable_with_cost_is_unique_and_removable(
            v,
            is_nontrivial_representative,
            self.options.keep_all_feasible_solutions,
        )
    }

    pub fn variable_is_not_used_anymore(&self, r: Reference) -> bool {
        self.graph.variable_is_not_used_anymore(r.variable())
    }

    pub fn variable_is_only_used_in_encoding(&self, r: Reference) -> bool {
        self.graph.variable_is_only_used_in_encoding(r.variable())
    }

    // ---- Objective -------------------------------------------------------------------------

    pub fn read_objective_from_proto(&mut self, proto: &ObjectiveProto) {
        let terms: Vec<(Reference, i64)> = proto.vars.iter().copied().zip(proto.coeffs.iter().copied()).collect();
        let domain = Domain::from_intervals(proto.domain.clone());
        let vars: Vec<VariableId> = self
            .objective
            .read_from_proto(terms, domain, proto.offset, proto.scaling_factor)
            .collect();
        for v in vars {
            self.graph.add_objective_usage(v);
        }
    }

    pub fn canonicalize_objective(&mut self) -> bool {
        let domains = &self.domains;
        let affine_relations = &mut self.affine_relations;
        let var_equiv_relations = &mut self.var_equiv_relations;
        let graph = &self.graph;
        let keep_all = self.options.keep_all_feasible_solutions;

        let (offset_change, fixed_out) = self.objective.rewrite_through_representatives(
            |v| {
                !keep_all
                    && graph
                        .constraints_touching(v)
                        .map(|s| s.iter().all(|c| matches!(c, crate::graph::ConstraintRef::Objective)))
                        .unwrap_or(true)
            },
            |v| domains.domain(v).clone(),
            |v| {
                let (rep, coeff, offset) = affine_relations.find(v);
                let (equiv_rep, equiv_coeff, _) = var_equiv_relations.find(rep);
                (equiv_rep, coeff * equiv_coeff, offset)
            },
        );

        for v in fixed_out {
            self.graph.remove_objective_usage(v);
        }

        let domains = &self.domains;
        self.objective.canonicalize(|v| domains.domain(v).clone(), offset_change)
    }

    pub fn substitute_variable_in_objective(
        &mut self,
        var: VariableId,
        coeff_in_eq: i64,
        equality_ct: ConstraintId,
    ) -> Result<Vec<VariableId>, PresolveError> {
        let (other_terms, constant) = match &self.constraints[equality_ct].kind {
            ConstraintKind::Linear { vars, coeffs, domain } => {
                let terms: Vec<(VariableId, i64)> = vars
                    .iter()
                    .zip(coeffs.iter())
                    .filter(|(r, _)| r.variable() != var)
                    .map(|(r, &c)| (r.variable(), if r.is_positive() { c } else { -c }))
                    .collect();
                let constant = domain.first().map(|&(lb, _)| lb).unwrap_or(0);
                (terms, constant)
            }
            _ => (Vec::new(), 0),
        };

        let graph = &mut self.graph;
        self.objective
            .substitute_variable(var, coeff_in_eq, &other_terms, constant, |v| graph.remove_objective_usage(v))
    }

    pub fn write_objective_to_proto(&mut self) -> Option<ObjectiveProto> {
        let entries = self.objective.write_to_proto();
        match entries {
            None => {
                self.is_unsat = true;
                None
            }
            Some(entries) => {
                let (vars, coeffs) = entries
                    .into_iter()
                    .map(|(v, c)| (Reference::positive_reference(v), c))
                    .unzip();
                Some(ObjectiveProto {
                    vars,
                    coeffs,
                    domain: self.objective.domain().iter_intervals().collect(),
                    offset: self.objective.offset(),
                    scaling_factor: self.objective.scaling_factor(),
                })
            }
        }
    }

    pub fn objective_domain(&self) -> &Domain {
        self.objective.domain()
    }

    pub fn objective_coefficient(&self, v: VariableId) -> i64 {
        self.objective.coefficient(v)
    }

    pub fn objective_domain_is_constraining(&self) -> bool {
        self.objective.is_constraining()
    }

    pub fn objective_offset(&self) -> f64 {
        self.objective.offset()
    }
}
