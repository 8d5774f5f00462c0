//! The six concrete end-to-end scenarios a presolve context must handle, driven purely through
//! the public [`presolve_context::Context`] API.

use presolve_context::options::ContextOptions;
use presolve_context::ConstraintId;
use presolve_context::Context;
use presolve_context::Domain;
use presolve_context::Reference;

fn new_context() -> Context {
    Context::new(ContextOptions::default())
}

#[test]
fn scenario_1_intersect_domain_narrows_and_marks_modified() {
    let mut ctx = new_context();
    let x = ctx.new_variable(Domain::range(0, 4));
    let x_ref = Reference::positive_reference(x);

    assert!(ctx.intersect_domain(x_ref, &Domain::range(2, i64::MAX)));

    assert_eq!(ctx.domain_of(x_ref), Domain::range(2, 4));
    assert_eq!(ctx.min_of(x_ref), Some(2));
    assert!(ctx.drain_modified_domains().contains_key(&x));
}

#[test]
fn scenario_2_boolean_equality_propagates_through_set_literal_true() {
    let mut ctx = new_context();
    let a = Reference::positive_reference(ctx.new_variable(Domain::range(0, 1)));
    let b = Reference::positive_reference(ctx.new_variable(Domain::range(0, 1)));

    ctx.store_boolean_equality(a, b);
    assert!(ctx.set_literal_true(a));

    assert!(ctx.literal_is_true(b));
}

#[test]
fn scenario_3_affine_equality_propagates_a_fixed_value() {
    let mut ctx = new_context();
    let x = ctx.new_variable(Domain::range(0, 2));
    let y = ctx.new_variable(Domain::range(0, 2));
    let x_ref = Reference::positive_reference(x);
    let y_ref = Reference::positive_reference(y);

    assert!(ctx.store_affine_relation(ConstraintId::new(0), x_ref, y_ref, 1, 0));
    assert!(ctx.intersect_domain(x_ref, &Domain::fixed(1)));

    assert_eq!(ctx.min_of(y_ref), Some(1));
    assert_eq!(ctx.max_of(y_ref), Some(1));
}

#[test]
fn scenario_4_two_valued_domain_encodes_as_negated_literals() {
    let mut ctx = new_context();
    let x = ctx.new_variable(Domain::from_intervals(vec![(5, 5), (10, 10)]));
    let x_ref = Reference::positive_reference(x);

    let l0 = ctx.get_or_create_literal_for_equality(x_ref, 5);
    let l1 = ctx.get_or_create_literal_for_equality(x_ref, 10);

    assert_eq!(l1, l0.negated());

    // The cached affine relation between x and the fresh Boolean must reproduce x = 5 when l0
    // holds and x = 10 when l1 holds, regardless of which of the two values the allocated
    // literal was defined relative to.
    let (rep, coeff, offset) = ctx.get_affine_relation(x_ref);
    let at_l0_true = if l0.is_positive() { coeff + offset } else { offset };
    let at_l1_true = if l1.is_positive() { coeff + offset } else { offset };
    assert_eq!(at_l0_true, 5);
    assert_eq!(at_l1_true, 10);
    let _ = rep;
}

#[test]
fn scenario_5_canonicalize_objective_divides_by_gcd() {
    let mut ctx = new_context();
    let x = ctx.new_variable(Domain::range(i64::MIN / 4, i64::MAX / 4));
    let y = ctx.new_variable(Domain::range(i64::MIN / 4, i64::MAX / 4));
    let z = ctx.new_variable(Domain::range(i64::MIN / 4, i64::MAX / 4));

    let proto = presolve_context::ObjectiveProto {
        vars: vec![
            Reference::positive_reference(x),
            Reference::positive_reference(y),
            Reference::positive_reference(z),
        ],
        coeffs: vec![3, 6, -9],
        domain: vec![],
        offset: 0.0,
        scaling_factor: 1.0,
    };
    ctx.read_objective_from_proto(&proto);

    // Anchor each variable with an ordinary constraint so canonicalization rewrites coefficients
    // instead of fixing variables it otherwise considers dead weight outside the objective.
    for &var in &[x, y, z] {
        let ct = ctx.add_constraint(presolve_context::ConstraintProto {
            kind: presolve_context::ConstraintKind::Linear {
                vars: vec![Reference::positive_reference(var)],
                coeffs: vec![1],
                domain: vec![(i64::MIN / 4, i64::MAX / 4)],
            },
            enforcement_literals: vec![],
        });
        ctx.add_variable_usage(ct);
    }

    assert!(ctx.canonicalize_objective());

    assert_eq!(ctx.objective_coefficient(x), 1);
    assert_eq!(ctx.objective_coefficient(y), 2);
    assert_eq!(ctx.objective_coefficient(z), -3);
}

#[test]
fn scenario_6_substitute_variable_in_objective_rewrites_the_map() {
    let mut ctx = new_context();
    let x = ctx.new_variable(Domain::range(-100, 100));
    let y = ctx.new_variable(Domain::range(-100, 100));
    let z = ctx.new_variable(Domain::range(-100, 100));

    let proto = presolve_context::ObjectiveProto {
        vars: vec![Reference::positive_reference(x)],
        coeffs: vec![5],
        domain: vec![],
        offset: 0.0,
        scaling_factor: 1.0,
    };
    ctx.read_objective_from_proto(&proto);

    // x + 2y - z = 4
    let eq = ctx.add_constraint(presolve_context::ConstraintProto {
        kind: presolve_context::ConstraintKind::Linear {
            vars: vec![
                Reference::positive_reference(x),
                Reference::positive_reference(y),
                Reference::positive_reference(z),
            ],
            coeffs: vec![1, 2, -1],
            domain: vec![(4, 4)],
        },
        enforcement_literals: vec![],
    });

    let new_vars = ctx.substitute_variable_in_objective(x, 1, eq).unwrap();

    assert_eq!(ctx.objective_coefficient(y), -10);
    assert_eq!(ctx.objective_coefficient(z), 5);
    assert_eq!(ctx.objective_coefficient(x), 0);
    assert_eq!(ctx.objective_offset(), 20.0);
    assert!(new_vars.len() == 2);
}
