//! The external model schema the context consumes and produces: an abstract, proto-like shape
//! for variables, constraints and the objective. Parsing or serializing this shape to and from an
//! actual wire format is a concern of the surrounding driver, not this crate.

use crate::reference::Reference;

/// Identifies a constraint. Like [`crate::reference::VariableId`], stable and append-only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(u32);

impl ConstraintId {
    pub fn new(index: u32) -> Self {
        ConstraintId(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl crate::basic_types::StorageKey for ConstraintId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        ConstraintId(index as u32)
    }
}

/// A variable as it arrives from the model: a domain expressed as a sequence of closed-interval
/// bounds, interpreted as their union.
#[derive(Clone, Debug, Default)]
pub struct VariableProto {
    pub domain: Vec<(i64, i64)>,
}

/// The operands of a constraint, tagged by kind. The context only ever needs to know which
/// variables and which literals a constraint touches; the rewrite logic for each kind lives
/// outside this crate.
#[derive(Clone, Debug)]
pub enum ConstraintKind {
    Linear {
        vars: Vec<Reference>,
        coeffs: Vec<i64>,
        domain: Vec<(i64, i64)>,
    },
    BoolAnd(Vec<Reference>),
    BoolOr(Vec<Reference>),
    BoolXor(Vec<Reference>),
    Interval {
        start: Reference,
        size: Reference,
        end: Reference,
    },
}

/// A constraint: its operands plus the enforcement literals that must all hold for it to be
/// active. A constraint with any enforcement literal fixed to false is vacuous.
#[derive(Clone, Debug)]
pub struct ConstraintProto {
    pub kind: ConstraintKind,
    pub enforcement_literals: Vec<Reference>,
}

/// The linear objective as it arrives from (or is emitted to) the model.
#[derive(Clone, Debug, Default)]
pub struct ObjectiveProto {
    pub vars: Vec<Reference>,
    pub coeffs: Vec<i64>,
    pub domain: Vec<(i64, i64)>,
    pub offset: f64,
    pub scaling_factor: f64,
}
