//! Error type for the narrow class of caller-detectable-but-non-fatal situations described in
//! the error handling design: everything else is either the sticky [`crate::context::Context`]
//! unsat flag (a value, not a [`Result`]) or a programmer-error precondition that panics via
//! [`crate::asserts`].

use thiserror::Error;

use crate::reference::VariableId;

/// Failure modes that a caller can run into without those indicating a broken invariant in the
/// context itself.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresolveError {
    /// [`crate::union_find::AffineRelations::get_literal_representative`] was called with a
    /// reference that does not satisfy `can_be_literal`.
    #[error("variable {0:?} cannot be used as a literal")]
    NotALiteral(VariableId),
    /// [`crate::objective::Objective::substitute_variable_in_objective`] was asked to substitute
    /// a variable that is not currently a key of the objective map.
    #[error("variable {0:?} does not appear in the objective")]
    NotInObjective(VariableId),
}
