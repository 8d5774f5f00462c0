//! # presolve-context
//!
//! The shared mutable state of a constraint-programming presolver: variable domains, the
//! affine-relation union-find, the literal/value encoding table, the bipartite
//! constraint-variable usage graph, and the linear objective in canonical form.
//!
//! A presolver rewrites a combinatorial optimization model into an equivalent but simpler one
//! before a search engine attempts to solve it. Every rewrite rule reads and mutates the
//! [`Context`]; this crate owns the context and its invariants, not the rules themselves.
//!
//! ```rust
//! use presolve_context::Context;
//! use presolve_context::Domain;
//! use presolve_context::options::ContextOptions;
//!
//! let mut context = Context::new(ContextOptions::default());
//! let x = context.new_variable(Domain::range(0, 4));
//! context.intersect_domain(presolve_context::Reference::positive_reference(x), &Domain::range(2, 100));
//! assert_eq!(context.min_of(presolve_context::Reference::positive_reference(x)), Some(2));
//! ```

pub(crate) mod asserts;
pub(crate) mod basic_types;
mod context;
mod domain;
mod encoding;
mod error;
pub(crate) mod graph;
mod model;
mod objective;
pub mod options;
mod reference;
mod stats;
#[cfg(test)]
pub(crate) mod test_helper;
pub(crate) mod union_find;

pub use context::Context;
pub use domain::Domain;
pub use domain::DomainEvent;
pub use error::PresolveError;
pub use model::ConstraintId;
pub use model::ConstraintKind;
pub use model::ConstraintProto;
pub use model::ObjectiveProto;
pub use model::VariableProto;
pub use reference::Literal;
pub use reference::Reference;
pub use reference::VariableId;
