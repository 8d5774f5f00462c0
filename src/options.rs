//! Construction-time options for a [`crate::context::Context`], mirroring the shape of the
//! solver-wide options struct this crate's relatives keep next to their engine: a small, mostly
//! boolean configuration record rather than a builder.

/// Options governing presolve behavior that is otherwise invisible from individual operation
/// signatures.
#[derive(Clone, Copy, Debug)]
pub struct ContextOptions {
    /// When set, no rewrite may drop a feasible solution, even at the cost of presolve strength.
    /// Disables unique-variable removal ([`crate::graph::ConstraintVariableGraph::variable_is_unique_and_removable`]
    /// and its cost-aware counterpart).
    pub keep_all_feasible_solutions: bool,
    /// When set, [`crate::context::Context::update_rule_stats`] logs and accumulates named rule
    /// counters; when clear, it is a no-op beyond the monotonic operation counter.
    pub enable_stats: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            keep_all_feasible_solutions: false,
            enable_stats: true,
        }
    }
}
