//! A small harness for building a [`crate::context::Context`] in tests, mirroring the thin
//! `TestSolver`-style helpers this crate's relatives keep in test-only modules.

use crate::context::Context;
use crate::domain::Domain;
use crate::options::ContextOptions;
use crate::reference::Reference;
use crate::reference::VariableId;

pub(crate) struct TestContext {
    pub(crate) context: Context,
}

impl TestContext {
    pub(crate) fn new() -> Self {
        TestContext {
            context: Context::new(ContextOptions::default()),
        }
    }

    pub(crate) fn new_var(&mut self, lb: i64, ub: i64) -> VariableId {
        self.context.new_variable(Domain::range(lb, ub))
    }

    pub(crate) fn new_bool(&mut self) -> VariableId {
        self.new_var(0, 1)
    }

    pub(crate) fn lit(v: VariableId) -> Reference {
        Reference::positive_reference(v)
    }
}
