//! Presolve rule statistics: a named counter per rule, plus the monotonic operation counter the
//! driver uses to schedule cheap vs. expensive passes.

use fnv::FnvHashMap;

#[derive(Default, Debug)]
pub(crate) struct PresolveStats {
    by_rule_name: FnvHashMap<String, u64>,
    num_presolve_operations: u64,
}

impl PresolveStats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for `rule_name`, logging at trace level when `enabled`. Always
    /// bumps the monotonic operation counter regardless of `enabled`, since the driver's
    /// cheap/expensive scheduling decision does not depend on whether per-rule stats are kept.
    pub(crate) fn record(&mut self, rule_name: &str, enabled: bool) {
        self.num_presolve_operations += 1;

        if !enabled {
            return;
        }

        let count = self.by_rule_name.entry(rule_name.to_owned()).or_insert(0);
        *count += 1;
        log::trace!("presolve rule '{rule_name}' fired ({count} total)");
    }

    pub(crate) fn by_rule_name(&self, rule_name: &str) -> u64 {
        self.by_rule_name.get(rule_name).copied().unwrap_or(0)
    }

    pub(crate) fn num_presolve_operations(&self) -> u64 {
        self.num_presolve_operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_per_rule_and_total() {
        let mut stats = PresolveStats::new();
        stats.record("remove_fixed_variable", true);
        stats.record("remove_fixed_variable", true);
        stats.record("merge_equal_literals", true);

        assert_eq!(stats.by_rule_name("remove_fixed_variable"), 2);
        assert_eq!(stats.by_rule_name("merge_equal_literals"), 1);
        assert_eq!(stats.num_presolve_operations(), 3);
    }

    #[test]
    fn disabled_stats_still_advance_operation_counter() {
        let mut stats = PresolveStats::new();
        stats.record("rule", false);
        assert_eq!(stats.by_rule_name("rule"), 0);
        assert_eq!(stats.num_presolve_operations(), 1);
    }
}
