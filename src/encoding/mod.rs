//! The literal-value encoding table: a full map `(variable, value) -> literal` for equalities,
//! plus two half-encoding maps recording one-way implications that have not yet met their
//! counterpart.

use fnv::FnvHashMap;

use crate::reference::Reference;
use crate::reference::VariableId;

/// Which direction a half-encoding points: `ImpliesEqual` records `literal => variable = value`,
/// `ImpliesNotEqual` records `literal => variable != value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HalfEncodingKind {
    ImpliesEqual,
    ImpliesNotEqual,
}

/// The outcome of inserting a half-encoding: either it stayed a one-way implication, or it met
/// its counterpart and the caller must install a full encoding (and possibly merge a literal).
pub(crate) enum HalfEncodingOutcome {
    StillHalf,
    Promoted {
        value: i64,
        literal: Reference,
        merge_with: Option<Reference>,
    },
}

#[derive(Default, Debug)]
pub(crate) struct EncodingTable {
    encoding: FnvHashMap<(VariableId, i64), Reference>,
    eq_half_encoding: FnvHashMap<(VariableId, i64), Vec<Reference>>,
    neq_half_encoding: FnvHashMap<(VariableId, i64), Vec<Reference>>,
}

impl EncodingTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The literal already on file for `(v, value)`, if any.
    pub(crate) fn get(&self, v: VariableId, value: i64) -> Option<Reference> {
        self.encoding.get(&(v, value)).copied()
    }

    /// Records `(v, value) -> literal`. Returns the literal previously on file for the same key,
    /// if the key was already present with a different literal; the caller is expected to merge
    /// the two via a Boolean equality in that case.
    pub(crate) fn insert(&mut self, v: VariableId, value: i64, literal: Reference) -> Option<Reference> {
        let previous = self.encoding.insert((v, value), literal);
        previous.filter(|&existing| existing != literal)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&(VariableId, i64), &Reference)> {
        self.encoding.iter()
    }

    /// Inserts `literal` into the half-encoding map of kind `imply_eq` for `(v, value)`. If the
    /// opposite map already holds the negation of `literal` for the same `(v, value)` key, the
    /// two halves jointly prove the full encoding, so the caller gets back a [`Promoted`]
    /// outcome describing what to install; otherwise the call only grows the half-map.
    ///
    /// [`Promoted`]: HalfEncodingOutcome::Promoted
    pub(crate) fn insert_half_encoding(
        &mut self,
        v: VariableId,
        value: i64,
        literal: Reference,
        kind: HalfEncodingKind,
    ) -> HalfEncodingOutcome {
        let key = (v, value);
        let (own_map, opposite_map) = match kind {
            HalfEncodingKind::ImpliesEqual => (&mut self.eq_half_encoding, &mut self.neq_half_encoding),
            HalfEncodingKind::ImpliesNotEqual => (&mut self.neq_half_encoding, &mut self.eq_half_encoding),
        };

        let entry = own_map.entry(key).or_default();
        if !entry.contains(&literal) {
            entry.push(literal);
        }

        let negated = literal.negated();
        let opposite_has_negation = opposite_map
            .get(&key)
            .is_some_or(|literals| literals.contains(&negated));

        if !opposite_has_negation {
            return HalfEncodingOutcome::StillHalf;
        }

        let promoted_literal = match kind {
            HalfEncodingKind::ImpliesEqual => literal,
            HalfEncodingKind::ImpliesNotEqual => negated,
        };

        let merge_with = self.encoding.get(&key).copied().filter(|&l| l != promoted_literal);

        HalfEncodingOutcome::Promoted {
            value,
            literal: promoted_literal,
            merge_with,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: u32) -> VariableId {
        use crate::basic_types::StorageKey;
        VariableId::create_from_index(i as usize)
    }

    #[test]
    fn insert_reports_conflicting_prior_literal() {
        let mut table = EncodingTable::new();
        let v0 = v(0);
        let lit_a = Reference::positive_reference(v(1));
        let lit_b = Reference::positive_reference(v(2));

        assert_eq!(table.insert(v0, 5, lit_a), None);
        assert_eq!(table.insert(v0, 5, lit_a), None);
        assert_eq!(table.insert(v0, 5, lit_b), Some(lit_a));
    }

    #[test]
    fn matching_half_encodings_promote_to_full() {
        let mut table = EncodingTable::new();
        let x = v(0);
        let lit = Reference::positive_reference(v(1));

        let outcome = table.insert_half_encoding(x, 5, lit, HalfEncodingKind::ImpliesEqual);
        assert!(matches!(outcome, HalfEncodingOutcome::StillHalf));

        let outcome =
            table.insert_half_encoding(x, 5, lit.negated(), HalfEncodingKind::ImpliesNotEqual);
        match outcome {
            HalfEncodingOutcome::Promoted {
                value,
                literal,
                merge_with,
            } => {
                assert_eq!(value, 5);
                assert_eq!(literal, lit);
                assert_eq!(merge_with, None);
            }
            HalfEncodingOutcome::StillHalf => panic!("expected promotion"),
        }
    }

    #[test]
    fn asymmetric_half_encoding_keys_do_not_merge() {
        // Open question from the design notes: two half-encodings for different values of the
        // same variable must never be treated as completing each other.
        let mut table = EncodingTable::new();
        let x = v(0);
        let lit = Reference::positive_reference(v(1));

        let outcome = table.insert_half_encoding(x, 5, lit, HalfEncodingKind::ImpliesEqual);
        assert!(matches!(outcome, HalfEncodingOutcome::StillHalf));

        // A half-encoding for value 6 (not 5) must not be seen as completing the value-5 half.
        let outcome =
            table.insert_half_encoding(x, 6, lit.negated(), HalfEncodingKind::ImpliesNotEqual);
        assert!(matches!(outcome, HalfEncodingOutcome::StillHalf));
    }
}
