//! Name index: searchable terms derived from name assertions.
//!
//! One row per (entity, assertion, term). Terms are the whitespace-split
//! words of every generated name form, so a multi-word query can match
//! words drawn from different names of the same entity.

use eats_core::{AssertionId, EntityId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single persisted index row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexRow {
    pub entity: EntityId,
    pub assertion: AssertionId,
    pub form: String,
}

#[derive(Debug, Clone, Default)]
struct IndexedName {
    entity: EntityId,
    terms: BTreeSet<String>,
    /// Lowercased terms used for case-insensitive prefix matching.
    folded: BTreeSet<String>,
}

/// In-memory name index.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    names: BTreeMap<AssertionId, IndexedName>,
    by_entity: BTreeMap<EntityId, BTreeSet<AssertionId>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from persisted rows.
    pub fn from_rows(rows: impl IntoIterator<Item = IndexRow>) -> Self {
        let mut index = Self::new();
        for row in rows {
            index.insert_row(row);
        }
        index
    }

    fn insert_row(&mut self, row: IndexRow) {
        let entry = self.names.entry(row.assertion).or_insert_with(|| IndexedName {
            entity: row.entity,
            ..IndexedName::default()
        });
        entry.folded.insert(row.form.to_lowercase());
        entry.terms.insert(row.form);
        self.by_entity
            .entry(row.entity)
            .or_default()
            .insert(row.assertion);
    }

    /// Replace the terms indexed for `assertion`.
    pub fn insert_forms(
        &mut self,
        entity: EntityId,
        assertion: AssertionId,
        terms: impl IntoIterator<Item = String>,
    ) {
        self.remove_assertion(assertion);
        for form in terms {
            self.insert_row(IndexRow {
                entity,
                assertion,
                form,
            });
        }
    }

    /// Drop every row of `assertion`. Returns the number of rows removed.
    pub fn remove_assertion(&mut self, assertion: AssertionId) -> usize {
        let Some(indexed) = self.names.remove(&assertion) else {
            return 0;
        };
        if let Some(assertions) = self.by_entity.get_mut(&indexed.entity) {
            assertions.remove(&assertion);
            if assertions.is_empty() {
                self.by_entity.remove(&indexed.entity);
            }
        }
        indexed.terms.len()
    }

    /// Drop every row of `entity`.
    pub fn remove_entity(&mut self, entity: EntityId) {
        for assertion in self.by_entity.remove(&entity).unwrap_or_default() {
            self.names.remove(&assertion);
        }
    }

    /// Move every row of `from` onto `to`.
    pub fn reassign_entity(&mut self, from: EntityId, to: EntityId) {
        let Some(assertions) = self.by_entity.remove(&from) else {
            return;
        };
        for assertion in &assertions {
            if let Some(indexed) = self.names.get_mut(assertion) {
                indexed.entity = to;
            }
        }
        self.by_entity.entry(to).or_default().extend(assertions);
    }

    /// Whether any indexed term of `entity` starts with `term`, ignoring case.
    pub fn matches(&self, entity: EntityId, term: &str) -> bool {
        let term = term.to_lowercase();
        self.by_entity
            .get(&entity)
            .into_iter()
            .flatten()
            .filter_map(|assertion| self.names.get(assertion))
            .any(|indexed| indexed.folded.iter().any(|form| form.starts_with(&term)))
    }

    /// Terms indexed for `assertion`.
    pub fn terms(&self, assertion: AssertionId) -> impl Iterator<Item = &str> {
        self.names
            .get(&assertion)
            .into_iter()
            .flat_map(|indexed| indexed.terms.iter().map(String::as_str))
    }

    /// All rows in (assertion, term) order.
    pub fn rows(&self) -> Vec<IndexRow> {
        self.names
            .iter()
            .flat_map(|(assertion, indexed)| {
                indexed.terms.iter().map(|form| IndexRow {
                    entity: indexed.entity,
                    assertion: *assertion,
                    form: form.clone(),
                })
            })
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.names.values().map(|indexed| indexed.terms.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_is_case_insensitive_prefix() {
        let mut index = NameIndex::new();
        index.insert_forms(EntityId(1), AssertionId(1), terms(&["Johann", "Bach"]));

        assert!(index.matches(EntityId(1), "joh"));
        assert!(index.matches(EntityId(1), "BA"));
        assert!(!index.matches(EntityId(1), "ach"));
        assert!(!index.matches(EntityId(2), "Bach"));
    }

    #[test]
    fn insert_forms_replaces_previous_terms() {
        let mut index = NameIndex::new();
        index.insert_forms(EntityId(1), AssertionId(1), terms(&["Alfred"]));
        index.insert_forms(EntityId(1), AssertionId(1), terms(&["Duns", "Scotus"]));

        assert!(!index.matches(EntityId(1), "Alf"));
        assert!(index.matches(EntityId(1), "Scot"));
        assert_eq!(index.row_count(), 2);
    }

    #[test]
    fn remove_assertion_keeps_other_names_of_entity() {
        let mut index = NameIndex::new();
        index.insert_forms(EntityId(1), AssertionId(1), terms(&["Alfred"]));
        index.insert_forms(EntityId(1), AssertionId(2), terms(&["Bach"]));

        assert_eq!(index.remove_assertion(AssertionId(1)), 1);
        assert_eq!(index.remove_assertion(AssertionId(1)), 0);
        assert!(!index.matches(EntityId(1), "Alf"));
        assert!(index.matches(EntityId(1), "Bach"));
    }

    #[test]
    fn rows_round_trip_through_from_rows() {
        let mut index = NameIndex::new();
        index.insert_forms(EntityId(2), AssertionId(5), terms(&["Maori", "Maaori"]));
        index.insert_forms(EntityId(1), AssertionId(3), terms(&["Smith"]));

        let rows = index.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].assertion, AssertionId(3));

        let rebuilt = NameIndex::from_rows(rows.clone());
        assert_eq!(rebuilt.rows(), rows);

        let mut emptied = rebuilt;
        emptied.remove_entity(EntityId(2));
        emptied.remove_entity(EntityId(1));
        assert!(emptied.is_empty());
    }
}
