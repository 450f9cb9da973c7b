//! Canonical in-memory representation of EATS records.
//!
//! This is the name-assertion repository:
//! - load/store JSONL (records and the derived name index)
//! - validate assertions against their authority's enabled components
//! - keep the name index in step with every name create/update/remove
//! - answer lookups and preferred-name queries deterministically

use eats_core::{
    AssertionHeader, AssertionId, Authority, AuthorityId, EatsError, EntityId, EntityType,
    EntityTypeAssertion, Language, LanguageCode, Name, NameAssertion, NamePreferences,
    NoteAssertion, PreferredName, PropertyAssertion, RelationshipAssertion, RelationshipType,
    Script, ScriptCode, create_name_forms, index_terms, resolve_preferred_name,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::entity::EntityRecord;
use crate::jsonl::{JsonlError, read_records_from_path, write_records_to_path};
use crate::name_index::{IndexRow, NameIndex};

/// Schema version stamped into the name index file.
pub const NAME_INDEX_SCHEMA: u64 = 1;

/// Errors raised while loading, saving, or mutating the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Jsonl(#[from] JsonlError),

    #[error(transparent)]
    Eats(#[from] EatsError),

    #[error("inconsistent store: {0}")]
    Inconsistent(String),
}

/// One line of the store JSONL file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreRecord {
    Language(Language),
    Script(Script),
    Authority(Authority),
    Entity(EntityRecord),
    /// `old` no longer exists; it was merged into `new`.
    Merged { old: EntityId, new: EntityId },
    /// Next identifiers to allocate, so removed ids are never reused.
    Sequence {
        next_entity_id: u64,
        next_assertion_id: u64,
    },
}

/// One line of the name index JSONL file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum IndexRecord {
    Header {
        schema: u64,
        source_snapshot_ref: String,
    },
    Row(IndexRow),
}

/// Counts reported by a full reindex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReindexSummary {
    pub names: usize,
    pub rows: usize,
}

/// Path of the name index file that accompanies `store_path`.
pub fn index_path_for(store_path: &Path) -> PathBuf {
    store_path.with_extension("index.jsonl")
}

/// Canonical in-memory state for EATS records.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    languages: BTreeMap<LanguageCode, Language>,
    scripts: BTreeMap<ScriptCode, Script>,
    authorities: BTreeMap<AuthorityId, Authority>,
    entities: BTreeMap<EntityId, EntityRecord>,
    merged: BTreeMap<EntityId, EntityId>,
    index: NameIndex,
    next_entity_id: u64,
    next_assertion_id: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            languages: BTreeMap::new(),
            scripts: BTreeMap::new(),
            authorities: BTreeMap::new(),
            entities: BTreeMap::new(),
            merged: BTreeMap::new(),
            index: NameIndex::new(),
            next_entity_id: 1,
            next_assertion_id: 1,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records, regenerating the name index.
    ///
    /// Duplicate keys resolve with last-write-wins semantics. Sequence
    /// counters never move below the highest identifier present.
    pub fn from_records(records: Vec<StoreRecord>) -> Result<Self, StoreError> {
        let mut store = Self::from_records_unindexed(records)?;
        store.reindex();
        Ok(store)
    }

    /// Build a store from records, leaving the name index empty.
    fn from_records_unindexed(records: Vec<StoreRecord>) -> Result<Self, StoreError> {
        let mut store = Self::default();
        for record in records {
            match record {
                StoreRecord::Language(language) => {
                    store.languages.insert(language.code.clone(), language);
                }
                StoreRecord::Script(script) => {
                    store.scripts.insert(script.code.clone(), script);
                }
                StoreRecord::Authority(authority) => {
                    store.authorities.insert(authority.id.clone(), authority);
                }
                StoreRecord::Entity(entity) => {
                    store.entities.insert(entity.id, entity);
                }
                StoreRecord::Merged { old, new } => {
                    store.merged.insert(old, new);
                }
                StoreRecord::Sequence {
                    next_entity_id,
                    next_assertion_id,
                } => {
                    store.next_entity_id = store.next_entity_id.max(next_entity_id);
                    store.next_assertion_id = store.next_assertion_id.max(next_assertion_id);
                }
            }
        }
        store.check_consistency()?;
        store.bump_sequences();
        Ok(store)
    }

    fn check_consistency(&self) -> Result<(), StoreError> {
        let mut seen = BTreeMap::new();
        for entity in self.entities.values() {
            if self.merged.contains_key(&entity.id) {
                return Err(StoreError::Inconsistent(format!(
                    "entity {} is both present and merged",
                    entity.id
                )));
            }
            for assertion in &entity.assertions {
                if let Some(owner) = seen.insert(assertion.id(), entity.id) {
                    return Err(StoreError::Inconsistent(format!(
                        "assertion {} is claimed by entities {owner} and {}",
                        assertion.id(),
                        entity.id
                    )));
                }
            }
        }
        Ok(())
    }

    fn bump_sequences(&mut self) {
        let max_entity = self
            .entities
            .keys()
            .chain(self.merged.keys())
            .map(|id| id.0)
            .max()
            .unwrap_or(0);
        let max_assertion = self
            .entities
            .values()
            .flat_map(|entity| entity.assertions.iter().map(|a| a.id().0))
            .max()
            .unwrap_or(0);
        self.next_entity_id = self.next_entity_id.max(max_entity + 1);
        self.next_assertion_id = self.next_assertion_id.max(max_assertion + 1);
    }

    /// Records in canonical order: infrastructure, authorities, entities,
    /// merge redirects, sequence.
    pub fn records(&self) -> Vec<StoreRecord> {
        let mut records = Vec::new();
        records.extend(self.languages.values().cloned().map(StoreRecord::Language));
        records.extend(self.scripts.values().cloned().map(StoreRecord::Script));
        records.extend(
            self.authorities
                .values()
                .cloned()
                .map(StoreRecord::Authority),
        );
        records.extend(self.entities.values().cloned().map(StoreRecord::Entity));
        records.extend(
            self.merged
                .iter()
                .map(|(old, new)| StoreRecord::Merged { old: *old, new: *new }),
        );
        records.push(StoreRecord::Sequence {
            next_entity_id: self.next_entity_id,
            next_assertion_id: self.next_assertion_id,
        });
        records
    }

    /// Content digest of the store records. Stamped into the name index
    /// file so a stale index is detected on load.
    pub fn snapshot_ref(&self) -> String {
        let mut hasher = Sha256::new();
        for record in self.records() {
            let line = serde_json::to_string(&record).unwrap_or_default();
            hasher.update(line.as_bytes());
            hasher.update([b'\n']);
        }
        format!("eats1_{:x}", hasher.finalize())
    }

    /// Load store state from a JSONL file, along with its name index.
    ///
    /// A name index file stamped with this store's snapshot is used as is.
    /// The index is regenerated only if that file is missing, malformed, or
    /// was written for a different snapshot.
    pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let records: Vec<StoreRecord> = read_records_from_path(path)?;
        let mut store = Self::from_records_unindexed(records)?;

        match store.read_index(&index_path_for(path)) {
            Some(index) => store.index = index,
            None => {
                store.reindex();
            }
        }
        Ok(store)
    }

    fn read_index(&self, index_path: &Path) -> Option<NameIndex> {
        if !index_path.exists() {
            debug!(path = %index_path.display(), "name index missing");
            return None;
        }
        let records = match read_records_from_path::<IndexRecord>(index_path) {
            Ok(records) => records,
            Err(error) => {
                warn!(path = %index_path.display(), %error, "name index unreadable");
                return None;
            }
        };
        let index = index_from_records(records, &self.snapshot_ref());
        if index.is_none() {
            info!(path = %index_path.display(), "name index is stale");
        }
        index
    }

    /// Persist store state and its name index to JSONL files.
    pub fn save_jsonl(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        write_records_to_path(path, &self.records())?;

        let mut index_records = vec![IndexRecord::Header {
            schema: NAME_INDEX_SCHEMA,
            source_snapshot_ref: self.snapshot_ref(),
        }];
        index_records.extend(self.index.rows().into_iter().map(IndexRecord::Row));
        write_records_to_path(index_path_for(path), &index_records)?;
        Ok(())
    }

    // ── Infrastructure ──

    pub fn add_language(&mut self, language: Language) -> Result<(), EatsError> {
        if self.languages.contains_key(&language.code) {
            return Err(EatsError::AlreadyExists {
                kind: "language",
                id: language.code.to_string(),
            });
        }
        self.languages.insert(language.code.clone(), language);
        Ok(())
    }

    pub fn add_script(&mut self, script: Script) -> Result<(), EatsError> {
        if self.scripts.contains_key(&script.code) {
            return Err(EatsError::AlreadyExists {
                kind: "script",
                id: script.code.to_string(),
            });
        }
        self.scripts.insert(script.code.clone(), script);
        Ok(())
    }

    pub fn language(&self, code: &LanguageCode) -> Option<&Language> {
        self.languages.get(code)
    }

    pub fn script(&self, code: &ScriptCode) -> Option<&Script> {
        self.scripts.get(code)
    }

    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.languages.values()
    }

    pub fn scripts(&self) -> impl Iterator<Item = &Script> {
        self.scripts.values()
    }

    // ── Authorities ──

    /// Register a new authority. Its enabled languages and scripts must
    /// already exist.
    pub fn add_authority(&mut self, authority: Authority) -> Result<(), EatsError> {
        if self.authorities.contains_key(&authority.id) {
            return Err(EatsError::AlreadyExists {
                kind: "authority",
                id: authority.id.to_string(),
            });
        }
        self.check_authority_components(&authority)?;
        self.authorities.insert(authority.id.clone(), authority);
        Ok(())
    }

    /// Replace an existing authority's details and enabled components.
    ///
    /// Existing assertions are not revalidated.
    pub fn update_authority(&mut self, authority: Authority) -> Result<(), EatsError> {
        if !self.authorities.contains_key(&authority.id) {
            return Err(EatsError::UnknownAuthority(authority.id));
        }
        self.check_authority_components(&authority)?;
        self.authorities.insert(authority.id.clone(), authority);
        Ok(())
    }

    fn check_authority_components(&self, authority: &Authority) -> Result<(), EatsError> {
        if let Some(code) = authority
            .languages
            .iter()
            .find(|code| !self.languages.contains_key(*code))
        {
            return Err(EatsError::UnknownLanguage(code.to_string()));
        }
        if let Some(code) = authority
            .scripts
            .iter()
            .find(|code| !self.scripts.contains_key(*code))
        {
            return Err(EatsError::UnknownScript(code.to_string()));
        }
        Ok(())
    }

    pub fn authority(&self, id: &AuthorityId) -> Result<&Authority, EatsError> {
        self.authorities
            .get(id)
            .ok_or_else(|| EatsError::UnknownAuthority(id.clone()))
    }

    pub fn authorities(&self) -> impl Iterator<Item = &Authority> {
        self.authorities.values()
    }

    // ── Entities ──

    /// Create an entity whose existence is asserted by `authority`.
    pub fn create_entity(&mut self, authority: &AuthorityId) -> Result<EntityId, EatsError> {
        self.authority(authority)?;
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        self.entities
            .insert(id, EntityRecord::new(id, authority.clone()));
        debug!(entity = %id, %authority, "created entity");
        Ok(id)
    }

    /// Lookup one entity by ID.
    ///
    /// IDs of merged-away entities yield `EntityMerged` naming the entity
    /// that now holds their assertions.
    pub fn entity(&self, id: EntityId) -> Result<&EntityRecord, EatsError> {
        if let Some(entity) = self.entities.get(&id) {
            return Ok(entity);
        }
        match self.merged_target(id) {
            Some(new) => Err(EatsError::EntityMerged { old: id, new }),
            None => Err(EatsError::EntityNotFound(id)),
        }
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut EntityRecord, EatsError> {
        self.entity(id)?;
        self.entities
            .get_mut(&id)
            .ok_or(EatsError::EntityNotFound(id))
    }

    /// Follow merge redirects from `id` to the entity that now exists.
    fn merged_target(&self, id: EntityId) -> Option<EntityId> {
        let mut current = *self.merged.get(&id)?;
        // Redirects always point at live entities after a merge, but older
        // files may hold chains.
        for _ in 0..self.merged.len() {
            match self.merged.get(&current) {
                Some(next) => current = *next,
                None => break,
            }
        }
        Some(current)
    }

    /// Iterate all entities in ID order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn allocate_header(&mut self, authority: &AuthorityId) -> AssertionHeader {
        let id = AssertionId(self.next_assertion_id);
        self.next_assertion_id += 1;
        AssertionHeader {
            id,
            authority: authority.clone(),
        }
    }

    /// Locate the entity that holds `assertion`.
    fn owner_of(&self, assertion: AssertionId) -> Result<EntityId, EatsError> {
        self.entities
            .values()
            .find(|entity| entity.assertion(assertion).is_some())
            .map(|entity| entity.id)
            .ok_or(EatsError::AssertionNotFound(assertion))
    }

    pub fn assertion(&self, assertion: AssertionId) -> Result<&PropertyAssertion, EatsError> {
        let owner = self.owner_of(assertion)?;
        self.entity(owner)?
            .assertion(assertion)
            .ok_or(EatsError::AssertionNotFound(assertion))
    }

    // ── Names ──

    /// Assert `name` for `entity` on behalf of `authority`, and index it.
    pub fn create_name_assertion(
        &mut self,
        entity: EntityId,
        authority: &AuthorityId,
        name: Name,
        is_preferred: bool,
    ) -> Result<AssertionId, EatsError> {
        self.authority(authority)?.validate_name(&name)?;
        self.entity(entity)?;
        let header = self.allocate_header(authority);
        let id = header.id;
        self.index_name(entity, id, &name);
        self.entity_mut(entity)?
            .assertions
            .push(PropertyAssertion::Name(NameAssertion {
                header,
                name,
                is_preferred,
            }));
        Ok(id)
    }

    /// Replace the name and preferred flag of an existing name assertion.
    ///
    /// Index rows are regenerated only when the text, language, or script
    /// changed.
    pub fn update_name_assertion(
        &mut self,
        assertion: AssertionId,
        name: Name,
        is_preferred: bool,
    ) -> Result<(), EatsError> {
        let owner = self.owner_of(assertion)?;
        let authority = self.assertion(assertion)?.authority().clone();
        self.authority(&authority)?.validate_name(&name)?;

        let reindex = {
            let record = self
                .entity_mut(owner)?
                .assertion_mut(assertion)
                .ok_or(EatsError::AssertionNotFound(assertion))?;
            let PropertyAssertion::Name(existing) = record else {
                return Err(EatsError::Validation(format!(
                    "assertion {assertion} is not a name assertion"
                )));
            };
            let reindex = existing.name.forms_differ(&name);
            existing.name = name.clone();
            existing.is_preferred = is_preferred;
            reindex
        };
        if reindex {
            self.index_name(owner, assertion, &name);
        }
        Ok(())
    }

    fn index_name(&mut self, entity: EntityId, assertion: AssertionId, name: &Name) {
        let terms = name_terms(name);
        debug!(
            entity = %entity,
            assertion = %assertion,
            parts = name.parts.len(),
            terms = terms.len(),
            "indexed name"
        );
        self.index.insert_forms(entity, assertion, terms);
    }

    /// The form to display for `name`.
    ///
    /// Names without a display form are assembled from their parts, in
    /// the part type order of the name's language, joined by its script's
    /// separator.
    pub fn assembled_form<'a>(&self, name: &'a Name) -> Cow<'a, str> {
        let part_types = self
            .languages
            .get(&name.language)
            .map(|language| language.name_part_types.as_slice())
            .unwrap_or_default();
        let separator = self
            .scripts
            .get(&name.script)
            .map_or(" ", |script| script.separator.as_str());
        name.assembled_form(part_types, separator)
    }

    /// Name assertions of `entity` in creation order.
    pub fn name_assertions(&self, entity: EntityId) -> Result<Vec<&NameAssertion>, EatsError> {
        Ok(self.entity(entity)?.name_assertions().collect())
    }

    /// The name of `entity` that best matches `preferences`.
    pub fn preferred_name(
        &self,
        entity: EntityId,
        preferences: &NamePreferences,
    ) -> Result<PreferredName<'_>, EatsError> {
        let record = self.entity(entity)?;
        Ok(resolve_preferred_name(preferences, record.name_assertions()))
    }

    // ── Other property assertions ──

    pub fn create_entity_type_assertion(
        &mut self,
        entity: EntityId,
        authority: &AuthorityId,
        entity_type: EntityType,
    ) -> Result<AssertionId, EatsError> {
        self.authority(authority)?
            .validate_entity_type(&entity_type)?;
        self.entity(entity)?;
        let header = self.allocate_header(authority);
        let id = header.id;
        self.entity_mut(entity)?
            .assertions
            .push(PropertyAssertion::EntityType(EntityTypeAssertion {
                header,
                entity_type,
            }));
        Ok(id)
    }

    /// Assert that `domain` stands in `relationship_type` to `range`.
    /// An entity cannot be related to itself.
    pub fn create_relationship_assertion(
        &mut self,
        domain: EntityId,
        authority: &AuthorityId,
        relationship_type: RelationshipType,
        range: EntityId,
    ) -> Result<AssertionId, EatsError> {
        self.authority(authority)?
            .validate_relationship_type(&relationship_type)?;
        if domain == range {
            return Err(EatsError::Validation(format!(
                "entity {domain} cannot be related to itself"
            )));
        }
        self.entity(domain)?;
        self.entity(range)?;
        let header = self.allocate_header(authority);
        let id = header.id;
        self.entity_mut(domain)?
            .assertions
            .push(PropertyAssertion::Relationship(RelationshipAssertion {
                header,
                relationship_type,
                range_entity: range,
            }));
        Ok(id)
    }

    pub fn create_note_assertion(
        &mut self,
        entity: EntityId,
        authority: &AuthorityId,
        note: String,
    ) -> Result<AssertionId, EatsError> {
        self.authority(authority)?;
        self.entity(entity)?;
        let header = self.allocate_header(authority);
        let id = header.id;
        self.entity_mut(entity)?
            .assertions
            .push(PropertyAssertion::Note(NoteAssertion { header, note }));
        Ok(id)
    }

    /// Remove any property assertion. Name assertions take their index
    /// rows with them.
    pub fn remove_assertion(
        &mut self,
        assertion: AssertionId,
    ) -> Result<PropertyAssertion, EatsError> {
        let owner = self.owner_of(assertion)?;
        let entity = self.entity_mut(owner)?;
        let position = entity
            .assertions
            .iter()
            .position(|a| a.id() == assertion)
            .ok_or(EatsError::AssertionNotFound(assertion))?;
        let removed = entity.assertions.remove(position);
        if removed.as_name().is_some() {
            let rows = self.index.remove_assertion(assertion);
            debug!(assertion = %assertion, rows, "removed name index rows");
        }
        Ok(removed)
    }

    /// Remove an entity and everything asserted about it. Relationships
    /// from other entities that point at it are removed too, as are merge
    /// redirects onto it.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<EntityRecord, EatsError> {
        self.entity(id)?;
        let removed = self
            .entities
            .remove(&id)
            .ok_or(EatsError::EntityNotFound(id))?;
        self.index.remove_entity(id);
        self.merged.retain(|_, new| *new != id);
        for entity in self.entities.values_mut() {
            entity.assertions.retain(|a| {
                !matches!(a, PropertyAssertion::Relationship(r) if r.range_entity == id)
            });
        }
        info!(entity = %id, "removed entity");
        Ok(removed)
    }

    // ── Search ──

    /// Entities with names matching `query`, in ID order.
    ///
    /// The query is expanded into name forms with no language or script.
    /// An entity matches a form when every whitespace-separated term of
    /// that form is a case-insensitive prefix of one of its indexed terms.
    /// Terms may be matched by different names of the same entity. When
    /// `entity_types` is non-empty, only entities asserted to have one of
    /// those types are returned.
    pub fn lookup_entities(&self, query: &str, entity_types: &[EntityType]) -> Vec<EntityId> {
        let term_sets: Vec<Vec<String>> = create_name_forms(query, None, None)
            .iter()
            .map(|form| form.split_whitespace().map(str::to_lowercase).collect())
            .filter(|terms: &Vec<String>| !terms.is_empty())
            .collect();
        if term_sets.is_empty() {
            return Vec::new();
        }

        self.entities
            .values()
            .filter(|entity| {
                entity_types.is_empty() || entity_types.iter().any(|t| entity.has_entity_type(t))
            })
            .filter(|entity| {
                term_sets.iter().any(|terms| {
                    terms
                        .iter()
                        .all(|term| self.index.matches(entity.id, term))
                })
            })
            .map(|entity| entity.id)
            .collect()
    }

    pub fn index(&self) -> &NameIndex {
        &self.index
    }

    // ── Maintenance ──

    /// Move every assertion of `source` onto `target` and retire `source`.
    ///
    /// Relationships anywhere in the store that point at `source` are
    /// re-pointed at `target`. Relationships between the two entities
    /// would become self-relationships and are dropped. Later lookups of
    /// `source` report the merge.
    pub fn merge_entities(&mut self, target: EntityId, source: EntityId) -> Result<(), EatsError> {
        if target == source {
            return Err(EatsError::Validation(format!(
                "cannot merge entity {target} into itself"
            )));
        }
        self.entity(target)?;
        let source_record = self
            .entities
            .remove(&source)
            .ok_or_else(|| {
                self.entity(source)
                    .err()
                    .unwrap_or(EatsError::EntityNotFound(source))
            })?;

        let moved = source_record.assertions.len();
        self.entity_mut(target)?
            .assertions
            .extend(source_record.assertions);
        for entity in self.entities.values_mut() {
            for assertion in &mut entity.assertions {
                if let PropertyAssertion::Relationship(r) = assertion
                    && r.range_entity == source
                {
                    r.range_entity = target;
                }
            }
        }
        let target_record = self.entity_mut(target)?;
        let before = target_record.assertions.len();
        target_record.assertions.retain(|a| {
            !matches!(a, PropertyAssertion::Relationship(r) if r.range_entity == target)
        });
        let dropped = before - target_record.assertions.len();
        for new in self.merged.values_mut() {
            if *new == source {
                *new = target;
            }
        }
        self.merged.insert(source, target);
        self.index.reassign_entity(source, target);
        info!(%target, %source, moved, dropped, "merged entities");
        Ok(())
    }

    /// Regenerate the whole name index from the stored names.
    pub fn reindex(&mut self) -> ReindexSummary {
        let mut index = NameIndex::new();
        let mut names = 0;
        for entity in self.entities.values() {
            for assertion in entity.name_assertions() {
                index.insert_forms(entity.id, assertion.id(), name_terms(&assertion.name));
                names += 1;
            }
        }
        self.index = index;
        let summary = ReindexSummary {
            names,
            rows: self.index.row_count(),
        };
        info!(names = summary.names, rows = summary.rows, "regenerated name index");
        summary
    }
}

/// Index terms of a name's display form and of each of its parts, every
/// part expanded in its own language and script.
fn name_terms(name: &Name) -> BTreeSet<String> {
    let mut forms = create_name_forms(
        &name.display_form,
        Some(name.language.as_str()),
        Some(name.script.as_str()),
    );
    for part in &name.parts {
        forms.extend(create_name_forms(
            &part.display_form,
            Some(part.language.as_str()),
            Some(part.script.as_str()),
        ));
    }
    index_terms(&forms)
}

fn index_from_records(records: Vec<IndexRecord>, expected_snapshot: &str) -> Option<NameIndex> {
    let mut records = records.into_iter();
    match records.next()? {
        IndexRecord::Header {
            schema,
            source_snapshot_ref,
        } if schema == NAME_INDEX_SCHEMA && source_snapshot_ref == expected_snapshot => {}
        _ => return None,
    }
    let mut rows = Vec::new();
    for record in records {
        match record {
            IndexRecord::Row(row) => rows.push(row),
            IndexRecord::Header { .. } => return None,
        }
    }
    Some(NameIndex::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eats_core::NamePart;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("eats-memory-{prefix}-{}-{unique}", std::process::id()))
            .join("store.jsonl")
    }

    fn authority_id(id: &str) -> AuthorityId {
        AuthorityId::new(id)
    }

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .add_language(
                Language::new("en", "English").with_name_part_types(["given", "family"]),
            )
            .expect("language should add");
        store
            .add_language(Language::new("mi", "Māori"))
            .expect("language should add");
        store
            .add_script(Script::new("Latn", "Latin"))
            .expect("script should add");
        store
            .add_authority(
                Authority::new("wtap", "Wellington Text Archive")
                    .with_languages(["en", "mi"])
                    .with_scripts(["Latn"])
                    .with_name_types(["regular"])
                    .with_name_part_types(["given", "family"])
                    .with_entity_types(["person", "place"])
                    .with_relationship_types(["is_child_of"]),
            )
            .expect("authority should add");
        store
    }

    fn add_name(store: &mut MemoryStore, entity: EntityId, form: &str) -> AssertionId {
        add_name_in(store, entity, form, "en")
    }

    fn add_name_in(
        store: &mut MemoryStore,
        entity: EntityId,
        form: &str,
        language: &str,
    ) -> AssertionId {
        store
            .create_name_assertion(
                entity,
                &authority_id("wtap"),
                Name::new(form, language, "Latn", "regular"),
                true,
            )
            .expect("name should add")
    }

    fn new_entity(store: &mut MemoryStore) -> EntityId {
        store
            .create_entity(&authority_id("wtap"))
            .expect("entity should create")
    }

    #[test]
    fn lookup_entities_matches_term_prefixes_in_any_order() {
        let mut store = seeded_store();
        assert_eq!(store.lookup_entities("Johann", &[]), Vec::<EntityId>::new());

        let bach = new_entity(&mut store);
        add_name(&mut store, bach, "Johann Sebastian Bach");

        assert_eq!(store.lookup_entities("Johann", &[]), vec![bach]);
        assert_eq!(store.lookup_entities("Seb", &[]), vec![bach]);
        assert_eq!(store.lookup_entities("ba", &[]), vec![bach]);
        assert_eq!(store.lookup_entities("B J", &[]), vec![bach]);
        assert_eq!(store.lookup_entities("J. Sebastian Bach", &[]), vec![bach]);

        add_name(&mut store, bach, "Alfred");
        assert_eq!(store.lookup_entities("Alf", &[]), vec![bach]);
        assert_eq!(store.lookup_entities("Al B", &[]), vec![bach]);

        let scotus = new_entity(&mut store);
        add_name(&mut store, scotus, "Duns Scotus");
        assert_eq!(store.lookup_entities("S", &[]), vec![bach, scotus]);
        assert_eq!(store.lookup_entities("B s", &[]), vec![bach]);
        assert_eq!(store.lookup_entities("u", &[]), Vec::<EntityId>::new());
        assert_eq!(store.lookup_entities("   ", &[]), Vec::<EntityId>::new());
    }

    #[test]
    fn lookup_entities_matches_alternate_forms() {
        let mut store = seeded_store();
        let macron = new_entity(&mut store);
        add_name_in(&mut store, macron, "Māori", "mi");

        assert_eq!(store.lookup_entities("Māori", &[]), vec![macron]);
        assert_eq!(store.lookup_entities("Maori", &[]), vec![macron]);
        assert_eq!(store.lookup_entities("Maaori", &[]), vec![macron]);

        let plain = new_entity(&mut store);
        add_name_in(&mut store, plain, "Maori", "mi");
        assert_eq!(store.lookup_entities("Māori", &[]), vec![macron, plain]);
        assert_eq!(store.lookup_entities("Maori", &[]), vec![macron, plain]);
        assert_eq!(store.lookup_entities("Maaori", &[]), vec![macron]);
    }

    #[test]
    fn lookup_entities_filters_by_entity_type() {
        let mut store = seeded_store();
        let person = new_entity(&mut store);
        add_name(&mut store, person, "Wellington Smith");
        store
            .create_entity_type_assertion(person, &authority_id("wtap"), "person".into())
            .expect("entity type should add");
        let place = new_entity(&mut store);
        add_name(&mut store, place, "Wellington");
        store
            .create_entity_type_assertion(place, &authority_id("wtap"), "place".into())
            .expect("entity type should add");

        assert_eq!(store.lookup_entities("Well", &[]), vec![person, place]);
        assert_eq!(
            store.lookup_entities("Well", &[EntityType::new("place")]),
            vec![place]
        );
        assert_eq!(
            store.lookup_entities("Well", &[EntityType::new("organisation")]),
            Vec::<EntityId>::new()
        );
    }

    #[test]
    fn create_name_assertion_validates_against_authority() {
        let mut store = seeded_store();
        let entity = new_entity(&mut store);
        let err = store
            .create_name_assertion(
                entity,
                &authority_id("wtap"),
                Name::new("Москва", "ru", "Cyrl", "regular"),
                true,
            )
            .expect_err("disabled language must be rejected");
        assert!(matches!(err, EatsError::Validation(_)));

        let err = store
            .create_name_assertion(
                entity,
                &authority_id("missing"),
                Name::new("Smith", "en", "Latn", "regular"),
                true,
            )
            .expect_err("unknown authority must be rejected");
        assert!(matches!(err, EatsError::UnknownAuthority(id) if id.as_str() == "missing"));
        assert!(store.index().is_empty());
    }

    #[test]
    fn update_name_assertion_regenerates_index_rows() {
        let mut store = seeded_store();
        let entity = new_entity(&mut store);
        let assertion = add_name(&mut store, entity, "Alfred");

        store
            .update_name_assertion(
                assertion,
                Name::new("Duns Scotus", "en", "Latn", "regular"),
                false,
            )
            .expect("update should succeed");

        assert_eq!(store.lookup_entities("Alf", &[]), Vec::<EntityId>::new());
        assert_eq!(store.lookup_entities("Scot", &[]), vec![entity]);
        let names = store.name_assertions(entity).expect("entity exists");
        assert_eq!(names.len(), 1);
        assert!(!names[0].is_preferred);
    }

    #[test]
    fn remove_assertion_drops_index_rows() {
        let mut store = seeded_store();
        let entity = new_entity(&mut store);
        let assertion = add_name(&mut store, entity, "Alfred");
        store
            .remove_assertion(assertion)
            .expect("remove should succeed");

        assert!(store.index().is_empty());
        assert!(matches!(
            store.remove_assertion(assertion),
            Err(EatsError::AssertionNotFound(id)) if id == assertion
        ));
    }

    #[test]
    fn preferred_name_follows_script_authority_language_precedence() {
        let mut store = seeded_store();
        store
            .add_language(Language::new("fr", "French"))
            .expect("language should add");
        store
            .add_authority(
                Authority::new("kcl", "King's College")
                    .with_languages(["en", "fr"])
                    .with_scripts(["Latn"])
                    .with_name_types(["regular"]),
            )
            .expect("authority should add");
        let entity = new_entity(&mut store);
        let unnamed = store
            .preferred_name(entity, &NamePreferences::default())
            .expect("entity exists");
        assert_eq!(unnamed, PreferredName::Unnamed);

        let english = add_name(&mut store, entity, "Name1");
        let french = store
            .create_name_assertion(
                entity,
                &authority_id("kcl"),
                Name::new("Name2", "fr", "Latn", "regular"),
                true,
            )
            .expect("name should add");

        let prefs = NamePreferences::new(Some("kcl".into()), Some("en".into()), Some("Latn".into()));
        let resolved = store.preferred_name(entity, &prefs).expect("entity exists");
        assert_eq!(resolved.assertion().map(|a| a.id()), Some(french));

        let prefs = NamePreferences::new(None, Some("en".into()), None);
        let resolved = store.preferred_name(entity, &prefs).expect("entity exists");
        assert_eq!(resolved.assertion().map(|a| a.id()), Some(english));
        assert_eq!(resolved.form(), "Name1");
    }

    #[test]
    fn merge_entities_moves_assertions_and_redirects() {
        let mut store = seeded_store();
        let target = new_entity(&mut store);
        let source = new_entity(&mut store);
        let other = new_entity(&mut store);
        add_name(&mut store, target, "Johann Bach");
        add_name(&mut store, source, "Sebastian");
        store
            .create_relationship_assertion(
                other,
                &authority_id("wtap"),
                "is_child_of".into(),
                source,
            )
            .expect("relationship should add");

        store
            .merge_entities(target, source)
            .expect("merge should succeed");

        assert_eq!(store.lookup_entities("Seb", &[]), vec![target]);
        assert_eq!(store.name_assertions(target).expect("exists").len(), 2);
        assert!(matches!(
            store.entity(source),
            Err(EatsError::EntityMerged { old, new }) if old == source && new == target
        ));
        let relationship = store
            .entity(other)
            .expect("exists")
            .relationships()
            .next()
            .expect("relationship kept");
        assert_eq!(relationship.range_entity, target);

        let err = store
            .merge_entities(target, target)
            .expect_err("self-merge must fail");
        assert!(matches!(err, EatsError::Validation(_)));
    }

    #[test]
    fn remove_entity_drops_incoming_relationships() {
        let mut store = seeded_store();
        let parent = new_entity(&mut store);
        let child = new_entity(&mut store);
        add_name(&mut store, parent, "Parent");
        store
            .create_relationship_assertion(
                child,
                &authority_id("wtap"),
                "is_child_of".into(),
                parent,
            )
            .expect("relationship should add");

        store.remove_entity(parent).expect("remove should succeed");

        assert!(store.index().is_empty());
        assert_eq!(store.entity(child).expect("exists").relationships().count(), 0);
        assert!(matches!(
            store.entity(parent),
            Err(EatsError::EntityNotFound(id)) if id == parent
        ));
    }

    #[test]
    fn reindex_counts_names_and_rows() {
        let mut store = seeded_store();
        let entity = new_entity(&mut store);
        add_name(&mut store, entity, "A. Smith");
        add_name(&mut store, entity, "Jones");

        let summary = store.reindex();
        assert_eq!(summary.names, 2);
        // "A.", "A", "Smith", "Jones"
        assert_eq!(summary.rows, 4);
    }

    #[test]
    fn add_authority_requires_known_components() {
        let mut store = seeded_store();
        let err = store
            .add_authority(Authority::new("x", "X").with_languages(["de"]))
            .expect_err("unknown language must fail");
        assert!(matches!(err, EatsError::UnknownLanguage(code) if code == "de"));

        let err = store
            .add_authority(Authority::new("wtap", "Again"))
            .expect_err("duplicate must fail");
        assert!(matches!(err, EatsError::AlreadyExists { kind: "authority", .. }));
    }

    #[test]
    fn save_and_load_round_trip_preserves_index_and_sequences() {
        let path = temp_path("round-trip");
        let mut store = seeded_store();
        let entity = new_entity(&mut store);
        let assertion = add_name_in(&mut store, entity, "Māori", "mi");
        store.remove_assertion(assertion).expect("remove should succeed");
        add_name(&mut store, entity, "Alfred");
        store.save_jsonl(&path).expect("save should succeed");
        assert!(index_path_for(&path).exists());

        let mut loaded = MemoryStore::load_jsonl(&path).expect("load should succeed");
        assert_eq!(loaded.records(), store.records());
        assert_eq!(loaded.index().rows(), store.index().rows());
        assert_eq!(loaded.lookup_entities("alf", &[]), vec![entity]);

        let next = add_name(&mut loaded, entity, "Bach");
        assert!(next.0 > assertion.0 + 1);

        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    fn sentinel_index(
        snapshot_ref: String,
        entity: EntityId,
        assertion: AssertionId,
    ) -> Vec<IndexRecord> {
        vec![
            IndexRecord::Header {
                schema: NAME_INDEX_SCHEMA,
                source_snapshot_ref: snapshot_ref,
            },
            IndexRecord::Row(IndexRow {
                entity,
                assertion,
                form: "Sentinel".to_string(),
            }),
        ]
    }

    #[test]
    fn load_uses_stamped_index_without_rederiving() {
        let path = temp_path("fresh-index");
        let mut store = seeded_store();
        let entity = new_entity(&mut store);
        let assertion = add_name(&mut store, entity, "Alfred");
        store.save_jsonl(&path).expect("save should succeed");

        write_records_to_path(
            index_path_for(&path),
            &sentinel_index(store.snapshot_ref(), entity, assertion),
        )
        .expect("index fixture should write");

        let loaded = MemoryStore::load_jsonl(&path).expect("load should succeed");
        assert_eq!(
            loaded.index().rows(),
            vec![IndexRow {
                entity,
                assertion,
                form: "Sentinel".to_string(),
            }]
        );
        assert_eq!(loaded.lookup_entities("Sent", &[]), vec![entity]);
        assert_eq!(loaded.lookup_entities("Alfred", &[]), Vec::<EntityId>::new());

        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn load_regenerates_stale_index() {
        let path = temp_path("stale-index");
        let mut store = seeded_store();
        let entity = new_entity(&mut store);
        let assertion = add_name(&mut store, entity, "Alfred");
        store.save_jsonl(&path).expect("save should succeed");

        write_records_to_path(
            index_path_for(&path),
            &sentinel_index("eats1_stale".to_string(), entity, assertion),
        )
        .expect("index fixture should write");

        let loaded = MemoryStore::load_jsonl(&path).expect("load should succeed");
        assert_eq!(loaded.lookup_entities("Alfred", &[]), vec![entity]);
        assert_eq!(loaded.lookup_entities("Sent", &[]), Vec::<EntityId>::new());
        assert_eq!(loaded.index().rows(), store.index().rows());

        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn load_regenerates_missing_or_malformed_index() {
        let path = temp_path("missing-index");
        let mut store = seeded_store();
        let entity = new_entity(&mut store);
        add_name(&mut store, entity, "Alfred");
        store.save_jsonl(&path).expect("save should succeed");

        fs::remove_file(index_path_for(&path)).expect("index should exist");
        let loaded = MemoryStore::load_jsonl(&path).expect("load should succeed");
        assert_eq!(loaded.index().rows(), store.index().rows());

        fs::write(index_path_for(&path), "{not json}\n").expect("index fixture should write");
        let loaded = MemoryStore::load_jsonl(&path).expect("load should succeed");
        assert_eq!(loaded.index().rows(), store.index().rows());

        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn name_parts_are_indexed_and_assembled() {
        let mut store = seeded_store();
        store
            .add_script(Script::new("Jpan", "Japanese").with_separator(""))
            .expect("script should add");
        let entity = new_entity(&mut store);
        let name = Name::new("", "en", "Latn", "regular").with_parts([
            NamePart::new("family", "Bach", "en", "Latn", 1),
            NamePart::new("given", "Sebastian", "en", "Latn", 2),
            NamePart::new("given", "Johann", "en", "Latn", 1),
        ]);
        let assertion = store
            .create_name_assertion(entity, &authority_id("wtap"), name, true)
            .expect("name should add");

        assert_eq!(store.lookup_entities("Seb Bach", &[]), vec![entity]);
        let terms: Vec<&str> = store.index().terms(assertion).collect();
        assert_eq!(terms, vec!["Bach", "Johann", "Sebastian"]);

        let preferred = store
            .preferred_name(entity, &NamePreferences::default())
            .expect("entity exists");
        let named = preferred.assertion().expect("entity is named");
        assert_eq!(store.assembled_form(&named.name), "Johann Sebastian Bach");

        let mut unlisted = named.name.clone();
        unlisted.language = "mi".into();
        unlisted.script = "Jpan".into();
        assert_eq!(store.assembled_form(&unlisted), "BachJohannSebastian");
    }

    #[test]
    fn update_name_assertion_reindexes_changed_parts() {
        let mut store = seeded_store();
        let entity = new_entity(&mut store);
        let name = Name::new("", "en", "Latn", "regular")
            .with_parts([NamePart::new("given", "Johann", "en", "Latn", 1)]);
        let assertion = store
            .create_name_assertion(entity, &authority_id("wtap"), name.clone(), true)
            .expect("name should add");

        let renamed = name.with_parts([NamePart::new("given", "Anna", "en", "Latn", 1)]);
        store
            .update_name_assertion(assertion, renamed, true)
            .expect("update should succeed");

        assert_eq!(store.lookup_entities("Joh", &[]), Vec::<EntityId>::new());
        assert_eq!(store.lookup_entities("Ann", &[]), vec![entity]);
    }

    #[test]
    fn merge_entities_drops_relationships_between_merged_entities() {
        let mut store = seeded_store();
        let target = new_entity(&mut store);
        let source = new_entity(&mut store);
        let other = new_entity(&mut store);
        for (domain, range) in [(target, source), (source, target), (source, other)] {
            store
                .create_relationship_assertion(
                    domain,
                    &authority_id("wtap"),
                    "is_child_of".into(),
                    range,
                )
                .expect("relationship should add");
        }

        store
            .merge_entities(target, source)
            .expect("merge should succeed");

        let ranges: Vec<EntityId> = store
            .entity(target)
            .expect("exists")
            .relationships()
            .map(|r| r.range_entity)
            .collect();
        assert_eq!(ranges, vec![other]);

        let err = store
            .create_relationship_assertion(
                target,
                &authority_id("wtap"),
                "is_child_of".into(),
                target,
            )
            .expect_err("self-relationship must fail");
        assert!(matches!(err, EatsError::Validation(_)));
    }

    #[test]
    fn from_records_rejects_shared_assertion_ids() {
        let mut first = EntityRecord::new(EntityId(1), authority_id("wtap"));
        let mut second = EntityRecord::new(EntityId(2), authority_id("wtap"));
        let note = |id| {
            PropertyAssertion::Note(NoteAssertion {
                header: AssertionHeader {
                    id: AssertionId(id),
                    authority: authority_id("wtap"),
                },
                note: String::new(),
            })
        };
        first.assertions.push(note(1));
        second.assertions.push(note(1));

        let err = MemoryStore::from_records(vec![
            StoreRecord::Entity(first),
            StoreRecord::Entity(second),
        ])
        .expect_err("shared assertion id must fail");
        assert!(matches!(err, StoreError::Inconsistent(_)));
    }
}
