//! Entity type: the subject that authorities make assertions about.

use chrono::{DateTime, Utc};
use eats_core::{
    AssertionId, AuthorityId, EntityId, EntityType, NameAssertion, PropertyAssertion,
    RelationshipAssertion,
};
use serde::{Deserialize, Serialize};

/// An entity and every property assertion made about it.
///
/// Identity is independent of any name: an entity may have no names at
/// all, or names from several authorities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,

    /// Authority that asserted the entity's existence.
    pub created_by: AuthorityId,

    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,

    /// Property assertions in creation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertions: Vec<PropertyAssertion>,
}

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

impl EntityRecord {
    pub fn new(id: EntityId, created_by: AuthorityId) -> Self {
        Self {
            id,
            created_by,
            created_at: Utc::now(),
            assertions: Vec::new(),
        }
    }

    pub fn assertion(&self, id: AssertionId) -> Option<&PropertyAssertion> {
        self.assertions.iter().find(|a| a.id() == id)
    }

    pub fn assertion_mut(&mut self, id: AssertionId) -> Option<&mut PropertyAssertion> {
        self.assertions.iter_mut().find(|a| a.id() == id)
    }

    /// Name assertions in creation order.
    pub fn name_assertions(&self) -> impl Iterator<Item = &NameAssertion> {
        self.assertions.iter().filter_map(PropertyAssertion::as_name)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.assertions.iter().filter_map(|a| match a {
            PropertyAssertion::EntityType(assertion) => Some(&assertion.entity_type),
            _ => None,
        })
    }

    /// Relationships for which this entity is the domain.
    pub fn relationships(&self) -> impl Iterator<Item = &RelationshipAssertion> {
        self.assertions.iter().filter_map(|a| match a {
            PropertyAssertion::Relationship(assertion) => Some(assertion),
            _ => None,
        })
    }

    pub fn has_entity_type(&self, entity_type: &EntityType) -> bool {
        self.entity_types().any(|t| t == entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eats_core::{AssertionHeader, EntityTypeAssertion, Name};

    fn header(id: u64) -> AssertionHeader {
        AssertionHeader {
            id: AssertionId(id),
            authority: AuthorityId::new("wtap"),
        }
    }

    #[test]
    fn name_assertions_skip_other_properties() {
        let mut entity = EntityRecord::new(EntityId(1), AuthorityId::new("wtap"));
        entity
            .assertions
            .push(PropertyAssertion::EntityType(EntityTypeAssertion {
                header: header(1),
                entity_type: EntityType::new("person"),
            }));
        entity.assertions.push(PropertyAssertion::Name(NameAssertion {
            header: header(2),
            name: Name::new("Alfred", "en", "Latn", "regular"),
            is_preferred: true,
        }));

        let ids: Vec<AssertionId> = entity.name_assertions().map(|a| a.id()).collect();
        assert_eq!(ids, vec![AssertionId(2)]);
        assert!(entity.has_entity_type(&EntityType::new("person")));
        assert!(!entity.has_entity_type(&EntityType::new("place")));
    }

    #[test]
    fn entity_record_parses_without_assertions() {
        let raw = r#"{"id":3,"created_by":"wtap","created_at":"2024-01-01T00:00:00Z"}"#;
        let entity: EntityRecord = serde_json::from_str(raw).expect("must parse entity");
        assert_eq!(entity.id, EntityId(3));
        assert!(entity.assertions.is_empty());
    }
}
