//! # EATS Core
//!
//! Entity Authority Tool Set: authority-scoped information about named
//! entities (people, places, organisations), contributed by independent
//! authorities over a shared entity space.
//!
//! This crate holds the pure parts of the system:
//! - the record types (`Entity`-side assertions, authorities, infrastructure)
//! - the name-form generator used to index names and search queries
//! - the preferred-name resolver used by every display surface
//!
//! Nothing here performs I/O. Storage and search are in `eats-store`.
//!
//! ## Data model
//!
//! ```text
//! Authority ── enables ──▶ Language / Script / NameType / NamePartType / EntityType
//!     │
//!     └── asserts ──▶ PropertyAssertion ──▶ Entity
//!                        ├─ Name        (text, language, script, type, parts)
//!                        ├─ EntityType
//!                        ├─ Relationship
//!                        └─ Note
//! ```

pub mod error;
pub mod model;
pub mod name_form;
pub mod preferred;

pub use error::EatsError;
pub use model::{
    AssertionHeader, AssertionId, Authority, AuthorityId, EntityId, EntityType,
    EntityTypeAssertion, Language, LanguageCode, Name, NameAssertion, NamePart, NamePartType,
    NameType, NoteAssertion, PropertyAssertion, RelationshipAssertion, RelationshipType, Script, ScriptCode,
};
pub use name_form::{
    LATIN_SCRIPT_CODE, abbreviate_name, asciify_name, create_name_forms, demacronise_name,
    index_terms, substitute_ascii, unpunctuate_name,
};
pub use preferred::{NamePreferences, PreferredName, UNNAMED_ENTITY_NAME, resolve_preferred_name};
