//! Record types: identifiers, infrastructure, authorities, and the
//! property assertions an authority makes about an entity.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::EatsError;

/// Identifier of an entity. Allocated in creation order by the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

/// Identifier of a property assertion. Allocated in creation order by the
/// store, across all entities, so it doubles as a stable tie-break.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct AssertionId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AssertionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! code_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                Self(code.to_string())
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                Self(code)
            }
        }
    };
}

code_newtype!(
    /// Identifier of a data-contributing authority.
    AuthorityId
);
code_newtype!(
    /// ISO language code, e.g. `en`, `mi`.
    LanguageCode
);
code_newtype!(
    /// ISO 15924 script code, e.g. `Latn`, `Arab`.
    ScriptCode
);
code_newtype!(
    /// Name type label, e.g. `regular`, `pseudonym`.
    NameType
);
code_newtype!(
    /// Name part type label, e.g. `given`, `family`.
    NamePartType
);
code_newtype!(
    /// Entity type label, e.g. `person`, `place`.
    EntityType
);
code_newtype!(
    /// Entity relationship type label, e.g. `is_child_of`.
    RelationshipType
);

/// A language that names may be written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: LanguageCode,
    pub name: String,
    /// Display order of name part types for names in this language.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name_part_types: Vec<NamePartType>,
}

impl Language {
    pub fn new(code: impl Into<LanguageCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            name_part_types: Vec::new(),
        }
    }

    pub fn with_name_part_types<I, T>(mut self, name_part_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NamePartType>,
    {
        self.name_part_types = name_part_types.into_iter().map(Into::into).collect();
        self
    }
}

/// A script that names may be written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub code: ScriptCode,
    pub name: String,
    /// Placed between name parts when assembling a display form.
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Script {
    pub fn new(code: impl Into<ScriptCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            separator: default_separator(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

fn default_separator() -> String {
    " ".to_string()
}

/// An independent data-contributing authority and the infrastructure
/// components it has enabled for its assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub id: AuthorityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub languages: BTreeSet<LanguageCode>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub scripts: BTreeSet<ScriptCode>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub name_types: BTreeSet<NameType>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub name_part_types: BTreeSet<NamePartType>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub entity_types: BTreeSet<EntityType>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub relationship_types: BTreeSet<RelationshipType>,
}

impl Authority {
    pub fn new(id: impl Into<AuthorityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            languages: BTreeSet::new(),
            scripts: BTreeSet::new(),
            name_types: BTreeSet::new(),
            name_part_types: BTreeSet::new(),
            entity_types: BTreeSet::new(),
            relationship_types: BTreeSet::new(),
        }
    }

    pub fn with_languages<I, T>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<LanguageCode>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scripts<I, T>(mut self, scripts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ScriptCode>,
    {
        self.scripts = scripts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_name_types<I, T>(mut self, name_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NameType>,
    {
        self.name_types = name_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_name_part_types<I, T>(mut self, name_part_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NamePartType>,
    {
        self.name_part_types = name_part_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_entity_types<I, T>(mut self, entity_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityType>,
    {
        self.entity_types = entity_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_relationship_types<I, T>(mut self, relationship_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RelationshipType>,
    {
        self.relationship_types = relationship_types.into_iter().map(Into::into).collect();
        self
    }

    /// Check that `name` and each of its parts only use components this
    /// authority has enabled.
    pub fn validate_name(&self, name: &Name) -> Result<(), EatsError> {
        if name.display_form.trim().is_empty() && name.parts.is_empty() {
            return Err(EatsError::Validation(
                "a name needs a display form or at least one part".to_string(),
            ));
        }
        self.validate_language_script(&name.language, &name.script)?;
        if !self.name_types.contains(&name.name_type) {
            return Err(self.not_enabled("name type", name.name_type.as_str()));
        }
        for part in &name.parts {
            self.validate_language_script(&part.language, &part.script)?;
            if !self.name_part_types.contains(&part.name_part_type) {
                return Err(self.not_enabled("name part type", part.name_part_type.as_str()));
            }
        }
        Ok(())
    }

    fn validate_language_script(
        &self,
        language: &LanguageCode,
        script: &ScriptCode,
    ) -> Result<(), EatsError> {
        if !self.languages.contains(language) {
            return Err(self.not_enabled("language", language.as_str()));
        }
        if !self.scripts.contains(script) {
            return Err(self.not_enabled("script", script.as_str()));
        }
        Ok(())
    }

    pub fn validate_entity_type(&self, entity_type: &EntityType) -> Result<(), EatsError> {
        if self.entity_types.contains(entity_type) {
            Ok(())
        } else {
            Err(self.not_enabled("entity type", entity_type.as_str()))
        }
    }

    pub fn validate_relationship_type(
        &self,
        relationship_type: &RelationshipType,
    ) -> Result<(), EatsError> {
        if self.relationship_types.contains(relationship_type) {
            Ok(())
        } else {
            Err(self.not_enabled("relationship type", relationship_type.as_str()))
        }
    }

    fn not_enabled(&self, kind: &str, value: &str) -> EatsError {
        EatsError::Validation(format!(
            "{kind} `{value}` is not enabled for authority `{}`",
            self.id
        ))
    }
}

/// An asserted name: raw text plus the language, script, and type it is
/// asserted in.
///
/// A name may also be structured as parts (given name, family name, ...).
/// Parts are indexed alongside the display form, and stand in for it when
/// it is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub display_form: String,
    pub language: LanguageCode,
    pub script: ScriptCode,
    pub name_type: NameType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<NamePart>,
}

/// One typed element of a structured name, in its own language and script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePart {
    pub display_form: String,
    pub language: LanguageCode,
    pub script: ScriptCode,
    pub name_part_type: NamePartType,
    /// Position among parts of the same type, lowest first.
    #[serde(default)]
    pub order: u32,
}

impl NamePart {
    pub fn new(
        name_part_type: impl Into<NamePartType>,
        display_form: impl Into<String>,
        language: impl Into<LanguageCode>,
        script: impl Into<ScriptCode>,
        order: u32,
    ) -> Self {
        Self {
            display_form: display_form.into(),
            language: language.into(),
            script: script.into(),
            name_part_type: name_part_type.into(),
            order,
        }
    }

    fn form_key(&self) -> (&str, &LanguageCode, &ScriptCode) {
        (&self.display_form, &self.language, &self.script)
    }
}

impl Name {
    pub fn new(
        display_form: impl Into<String>,
        language: impl Into<LanguageCode>,
        script: impl Into<ScriptCode>,
        name_type: impl Into<NameType>,
    ) -> Self {
        Self {
            display_form: display_form.into(),
            language: language.into(),
            script: script.into(),
            name_type: name_type.into(),
            parts: Vec::new(),
        }
    }

    pub fn with_parts(mut self, parts: impl IntoIterator<Item = NamePart>) -> Self {
        self.parts = parts.into_iter().collect();
        self
    }

    /// Whether replacing `self` with `other` changes the generated name forms.
    pub fn forms_differ(&self, other: &Name) -> bool {
        self.display_form != other.display_form
            || self.language != other.language
            || self.script != other.script
            || !self
                .parts
                .iter()
                .map(NamePart::form_key)
                .eq(other.parts.iter().map(NamePart::form_key))
    }

    /// The display form, or when it is empty, the parts joined by
    /// `separator`.
    ///
    /// Parts are grouped by their type's position in `part_type_order`,
    /// then by `order`. Types missing from `part_type_order` come last.
    pub fn assembled_form(
        &self,
        part_type_order: &[NamePartType],
        separator: &str,
    ) -> Cow<'_, str> {
        if !self.display_form.is_empty() || self.parts.is_empty() {
            return Cow::Borrowed(&self.display_form);
        }
        let rank = |part: &NamePart| {
            part_type_order
                .iter()
                .position(|t| *t == part.name_part_type)
                .unwrap_or(part_type_order.len())
        };
        let mut parts: Vec<&NamePart> = self.parts.iter().collect();
        parts.sort_by_key(|part| (rank(part), part.order));
        let forms: Vec<&str> = parts.iter().map(|part| part.display_form.as_str()).collect();
        Cow::Owned(forms.join(separator))
    }
}

/// Fields shared by every property assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionHeader {
    pub id: AssertionId,
    pub authority: AuthorityId,
}

/// An authority's claim that an entity bears a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAssertion {
    #[serde(flatten)]
    pub header: AssertionHeader,
    pub name: Name,
    #[serde(default)]
    pub is_preferred: bool,
}

impl NameAssertion {
    pub fn id(&self) -> AssertionId {
        self.header.id
    }

    pub fn authority(&self) -> &AuthorityId {
        &self.header.authority
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeAssertion {
    #[serde(flatten)]
    pub header: AssertionHeader,
    pub entity_type: EntityType,
}

/// A typed, directed relationship from the asserting entity (domain) to
/// `range_entity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipAssertion {
    #[serde(flatten)]
    pub header: AssertionHeader,
    pub relationship_type: RelationshipType,
    pub range_entity: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAssertion {
    #[serde(flatten)]
    pub header: AssertionHeader,
    pub note: String,
}

/// A property an authority asserts about an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "property", rename_all = "snake_case")]
pub enum PropertyAssertion {
    Name(NameAssertion),
    EntityType(EntityTypeAssertion),
    Relationship(RelationshipAssertion),
    Note(NoteAssertion),
}

impl PropertyAssertion {
    pub fn header(&self) -> &AssertionHeader {
        match self {
            PropertyAssertion::Name(a) => &a.header,
            PropertyAssertion::EntityType(a) => &a.header,
            PropertyAssertion::Relationship(a) => &a.header,
            PropertyAssertion::Note(a) => &a.header,
        }
    }

    pub fn id(&self) -> AssertionId {
        self.header().id
    }

    pub fn authority(&self) -> &AuthorityId {
        &self.header().authority
    }

    pub fn as_name(&self) -> Option<&NameAssertion> {
        match self {
            PropertyAssertion::Name(a) => Some(a),
            _ => None,
        }
    }

    /// The `property` tag this assertion serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyAssertion::Name(_) => "name",
            PropertyAssertion::EntityType(_) => "entity_type",
            PropertyAssertion::Relationship(_) => "relationship",
            PropertyAssertion::Note(_) => "note",
        }
    }
}
