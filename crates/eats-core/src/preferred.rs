//! Preferred-name resolution.
//!
//! Selects the single name of an entity to show a viewer, given the
//! viewer's preferred authority, language, and script. Precedence, most
//! significant first:
//!
//! ```text
//! script     ← a name in the wrong script is unreadable
//! authority  ← whose data the viewer trusts
//! language
//! is_preferred flag
//! lowest assertion id (creation order)
//! ```
//!
//! A narrowing step is skipped when its preference is unset or when no
//! candidate satisfies it.

use serde::{Deserialize, Serialize};

use crate::model::{AuthorityId, LanguageCode, NameAssertion, ScriptCode};

/// Label shown for an entity that has no names.
pub const UNNAMED_ENTITY_NAME: &str = "[unnamed entity]";

/// A viewer's display preferences. Any field may be unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<AuthorityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptCode>,
}

impl NamePreferences {
    pub fn new(
        authority: Option<AuthorityId>,
        language: Option<LanguageCode>,
        script: Option<ScriptCode>,
    ) -> Self {
        Self {
            authority,
            language,
            script,
        }
    }

    /// Fill unset fields from `fallback`.
    pub fn or(self, fallback: &NamePreferences) -> Self {
        Self {
            authority: self.authority.or_else(|| fallback.authority.clone()),
            language: self.language.or_else(|| fallback.language.clone()),
            script: self.script.or_else(|| fallback.script.clone()),
        }
    }
}

/// Outcome of preferred-name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredName<'a> {
    Named(&'a NameAssertion),
    /// The entity has no name assertions.
    Unnamed,
}

impl<'a> PreferredName<'a> {
    pub fn assertion(&self) -> Option<&'a NameAssertion> {
        match *self {
            PreferredName::Named(assertion) => Some(assertion),
            PreferredName::Unnamed => None,
        }
    }

    /// Display form of the selected name, or the unnamed placeholder.
    pub fn form(&self) -> &'a str {
        match *self {
            PreferredName::Named(assertion) => &assertion.name.display_form,
            PreferredName::Unnamed => UNNAMED_ENTITY_NAME,
        }
    }
}

/// Resolve the best-matching name among `names` for `preferences`.
pub fn resolve_preferred_name<'a>(
    preferences: &NamePreferences,
    names: impl IntoIterator<Item = &'a NameAssertion>,
) -> PreferredName<'a> {
    let mut candidates: Vec<&NameAssertion> = names.into_iter().collect();
    if candidates.is_empty() {
        return PreferredName::Unnamed;
    }

    if let Some(script) = &preferences.script {
        narrow(&mut candidates, |a| &a.name.script == script);
    }
    if let Some(authority) = &preferences.authority {
        narrow(&mut candidates, |a| a.authority() == authority);
    }
    if let Some(language) = &preferences.language {
        narrow(&mut candidates, |a| &a.name.language == language);
    }
    narrow(&mut candidates, |a| a.is_preferred);

    candidates
        .into_iter()
        .min_by_key(|a| a.id())
        .map_or(PreferredName::Unnamed, PreferredName::Named)
}

/// Keep only candidates matching `predicate`, unless none do.
fn narrow(candidates: &mut Vec<&NameAssertion>, predicate: impl Fn(&NameAssertion) -> bool) {
    if candidates.iter().any(|a| predicate(a)) {
        candidates.retain(|a| predicate(a));
    }
}
