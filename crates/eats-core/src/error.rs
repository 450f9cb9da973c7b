//! Error types for EATS record operations.

use crate::model::{AssertionId, AuthorityId, EntityId};

/// Errors arising from invalid record operations.
///
/// The name-form generator and preferred-name resolver are total and never
/// produce these; they come from validation and repository lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EatsError {
    /// Data supplied for an assertion is not permitted by its authority.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unknown authority: {0}")]
    UnknownAuthority(AuthorityId),

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("unknown script: {0}")]
    UnknownScript(String),

    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The entity was merged into another; callers should redirect to `new`.
    #[error("entity {old} was merged into entity {new}")]
    EntityMerged { old: EntityId, new: EntityId },

    #[error("property assertion not found: {0}")]
    AssertionNotFound(AssertionId),

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },
}
