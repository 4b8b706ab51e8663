//! Authorization rules.
//!
//! | Resource   | Read                             | Mutate                 |
//! |------------|----------------------------------|------------------------|
//! | Article    | anyone                           | author only            |
//! | Comment    | anyone                           | author only            |
//! | Profile    | anyone, unless deactivated (404) | the profile's identity |
//! | Relation   | -                                | any authenticated user |
//! | Collection | anyone                           | any authenticated user |
//!
//! Unsafe actions check authentication before ownership, so an anonymous
//! caller can never learn who owns a resource. The admin flag grants nothing
//! here.

use uuid::Uuid;

use crate::domain::{Actor, Article, Comment, User};
use crate::error::DomainError;

/// What the caller wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Toggle,
}

impl Action {
    /// Safe actions never change state.
    pub fn is_safe(self) -> bool {
        matches!(self, Self::Read)
    }
}

/// The target of an action.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Article(&'a Article),
    Comment(&'a Comment),
    /// A profile, represented by the identity that owns it.
    Profile(&'a User),
    /// The caller's own relation edge.
    Relation,
    /// A listing that new content is created in.
    Collection,
}

impl Resource<'_> {
    /// The identity that owns the resource, if ownership applies.
    pub fn owner_id(&self) -> Option<Uuid> {
        match self {
            Self::Article(article) => Some(article.author_id),
            Self::Comment(comment) => Some(comment.author_id),
            Self::Profile(user) => Some(user.id),
            Self::Relation | Self::Collection => None,
        }
    }

    /// Deactivated identities' profiles are hidden from every path.
    fn suppressed(&self) -> Option<Uuid> {
        match self {
            Self::Profile(user) if !user.is_active => Some(user.id),
            _ => None,
        }
    }
}

/// Check whether `requester` may perform `action` on `resource`.
pub fn authorize(
    action: Action,
    requester: Option<&Actor>,
    resource: &Resource<'_>,
) -> Result<(), DomainError> {
    if action.is_safe() {
        return match resource.suppressed() {
            Some(id) => Err(DomainError::Deactivated { id }),
            None => Ok(()),
        };
    }

    let actor = require_actor(requester)?;

    if let Some(owner) = resource.owner_id() {
        if owner != actor.user_id {
            tracing::debug!(
                actor = %actor.user_id,
                owner = %owner,
                ?action,
                "Ownership check failed"
            );
            return Err(DomainError::AuthorizationDenied);
        }
    }

    match resource.suppressed() {
        Some(id) => Err(DomainError::Deactivated { id }),
        None => Ok(()),
    }
}

/// Boolean form of [`authorize`].
pub fn is_allowed(action: Action, requester: Option<&Actor>, resource: &Resource<'_>) -> bool {
    authorize(action, requester, resource).is_ok()
}

/// Unwrap the requester or fail with `AuthenticationRequired`.
pub fn require_actor(requester: Option<&Actor>) -> Result<&Actor, DomainError> {
    requester.ok_or(DomainError::AuthenticationRequired)
}
