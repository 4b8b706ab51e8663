//! Relationship engine: like, bookmark and follow toggles.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::authz::{self, Action, Resource};
use crate::domain::{Actor, RelationKind, ToggleState, User};
use crate::error::DomainError;
use crate::ports::{ArticleRepository, RelationRepository, UserRepository};

use super::Repositories;

pub struct RelationService {
    relations: Arc<dyn RelationRepository>,
    users: Arc<dyn UserRepository>,
    articles: Arc<dyn ArticleRepository>,
}

impl RelationService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            relations: repos.relations.clone(),
            users: repos.users.clone(),
            articles: repos.articles.clone(),
        }
    }

    /// Flip the caller's `kind` edge to `target_id`.
    ///
    /// Authors may like or bookmark their own articles; following yourself is
    /// refused.
    pub async fn toggle(
        &self,
        kind: RelationKind,
        actor: Option<&Actor>,
        target_id: Uuid,
    ) -> Result<ToggleState, DomainError> {
        let actor = authz::require_actor(actor)?;
        authz::authorize(Action::Toggle, Some(actor), &Resource::Relation)?;
        self.ensure_target(kind, target_id).await?;

        if kind == RelationKind::Follow && actor.user_id == target_id {
            return Err(DomainError::SelfFollow);
        }

        let state = self
            .relations
            .toggle(kind, actor.user_id, target_id)
            .await?;

        tracing::info!(
            relation = kind.as_str(),
            actor = %actor.user_id,
            target = %target_id,
            ?state,
            "Relation toggled"
        );
        Ok(state)
    }

    pub async fn toggle_like(
        &self,
        actor: Option<&Actor>,
        article_id: Uuid,
    ) -> Result<ToggleState, DomainError> {
        self.toggle(RelationKind::Like, actor, article_id).await
    }

    pub async fn toggle_bookmark(
        &self,
        actor: Option<&Actor>,
        article_id: Uuid,
    ) -> Result<ToggleState, DomainError> {
        self.toggle(RelationKind::Bookmark, actor, article_id).await
    }

    pub async fn toggle_follow(
        &self,
        actor: Option<&Actor>,
        user_id: Uuid,
    ) -> Result<ToggleState, DomainError> {
        self.toggle(RelationKind::Follow, actor, user_id).await
    }

    pub async fn contains(
        &self,
        kind: RelationKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, DomainError> {
        Ok(self.relations.contains(kind, actor_id, target_id).await?)
    }

    /// Active identities holding a `kind` edge to `target_id`, oldest edge first.
    pub async fn list_actors(
        &self,
        kind: RelationKind,
        target_id: Uuid,
    ) -> Result<Vec<User>, DomainError> {
        self.ensure_target(kind, target_id).await?;

        let ids = self.relations.actors(kind, target_id).await?;
        let mut by_id: HashMap<Uuid, User> = self
            .users
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .filter(|u| u.is_active)
            .collect())
    }

    pub async fn likers(&self, article_id: Uuid) -> Result<Vec<User>, DomainError> {
        self.list_actors(RelationKind::Like, article_id).await
    }

    pub async fn bookmarkers(&self, article_id: Uuid) -> Result<Vec<User>, DomainError> {
        self.list_actors(RelationKind::Bookmark, article_id).await
    }

    pub async fn followers(&self, user_id: Uuid) -> Result<Vec<User>, DomainError> {
        self.list_actors(RelationKind::Follow, user_id).await
    }

    async fn ensure_target(&self, kind: RelationKind, target_id: Uuid) -> Result<(), DomainError> {
        let exists = if kind.targets_article() {
            self.articles.find_by_id(target_id).await?.is_some()
        } else {
            self.users.find_by_id(target_id).await?.is_some()
        };

        if exists {
            Ok(())
        } else if kind.targets_article() {
            Err(DomainError::not_found("article", target_id))
        } else {
            Err(DomainError::not_found("user", target_id))
        }
    }
}
