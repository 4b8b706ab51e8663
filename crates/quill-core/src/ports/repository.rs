use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Article, Comment, Page, PageRequest, Profile, RelationKind, ToggleState, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Unique-key clashes surface as `RepoError::Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, cascading to dependent rows.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with identity-specific lookups.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Resolve many users at once. Missing ids are skipped; order is unspecified.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;

    /// Store a user and its profile as one unit.
    async fn insert_with_profile(&self, user: User, profile: Profile) -> Result<User, RepoError>;
}

/// Profile repository, keyed by the owning user's id.
#[async_trait]
pub trait ProfileRepository: BaseRepository<Profile, Uuid> {}

/// Which articles a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleFilter {
    All,
    /// Articles written by any of these authors.
    Authors(Vec<Uuid>),
    /// Exactly these articles.
    Ids(Vec<Uuid>),
}

/// Article repository.
#[async_trait]
pub trait ArticleRepository: BaseRepository<Article, Uuid> {
    /// List matching articles, newest first.
    async fn list(
        &self,
        filter: &ArticleFilter,
        page: PageRequest,
    ) -> Result<Page<Article>, RepoError>;

    /// All articles by one author, newest first.
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Article>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on an article, oldest first.
    async fn find_by_article(&self, article_id: Uuid) -> Result<Vec<Comment>, RepoError>;

    async fn count_by_article(&self, article_id: Uuid) -> Result<u64, RepoError>;

    /// Comment counts for many articles at once. Articles without comments
    /// may be absent from the map.
    async fn count_by_articles(&self, article_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError>;
}

/// Set-valued (actor, target) edges for likes, bookmarks and follows.
#[async_trait]
pub trait RelationRepository: Send + Sync {
    /// Flip membership of the edge. Must be atomic per (kind, actor, target).
    async fn toggle(
        &self,
        kind: RelationKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<ToggleState, RepoError>;

    async fn contains(
        &self,
        kind: RelationKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, RepoError>;

    /// Actors with an edge to `target_id`, in edge creation order.
    async fn actors(&self, kind: RelationKind, target_id: Uuid) -> Result<Vec<Uuid>, RepoError>;

    /// Targets of `actor_id`'s edges, in edge creation order.
    async fn targets(&self, kind: RelationKind, actor_id: Uuid) -> Result<Vec<Uuid>, RepoError>;

    async fn count(&self, kind: RelationKind, target_id: Uuid) -> Result<u64, RepoError>;

    /// Edge counts for many targets at once. Targets without edges may be
    /// absent from the map.
    async fn count_many(
        &self,
        kind: RelationKind,
        target_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, u64>, RepoError>;
}
