//! In-memory store - used when no database is configured, and in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{
    Article, Comment, Page, PageRequest, Profile, RelationKind, ToggleState, User,
};
use quill_core::error::RepoError;
use quill_core::ports::{
    ArticleFilter, ArticleRepository, BaseRepository, CommentRepository, ProfileRepository,
    RelationRepository, UserRepository,
};
use quill_core::services::Repositories;

#[derive(Debug, Clone)]
struct Edge {
    actor: Uuid,
    target: Uuid,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, Profile>,
    articles: HashMap<Uuid, Article>,
    comments: HashMap<Uuid, Comment>,
    /// Edges per relation, in creation order.
    edges: HashMap<RelationKind, Vec<Edge>>,
}

impl Tables {
    fn edges(&self, kind: RelationKind) -> &[Edge] {
        self.edges.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    fn unique_violation(&self, user: &User) -> Option<&'static str> {
        self.users.values().find_map(|other| {
            if other.id == user.id {
                None
            } else if other.username == user.username {
                Some("users_username_key")
            } else if other.email == user.email {
                Some("users_email_key")
            } else {
                None
            }
        })
    }

    fn remove_article(&mut self, article_id: Uuid) -> Option<Article> {
        let article = self.articles.remove(&article_id)?;
        self.comments.retain(|_, c| c.article_id != article_id);
        for kind in [RelationKind::Like, RelationKind::Bookmark] {
            if let Some(edges) = self.edges.get_mut(&kind) {
                edges.retain(|e| e.target != article_id);
            }
        }
        Some(article)
    }

    fn remove_user(&mut self, user_id: Uuid) -> Option<User> {
        let user = self.users.remove(&user_id)?;
        self.profiles.remove(&user_id);

        let authored: Vec<Uuid> = self
            .articles
            .values()
            .filter(|a| a.author_id == user_id)
            .map(|a| a.id)
            .collect();
        for article_id in authored {
            self.remove_article(article_id);
        }

        self.comments.retain(|_, c| c.author_id != user_id);
        for (kind, edges) in self.edges.iter_mut() {
            edges.retain(|e| {
                e.actor != user_id && (kind.targets_article() || e.target != user_id)
            });
        }
        Some(user)
    }
}

/// All repositories over one set of tables behind an async `RwLock`.
///
/// Every write, including the toggle's check-then-act, runs under a single
/// write guard. Data is lost on process restart.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out this store as every repository port.
    pub fn repositories(&self) -> Repositories {
        let store = Arc::new(self.clone());
        Repositories {
            users: store.clone(),
            profiles: store.clone(),
            articles: store.clone(),
            comments: store.clone(),
            relations: store,
        }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(RepoError::Constraint("users_pkey".to_string()));
        }
        if let Some(key) = tables.unique_violation(&user) {
            return Err(RepoError::Constraint(key.to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        if let Some(key) = tables.unique_violation(&user) {
            return Err(RepoError::Constraint(key.to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.remove_user(id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id))
            .cloned()
            .collect())
    }

    async fn insert_with_profile(&self, user: User, profile: Profile) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(RepoError::Constraint("users_pkey".to_string()));
        }
        if let Some(key) = tables.unique_violation(&user) {
            return Err(RepoError::Constraint(key.to_string()));
        }
        tables.profiles.insert(profile.user_id, profile);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl BaseRepository<Profile, Uuid> for InMemoryStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<Profile>, RepoError> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn insert(&self, profile: Profile) -> Result<Profile, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&profile.user_id) {
            return Err(RepoError::Constraint("profiles_user_id_fkey".to_string()));
        }
        if tables.profiles.contains_key(&profile.user_id) {
            return Err(RepoError::Constraint("profiles_pkey".to_string()));
        }
        tables.profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn update(&self, profile: Profile) -> Result<Profile, RepoError> {
        let mut tables = self.tables.write().await;
        match tables.profiles.get_mut(&profile.user_id) {
            Some(slot) => {
                *slot = profile.clone();
                Ok(profile)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables
            .profiles
            .remove(&user_id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

impl ProfileRepository for InMemoryStore {}

#[async_trait]
impl BaseRepository<Article, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, RepoError> {
        Ok(self.tables.read().await.articles.get(&id).cloned())
    }

    async fn insert(&self, article: Article) -> Result<Article, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&article.author_id) {
            return Err(RepoError::Constraint("articles_author_id_fkey".to_string()));
        }
        if tables.articles.contains_key(&article.id) {
            return Err(RepoError::Constraint("articles_pkey".to_string()));
        }
        tables.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn update(&self, article: Article) -> Result<Article, RepoError> {
        let mut tables = self.tables.write().await;
        match tables.articles.get_mut(&article.id) {
            Some(slot) => {
                *slot = article.clone();
                Ok(article)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.remove_article(id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl ArticleRepository for InMemoryStore {
    async fn list(
        &self,
        filter: &ArticleFilter,
        page: PageRequest,
    ) -> Result<Page<Article>, RepoError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Article> = tables
            .articles
            .values()
            .filter(|a| match filter {
                ArticleFilter::All => true,
                ArticleFilter::Authors(authors) => authors.contains(&a.author_id),
                ArticleFilter::Ids(ids) => ids.contains(&a.id),
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, total, page))
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Article>, RepoError> {
        let tables = self.tables.read().await;
        let mut articles: Vec<Article> = tables
            .articles
            .values()
            .filter(|a| a.author_id == author_id)
            .cloned()
            .collect();
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(articles)
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.articles.contains_key(&comment.article_id) {
            return Err(RepoError::Constraint("comments_article_id_fkey".to_string()));
        }
        if !tables.users.contains_key(&comment.author_id) {
            return Err(RepoError::Constraint("comments_author_id_fkey".to_string()));
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        match tables.comments.get_mut(&comment.id) {
            Some(slot) => {
                *slot = comment.clone();
                Ok(comment)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn find_by_article(&self, article_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.article_id == article_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn count_by_article(&self, article_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.article_id == article_id)
            .count() as u64)
    }

    async fn count_by_articles(&self, article_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError> {
        let tables = self.tables.read().await;
        let mut counts = HashMap::new();
        for comment in tables.comments.values() {
            if article_ids.contains(&comment.article_id) {
                *counts.entry(comment.article_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl RelationRepository for InMemoryStore {
    async fn toggle(
        &self,
        kind: RelationKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<ToggleState, RepoError> {
        let mut tables = self.tables.write().await;
        let edges = tables.edges.entry(kind).or_default();

        match edges
            .iter()
            .position(|e| e.actor == actor_id && e.target == target_id)
        {
            Some(index) => {
                edges.remove(index);
                Ok(ToggleState::Removed)
            }
            None => {
                edges.push(Edge {
                    actor: actor_id,
                    target: target_id,
                });
                Ok(ToggleState::Added)
            }
        }
    }

    async fn contains(
        &self,
        kind: RelationKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .edges(kind)
            .iter()
            .any(|e| e.actor == actor_id && e.target == target_id))
    }

    async fn actors(&self, kind: RelationKind, target_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .edges(kind)
            .iter()
            .filter(|e| e.target == target_id)
            .map(|e| e.actor)
            .collect())
    }

    async fn targets(&self, kind: RelationKind, actor_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .edges(kind)
            .iter()
            .filter(|e| e.actor == actor_id)
            .map(|e| e.target)
            .collect())
    }

    async fn count(&self, kind: RelationKind, target_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .edges(kind)
            .iter()
            .filter(|e| e.target == target_id)
            .count() as u64)
    }

    async fn count_many(
        &self,
        kind: RelationKind,
        target_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, u64>, RepoError> {
        let tables = self.tables.read().await;
        let mut counts = HashMap::new();
        for edge in tables.edges(kind) {
            if target_ids.contains(&edge.target) {
                *counts.entry(edge.target).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}
