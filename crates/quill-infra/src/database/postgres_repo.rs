//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbConn, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement, TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::{
    Article, Comment, Page, PageRequest, Profile, RelationKind, ToggleState, User,
};
use quill_core::error::RepoError;
use quill_core::ports::{
    ArticleFilter, ArticleRepository, CommentRepository, ProfileRepository, RelationRepository,
    UserRepository,
};

use super::entity::article::{self, Entity as ArticleEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::profile::{self, Entity as ProfileEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL profile repository.
pub type PostgresProfileRepository = PostgresBaseRepository<ProfileEntity>;

/// PostgreSQL article repository.
pub type PostgresArticleRepository = PostgresBaseRepository<ArticleEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{masked_local}{domain}")
        }
        None => "***".to_string(),
    }
}

/// Row counts per key for `keys`, in one `GROUP BY` round trip. Keys with no
/// rows are absent from the map.
async fn grouped_counts(
    db: &DbConn,
    table: &str,
    key: &str,
    keys: &[Uuid],
) -> Result<HashMap<Uuid, u64>, RepoError> {
    if keys.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = (1..=keys.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        format!(
            "SELECT {key} AS id, COUNT(*) AS count FROM {table} WHERE {key} IN ({placeholders}) GROUP BY {key}"
        ),
        keys.iter().map(|id| (*id).into()).collect::<Vec<sea_orm::Value>>(),
    );

    let rows = db.query_all(stmt).await.map_err(map_db_err)?;
    rows.iter()
        .map(|row| {
            let id: Uuid = row.try_get("", "id").map_err(map_db_err)?;
            let count: i64 = row.try_get("", "count").map_err(map_db_err)?;
            Ok((id, count.max(0) as u64))
        })
        .collect()
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn insert_with_profile(&self, user: User, profile: Profile) -> Result<User, RepoError> {
        tracing::debug!(user_email = %mask_email(&user.email), "Creating user with profile");

        let txn = self.db.begin().await.map_err(map_db_err)?;
        let model = user::ActiveModel::from(user)
            .insert(&txn)
            .await
            .map_err(map_db_err)?;
        profile::ActiveModel::from(profile)
            .insert(&txn)
            .await
            .map_err(map_db_err)?;
        txn.commit().await.map_err(map_db_err)?;

        Ok(model.into())
    }
}

impl ProfileRepository for PostgresProfileRepository {}

#[async_trait]
impl ArticleRepository for PostgresArticleRepository {
    async fn list(
        &self,
        filter: &ArticleFilter,
        page: PageRequest,
    ) -> Result<Page<Article>, RepoError> {
        let query = match filter {
            ArticleFilter::All => ArticleEntity::find(),
            ArticleFilter::Authors(authors) => ArticleEntity::find()
                .filter(article::Column::AuthorId.is_in(authors.iter().copied())),
            ArticleFilter::Ids(ids) => {
                ArticleEntity::find().filter(article::Column::Id.is_in(ids.iter().copied()))
            }
        };

        let total = query.clone().count(&self.db).await.map_err(map_db_err)?;
        let models = query
            .order_by_desc(article::Column::CreatedAt)
            .order_by_desc(article::Column::Id)
            .offset(page.offset())
            .limit(page.per_page)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(Page::new(
            models.into_iter().map(Into::into).collect(),
            total,
            page,
        ))
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Article>, RepoError> {
        let result = ArticleEntity::find()
            .filter(article::Column::AuthorId.eq(author_id))
            .order_by_desc(article::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_by_article(&self, article_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::ArticleId.eq(article_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn count_by_article(&self, article_id: Uuid) -> Result<u64, RepoError> {
        CommentEntity::find()
            .filter(comment::Column::ArticleId.eq(article_id))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn count_by_articles(&self, article_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError> {
        grouped_counts(&self.db, "comments", "article_id", article_ids).await
    }
}

/// How many times a toggle retries after losing a race on the same edge.
const TOGGLE_ATTEMPTS: usize = 3;

/// Join table backing one relation kind.
struct EdgeTable {
    table: &'static str,
    actor: &'static str,
    target: &'static str,
}

impl EdgeTable {
    fn of(kind: RelationKind) -> Self {
        match kind {
            RelationKind::Like => Self {
                table: "article_likes",
                actor: "user_id",
                target: "article_id",
            },
            RelationKind::Bookmark => Self {
                table: "article_bookmarks",
                actor: "user_id",
                target: "article_id",
            },
            RelationKind::Follow => Self {
                table: "follows",
                actor: "follower_id",
                target: "followee_id",
            },
        }
    }

    fn statement(sql: String, values: Vec<sea_orm::Value>) -> Statement {
        Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
    }
}

/// PostgreSQL relation repository over the three join tables.
///
/// Each table's primary key is (actor, target), which makes the edge a set
/// member and lets the toggle lean on the database for atomicity.
pub struct PostgresRelationRepository {
    db: DbConn,
}

impl PostgresRelationRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn ids(&self, stmt: Statement) -> Result<Vec<Uuid>, RepoError> {
        let rows = self.db.query_all(stmt).await.map_err(map_db_err)?;
        rows.iter()
            .map(|row| row.try_get::<Uuid>("", "id").map_err(map_db_err))
            .collect()
    }
}

#[async_trait]
impl RelationRepository for PostgresRelationRepository {
    async fn toggle(
        &self,
        kind: RelationKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<ToggleState, RepoError> {
        let t = EdgeTable::of(kind);

        // Delete wins if the edge exists. Otherwise insert, and if a concurrent
        // toggle inserted first, go round again and remove theirs.
        for attempt in 1..=TOGGLE_ATTEMPTS {
            let deleted = self
                .db
                .execute(EdgeTable::statement(
                    format!(
                        "DELETE FROM {} WHERE {} = $1 AND {} = $2",
                        t.table, t.actor, t.target
                    ),
                    vec![actor_id.into(), target_id.into()],
                ))
                .await
                .map_err(map_db_err)?;
            if deleted.rows_affected() > 0 {
                return Ok(ToggleState::Removed);
            }

            let inserted = self
                .db
                .execute(EdgeTable::statement(
                    format!(
                        "INSERT INTO {} ({}, {}, created_at) VALUES ($1, $2, now()) ON CONFLICT DO NOTHING",
                        t.table, t.actor, t.target
                    ),
                    vec![actor_id.into(), target_id.into()],
                ))
                .await
                .map_err(map_db_err)?;
            if inserted.rows_affected() > 0 {
                return Ok(ToggleState::Added);
            }

            tracing::debug!(relation = kind.as_str(), attempt, "Toggle raced, retrying");
        }

        Err(RepoError::Query(format!(
            "{} toggle did not settle after {TOGGLE_ATTEMPTS} attempts",
            kind.as_str()
        )))
    }

    async fn contains(
        &self,
        kind: RelationKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, RepoError> {
        let t = EdgeTable::of(kind);
        let row = self
            .db
            .query_one(EdgeTable::statement(
                format!(
                    "SELECT 1 AS present FROM {} WHERE {} = $1 AND {} = $2",
                    t.table, t.actor, t.target
                ),
                vec![actor_id.into(), target_id.into()],
            ))
            .await
            .map_err(map_db_err)?;

        Ok(row.is_some())
    }

    async fn actors(&self, kind: RelationKind, target_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let t = EdgeTable::of(kind);
        self.ids(EdgeTable::statement(
            format!(
                "SELECT {} AS id FROM {} WHERE {} = $1 ORDER BY created_at, {}",
                t.actor, t.table, t.target, t.actor
            ),
            vec![target_id.into()],
        ))
        .await
    }

    async fn targets(&self, kind: RelationKind, actor_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let t = EdgeTable::of(kind);
        self.ids(EdgeTable::statement(
            format!(
                "SELECT {} AS id FROM {} WHERE {} = $1 ORDER BY created_at, {}",
                t.target, t.table, t.actor, t.target
            ),
            vec![actor_id.into()],
        ))
        .await
    }

    async fn count(&self, kind: RelationKind, target_id: Uuid) -> Result<u64, RepoError> {
        let t = EdgeTable::of(kind);
        let row = self
            .db
            .query_one(EdgeTable::statement(
                format!(
                    "SELECT COUNT(*) AS count FROM {} WHERE {} = $1",
                    t.table, t.target
                ),
                vec![target_id.into()],
            ))
            .await
            .map_err(map_db_err)?;

        match row {
            Some(row) => {
                let count: i64 = row.try_get("", "count").map_err(map_db_err)?;
                Ok(count.max(0) as u64)
            }
            None => Ok(0),
        }
    }

    async fn count_many(
        &self,
        kind: RelationKind,
        target_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, u64>, RepoError> {
        let t = EdgeTable::of(kind);
        grouped_counts(&self.db, t.table, t.target, target_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("abcd@naver.com"), "a***@naver.com");
        assert_eq!(mask_email("a@naver.com"), "***@naver.com");
        assert_eq!(mask_email("no-at-sign"), "***");
    }
}
