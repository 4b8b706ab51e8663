//! Content store: articles and comments.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::authz::{self, Action, Resource};
use crate::domain::validation;
use crate::domain::{
    Actor, Article, ArticleDetail, ArticleSummary, Comment, Page, PageRequest, RelationKind,
};
use crate::error::{DomainError, ValidationErrors};
use crate::ports::{
    ArticleFilter, ArticleRepository, CommentRepository, RelationRepository, UserRepository,
};

use super::Repositories;

#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentChanges {
    pub content: String,
}

pub struct ContentService {
    articles: Arc<dyn ArticleRepository>,
    comments: Arc<dyn CommentRepository>,
    users: Arc<dyn UserRepository>,
    relations: Arc<dyn RelationRepository>,
}

impl ContentService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            articles: repos.articles.clone(),
            comments: repos.comments.clone(),
            users: repos.users.clone(),
            relations: repos.relations.clone(),
        }
    }

    pub async fn create_article(
        &self,
        actor: Option<&Actor>,
        input: NewArticle,
    ) -> Result<Article, DomainError> {
        authz::authorize(Action::Create, actor, &Resource::Collection)?;
        let actor = authz::require_actor(actor)?;

        let mut errors = ValidationErrors::new();
        validation::check_bounded_text(&mut errors, "title", &input.title, Article::TITLE_MAX_CHARS);
        validation::check_required_text(&mut errors, "content", &input.content);
        errors.into_result()?;

        let article = self
            .articles
            .insert(Article::new(actor.user_id, input.title, input.content))
            .await?;

        tracing::info!(article_id = %article.id, author = %actor.user_id, "Article created");
        Ok(article)
    }

    pub async fn get_article(&self, article_id: Uuid) -> Result<ArticleDetail, DomainError> {
        let article = self.load_article(article_id).await?;
        let author = self
            .users
            .find_by_id(article.author_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();
        let likes_count = self.relations.count(RelationKind::Like, article.id).await?;
        let comment_count = self.comments.count_by_article(article.id).await?;

        Ok(ArticleDetail {
            article,
            author,
            likes_count,
            comment_count,
        })
    }

    /// Author-only edit. Fields left `None` keep their value.
    pub async fn update_article(
        &self,
        actor: Option<&Actor>,
        article_id: Uuid,
        changes: ArticleChanges,
    ) -> Result<Article, DomainError> {
        let actor = authz::require_actor(actor)?;
        let mut article = self.load_article(article_id).await?;
        authz::authorize(Action::Update, Some(actor), &Resource::Article(&article))?;

        let mut errors = ValidationErrors::new();
        if let Some(title) = &changes.title {
            validation::check_bounded_text(&mut errors, "title", title, Article::TITLE_MAX_CHARS);
        }
        if let Some(content) = &changes.content {
            validation::check_required_text(&mut errors, "content", content);
        }
        errors.into_result()?;

        if let Some(title) = changes.title {
            article.title = title;
        }
        if let Some(content) = changes.content {
            article.content = content;
        }
        article.touch();

        Ok(self.articles.update(article).await?)
    }

    /// Author-only delete. Comments, likes and bookmarks go with it.
    pub async fn delete_article(
        &self,
        actor: Option<&Actor>,
        article_id: Uuid,
    ) -> Result<(), DomainError> {
        let actor = authz::require_actor(actor)?;
        let article = self.load_article(article_id).await?;
        authz::authorize(Action::Delete, Some(actor), &Resource::Article(&article))?;

        self.articles.delete(article_id).await?;
        tracing::info!(article_id = %article_id, "Article deleted");
        Ok(())
    }

    /// Newest-first listing with author handles and counters.
    pub async fn list_articles(
        &self,
        filter: &ArticleFilter,
        page: PageRequest,
    ) -> Result<Page<ArticleSummary>, DomainError> {
        let Page {
            items,
            total,
            page,
            per_page,
        } = self.articles.list(filter, page).await?;

        Ok(Page {
            items: self.summarize(items).await?,
            total,
            page,
            per_page,
        })
    }

    pub async fn create_comment(
        &self,
        actor: Option<&Actor>,
        article_id: Uuid,
        input: NewComment,
    ) -> Result<Comment, DomainError> {
        authz::authorize(Action::Create, actor, &Resource::Collection)?;
        let actor = authz::require_actor(actor)?;
        self.load_article(article_id).await?;

        let mut errors = ValidationErrors::new();
        validation::check_bounded_text(
            &mut errors,
            "content",
            &input.content,
            Comment::CONTENT_MAX_CHARS,
        );
        errors.into_result()?;

        let comment = self
            .comments
            .insert(Comment::new(actor.user_id, article_id, input.content))
            .await?;

        tracing::info!(comment_id = %comment.id, article_id = %article_id, "Comment created");
        Ok(comment)
    }

    /// Comments on an article, oldest first.
    pub async fn list_comments(&self, article_id: Uuid) -> Result<Vec<Comment>, DomainError> {
        self.load_article(article_id).await?;
        Ok(self.comments.find_by_article(article_id).await?)
    }

    pub async fn update_comment(
        &self,
        actor: Option<&Actor>,
        article_id: Uuid,
        comment_id: Uuid,
        changes: CommentChanges,
    ) -> Result<Comment, DomainError> {
        let actor = authz::require_actor(actor)?;
        let mut comment = self.load_comment(article_id, comment_id).await?;
        authz::authorize(Action::Update, Some(actor), &Resource::Comment(&comment))?;

        let mut errors = ValidationErrors::new();
        validation::check_bounded_text(
            &mut errors,
            "content",
            &changes.content,
            Comment::CONTENT_MAX_CHARS,
        );
        errors.into_result()?;

        comment.content = changes.content;
        comment.touch();
        Ok(self.comments.update(comment).await?)
    }

    pub async fn delete_comment(
        &self,
        actor: Option<&Actor>,
        article_id: Uuid,
        comment_id: Uuid,
    ) -> Result<(), DomainError> {
        let actor = authz::require_actor(actor)?;
        let comment = self.load_comment(article_id, comment_id).await?;
        authz::authorize(Action::Delete, Some(actor), &Resource::Comment(&comment))?;

        self.comments.delete(comment_id).await?;
        tracing::info!(comment_id = %comment_id, "Comment deleted");
        Ok(())
    }

    async fn load_article(&self, article_id: Uuid) -> Result<Article, DomainError> {
        self.articles
            .find_by_id(article_id)
            .await?
            .ok_or_else(|| DomainError::not_found("article", article_id))
    }

    /// A comment addressed through the wrong article is treated as missing.
    async fn load_comment(&self, article_id: Uuid, comment_id: Uuid) -> Result<Comment, DomainError> {
        self.comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.article_id == article_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))
    }

    async fn summarize(&self, articles: Vec<Article>) -> Result<Vec<ArticleSummary>, DomainError> {
        let mut author_ids: Vec<Uuid> = articles.iter().map(|a| a.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<Uuid, String> = self
            .users
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let article_ids: Vec<Uuid> = articles.iter().map(|a| a.id).collect();
        let likes = self
            .relations
            .count_many(RelationKind::Like, &article_ids)
            .await?;
        let comments = self.comments.count_by_articles(&article_ids).await?;

        let summaries = articles
            .into_iter()
            .map(|article| ArticleSummary {
                id: article.id,
                title: article.title,
                author: authors.get(&article.author_id).cloned().unwrap_or_default(),
                likes_count: likes.get(&article.id).copied().unwrap_or(0),
                comment_count: comments.get(&article.id).copied().unwrap_or(0),
                created_at: article.created_at,
            })
            .collect();
        Ok(summaries)
    }
}
