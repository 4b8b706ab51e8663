//! Feed aggregation over follow and bookmark edges.

use std::sync::Arc;

use crate::authz;
use crate::domain::{Actor, ArticleSummary, Page, PageRequest, RelationKind};
use crate::error::DomainError;
use crate::ports::{ArticleFilter, RelationRepository};

use super::{ContentService, Repositories};

/// Result of a feed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    /// The requester follows nobody yet.
    Empty,
    Articles(Page<ArticleSummary>),
}

pub struct FeedService {
    relations: Arc<dyn RelationRepository>,
    content: Arc<ContentService>,
}

impl FeedService {
    pub fn new(repos: &Repositories, content: Arc<ContentService>) -> Self {
        Self {
            relations: repos.relations.clone(),
            content,
        }
    }

    /// Articles by anyone the requester follows, newest first.
    pub async fn get_feed(
        &self,
        actor: Option<&Actor>,
        page: PageRequest,
    ) -> Result<Feed, DomainError> {
        let actor = authz::require_actor(actor)?;

        let followed = self
            .relations
            .targets(RelationKind::Follow, actor.user_id)
            .await?;
        if followed.is_empty() {
            return Ok(Feed::Empty);
        }

        tracing::debug!(actor = %actor.user_id, authors = followed.len(), "Building feed");
        let articles = self
            .content
            .list_articles(&ArticleFilter::Authors(followed), page)
            .await?;
        Ok(Feed::Articles(articles))
    }

    /// The requester's bookmarked articles, newest first.
    pub async fn bookmarks(
        &self,
        actor: Option<&Actor>,
        page: PageRequest,
    ) -> Result<Page<ArticleSummary>, DomainError> {
        let actor = authz::require_actor(actor)?;

        let ids = self
            .relations
            .targets(RelationKind::Bookmark, actor.user_id)
            .await?;
        if ids.is_empty() {
            return Ok(Page::new(Vec::new(), 0, page));
        }

        self.content
            .list_articles(&ArticleFilter::Ids(ids), page)
            .await
    }
}
