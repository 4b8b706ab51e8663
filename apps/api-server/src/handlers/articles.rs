//! Article handlers, including the feed and bookmark listings.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{Actor, ArticleDetail, RelationKind};
use quill_core::ports::ArticleFilter;
use quill_core::services::{ArticleChanges, Feed, NewArticle};
use quill_shared::MessageResponse;
use quill_shared::dto::{ArticleEditRequest, ArticleResponse, ArticleWriteRequest, PageQuery};

use super::{article_page, page_request};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

const EMPTY_FEED_MESSAGE: &str = "팔로우한 사용자가 없습니다";

/// The caller's like and bookmark state on one article.
#[derive(Debug, Default)]
struct ViewerFlags {
    liked: Option<bool>,
    bookmarked: Option<bool>,
}

async fn viewer_flags(
    state: &AppState,
    viewer: Option<&Actor>,
    article_id: Uuid,
) -> AppResult<ViewerFlags> {
    let Some(actor) = viewer else {
        return Ok(ViewerFlags::default());
    };

    let relations = &state.relations;
    Ok(ViewerFlags {
        liked: Some(
            relations
                .contains(RelationKind::Like, actor.user_id, article_id)
                .await?,
        ),
        bookmarked: Some(
            relations
                .contains(RelationKind::Bookmark, actor.user_id, article_id)
                .await?,
        ),
    })
}

fn article_response(detail: ArticleDetail, flags: ViewerFlags) -> ArticleResponse {
    ArticleResponse {
        id: detail.article.id,
        title: detail.article.title,
        content: detail.article.content,
        author: detail.author,
        likes_count: detail.likes_count,
        comment_count: detail.comment_count,
        created_at: detail.article.created_at,
        updated_at: detail.article.updated_at,
        liked: flags.liked,
        bookmarked: flags.bookmarked,
    }
}

/// GET /articles/?page=N&page_size=M
pub async fn list(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    tracing::debug!(viewer = ?viewer.actor().map(|a| a.user_id), "Listing articles");

    let page = state
        .content
        .list_articles(&ArticleFilter::All, page_request(&query))
        .await?;

    Ok(HttpResponse::Ok().json(article_page(page)))
}

/// POST /articles/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ArticleWriteRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    state
        .content
        .create_article(
            Some(identity.actor()),
            NewArticle {
                title: req.title,
                content: req.content,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(MessageResponse::new("작성완료")))
}

/// GET /articles/feed/
pub async fn feed(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    match state
        .feed
        .get_feed(Some(identity.actor()), page_request(&query))
        .await?
    {
        Feed::Empty => Ok(HttpResponse::Ok().json(MessageResponse::new(EMPTY_FEED_MESSAGE))),
        Feed::Articles(page) => Ok(HttpResponse::Ok().json(article_page(page))),
    }
}

/// GET /articles/bookmark_list/
pub async fn bookmark_list(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .feed
        .bookmarks(Some(identity.actor()), page_request(&query))
        .await?;

    Ok(HttpResponse::Ok().json(article_page(page)))
}

/// GET /articles/{id}/
pub async fn detail(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let article_id = path.into_inner();
    tracing::debug!(viewer = ?viewer.actor().map(|a| a.user_id), %article_id, "Article view");

    let detail = state.content.get_article(article_id).await?;
    let flags = viewer_flags(&state, viewer.actor(), article_id).await?;
    Ok(HttpResponse::Ok().json(article_response(detail, flags)))
}

/// PUT /articles/{id}/
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<ArticleEditRequest>,
) -> AppResult<HttpResponse> {
    let article_id = path.into_inner();
    let req = body.into_inner();

    state
        .content
        .update_article(
            Some(identity.actor()),
            article_id,
            ArticleChanges {
                title: req.title,
                content: req.content,
            },
        )
        .await?;

    let detail = state.content.get_article(article_id).await?;
    let flags = viewer_flags(&state, Some(identity.actor()), article_id).await?;
    Ok(HttpResponse::Ok().json(article_response(detail, flags)))
}

/// DELETE /articles/{id}/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .content
        .delete_article(Some(identity.actor()), path.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
