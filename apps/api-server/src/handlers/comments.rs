//! Comment handlers, nested under an article.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::Comment;
use quill_core::services::{CommentChanges, NewComment};
use quill_shared::dto::{CommentRequest, CommentResponse};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn comment_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        article_id: comment.article_id,
        author_id: comment.author_id,
        content: comment.content,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    }
}

/// GET /articles/{id}/comment/
pub async fn list(
    state: web::Data<AppState>,
    _viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comments = state.content.list_comments(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(
        comments
            .into_iter()
            .map(comment_response)
            .collect::<Vec<_>>(),
    ))
}

/// POST /articles/{id}/comment/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = state
        .content
        .create_comment(
            Some(identity.actor()),
            path.into_inner(),
            NewComment {
                content: body.into_inner().content,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(comment_response(comment)))
}

/// PUT /articles/{id}/comment/{cid}/
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let (article_id, comment_id) = path.into_inner();

    let comment = state
        .content
        .update_comment(
            Some(identity.actor()),
            article_id,
            comment_id,
            CommentChanges {
                content: body.into_inner().content,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(comment_response(comment)))
}

/// DELETE /articles/{id}/comment/{cid}/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (article_id, comment_id) = path.into_inner();

    state
        .content
        .delete_comment(Some(identity.actor()), article_id, comment_id)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
