//! Like, bookmark and follow toggles, and the lists behind them.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{RelationKind, ToggleState};
use quill_shared::MessageResponse;

use super::user_summaries;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Acknowledgement for an article toggle, e.g. `like했습니다` / `unlike했습니다`.
fn toggle_message(kind: RelationKind, state: ToggleState) -> MessageResponse {
    match state {
        ToggleState::Added => MessageResponse::new(format!("{}했습니다", kind.as_str())),
        ToggleState::Removed => MessageResponse::new(format!("un{}했습니다", kind.as_str())),
    }
}

/// GET /articles/{id}/like/
pub async fn likers(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let users = state.relations.likers(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user_summaries(users)))
}

/// POST /articles/{id}/like/
pub async fn toggle_like(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let toggled = state
        .relations
        .toggle_like(Some(identity.actor()), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(toggle_message(RelationKind::Like, toggled)))
}

/// GET /articles/{id}/bookmark/
pub async fn bookmarkers(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let users = state.relations.bookmarkers(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user_summaries(users)))
}

/// POST /articles/{id}/bookmark/
pub async fn toggle_bookmark(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let toggled = state
        .relations
        .toggle_bookmark(Some(identity.actor()), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(toggle_message(RelationKind::Bookmark, toggled)))
}

/// GET /users/{id}/follow/
pub async fn followers(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let users = state.relations.followers(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user_summaries(users)))
}

/// POST /users/{id}/follow/ - replies with the bare string `"Follow"` or `"Unfollow"`.
pub async fn toggle_follow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let toggled = state
        .relations
        .toggle_follow(Some(identity.actor()), path.into_inner())
        .await?;

    let body = if toggled.is_added() { "Follow" } else { "Unfollow" };
    Ok(HttpResponse::Ok().json(body))
}
