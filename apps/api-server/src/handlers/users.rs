//! Account, token and profile handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::DomainError;
use quill_core::ports::{AuthError, TokenKind};
use quill_core::services::{CredentialChanges, ProfileChanges, SignUp};
use quill_shared::MessageResponse;
use quill_shared::dto::{
    AccessResponse, AccountResponse, AuthoredArticleResponse, EditAccountRequest,
    ProfileEditRequest, ProfileResponse, RefreshRequest, SignOutRequest, SignUpRequest,
    TokenPairResponse, TokenRequest, UserResponse, VerifyRequest,
};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /users/sign/
pub async fn sign_up(
    state: web::Data<AppState>,
    body: web::Json<SignUpRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .identity
        .create_identity(SignUp {
            username: req.username,
            email: req.email,
            password: req.password,
            password_confirmation: req.password2,
        })
        .await?;

    Ok(HttpResponse::Created().json(UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
    }))
}

/// GET /users/sign/
pub async fn account(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.identity.account(Some(identity.actor())).await?;

    Ok(HttpResponse::Ok().json(AccountResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        is_active: user.is_active,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }))
}

/// PUT /users/sign/ - deactivate the caller's account.
pub async fn sign_out(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<SignOutRequest>,
) -> AppResult<HttpResponse> {
    state
        .identity
        .deactivate(Some(identity.actor()), &body.password)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("signout_success")))
}

/// PATCH /users/sign/
pub async fn edit_account(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<EditAccountRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    state
        .identity
        .update_credentials(
            Some(identity.actor()),
            CredentialChanges {
                current_password: req.password,
                new_password: req.new_password,
                new_password_confirmation: req.new_password2,
                username: req.username,
                email: req.email,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("변경성공")))
}

/// POST /users/token/
pub async fn token(
    state: web::Data<AppState>,
    body: web::Json<TokenRequest>,
) -> AppResult<HttpResponse> {
    let user = state
        .identity
        .authenticate(&body.username, &body.password)
        .await?;
    let pair = state.tokens.issue_pair(&user)?;

    tracing::info!(user_id = %user.id, "Token pair issued");
    Ok(HttpResponse::Ok().json(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
    }))
}

/// POST /users/refresh/
pub async fn refresh(
    state: web::Data<AppState>,
    body: web::Json<RefreshRequest>,
) -> AppResult<HttpResponse> {
    let claims = state.tokens.validate(&body.refresh, TokenKind::Refresh)?;

    let user = state
        .identity
        .find_active(claims.user_id)
        .await
        .map_err(|e| -> AppError {
            match e {
                DomainError::NotFound { .. } | DomainError::Deactivated { .. } => {
                    AuthError::InvalidToken("User is inactive".to_string()).into()
                }
                other => other.into(),
            }
        })?;

    Ok(HttpResponse::Ok().json(AccessResponse {
        access: state.tokens.issue_access(&user)?,
    }))
}

/// POST /users/verify/
pub async fn verify(
    state: web::Data<AppState>,
    body: web::Json<VerifyRequest>,
) -> AppResult<HttpResponse> {
    state.tokens.verify(&body.token)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}

/// GET /users/{id}/
pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    tracing::debug!(viewer = ?viewer.actor().map(|a| a.user_id), %user_id, "Profile view");

    let view = state.identity.get_profile(user_id).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user_id: view.user_id,
        username: view.username,
        email: view.email,
        bio: view.bio,
        image: view.image,
        created_at: view.created_at,
        updated_at: view.updated_at,
        articles: view
            .articles
            .into_iter()
            .map(|a| AuthoredArticleResponse {
                id: a.id,
                title: a.title,
            })
            .collect(),
    }))
}

/// PUT /users/{id}/
pub async fn edit_profile(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<ProfileEditRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    state
        .identity
        .update_profile(
            Some(identity.actor()),
            path.into_inner(),
            ProfileChanges {
                bio: req.bio,
                image: req.image,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("edit success")))
}
