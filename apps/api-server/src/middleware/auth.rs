//! Authentication extractors.

use std::future::Future;
use std::pin::Pin;

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};

use quill_core::DomainError;
use quill_core::domain::Actor;
use quill_core::ports::{AuthError, TokenKind};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated caller extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.0.username)
/// }
/// ```
///
/// The access token must verify and name an identity that is still active.
#[derive(Debug, Clone)]
pub struct Identity(pub Actor);

impl Identity {
    pub fn actor(&self) -> &Actor {
        &self.0
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// `Ok(None)` when the header is absent, an error when it is present but unusable.
fn bearer_token(req: &HttpRequest) -> Result<Option<String>, AuthError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim().to_string()))
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

async fn resolve(state: web::Data<AppState>, token: String) -> Result<Identity, AppError> {
    let claims = state.tokens.validate(&token, TokenKind::Access)?;

    let user = state
        .identity
        .find_active(claims.user_id)
        .await
        .map_err(|e| match e {
            DomainError::NotFound { .. } | DomainError::Deactivated { .. } => {
                tracing::debug!(user_id = %claims.user_id, "Token names an inactive identity");
                AppError::from(AuthError::InvalidToken("User is inactive".to_string()))
            }
            other => other.into(),
        })?;

    Ok(Identity(Actor::from(&user)))
}

fn app_state(req: &HttpRequest) -> Result<web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>().cloned().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AppError::Internal("Server configuration error".to_string())
    })
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = app_state(req);

        Box::pin(async move {
            let state = state?;
            match token? {
                Some(token) => resolve(state, token).await,
                None => Err(AuthError::MissingAuth.into()),
            }
        })
    }
}

/// Optional identity extractor for routes anonymous callers may use.
///
/// A missing header yields `None`; a header that does not authenticate is
/// still rejected with 401.
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref().map(Identity::actor)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = app_state(req);

        Box::pin(async move {
            match token? {
                Some(token) => Ok(OptionalIdentity(Some(resolve(state?, token).await?))),
                None => Ok(OptionalIdentity(None)),
            }
        })
    }
}
