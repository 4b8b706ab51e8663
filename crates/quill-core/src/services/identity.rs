//! Identity store: signup, credentials, deactivation and profiles.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::authz::{self, Action, Resource};
use crate::domain::validation;
use crate::domain::{Actor, AuthoredArticle, Profile, ProfileView, User};
use crate::error::{DomainError, RepoError, ValidationErrors};
use crate::ports::{ArticleRepository, PasswordService, ProfileRepository, UserRepository};

use super::Repositories;

const USERNAME_TAKEN: &str = "이미 사용 중인 아이디입니다.";
const EMAIL_TAKEN: &str = "이미 사용 중인 이메일입니다.";
const WRONG_PASSWORD: &str = "비밀번호가 일치하지 않습니다.";

/// Signup input.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Account edit input. `current_password` gates every change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialChanges {
    pub current_password: String,
    pub new_password: Option<String>,
    pub new_password_confirmation: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Profile edit input. Only bio and image are editable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChanges {
    pub bio: Option<String>,
    pub image: Option<String>,
}

pub struct IdentityService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    articles: Arc<dyn ArticleRepository>,
    passwords: Arc<dyn PasswordService>,
}

impl IdentityService {
    pub fn new(repos: &Repositories, passwords: Arc<dyn PasswordService>) -> Self {
        Self {
            users: repos.users.clone(),
            profiles: repos.profiles.clone(),
            articles: repos.articles.clone(),
            passwords,
        }
    }

    /// Register a new identity with an empty profile.
    pub async fn create_identity(&self, input: SignUp) -> Result<User, DomainError> {
        let email = normalize_email(&input.email);

        let mut errors = ValidationErrors::new();
        validation::check_username(&mut errors, &input.username);
        validation::check_email(&mut errors, &email);
        validation::check_new_password(
            &mut errors,
            "password",
            &input.password,
            &input.password_confirmation,
        );
        self.check_unique(&mut errors, Some(&input.username), Some(&email))
            .await?;
        errors.into_result()?;

        let password_hash = self.passwords.hash(&input.password)?;
        let user = User::new(input.username, email, password_hash);
        let profile = Profile::empty(user.id);

        let user = self
            .users
            .insert_with_profile(user, profile)
            .await
            .map_err(uniqueness_race)?;

        tracing::info!(user_id = %user.id, username = %user.username, "Identity created");
        Ok(user)
    }

    /// Compare a raw password against the stored hash.
    pub fn verify_credential(&self, user: &User, raw_password: &str) -> Result<bool, DomainError> {
        Ok(self.passwords.verify(raw_password, &user.password_hash)?)
    }

    /// Resolve a login. Unknown handles, wrong passwords and deactivated
    /// identities are indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        if !self.verify_credential(&user, password)? || !user.is_active {
            tracing::debug!(user_id = %user.id, "Login rejected");
            return Err(DomainError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Load an identity that may still act (used when refreshing tokens).
    pub async fn find_active(&self, id: Uuid) -> Result<User, DomainError> {
        let user = self.load_user(id).await?;
        if !user.is_active {
            return Err(DomainError::Deactivated { id });
        }
        Ok(user)
    }

    /// The caller's own account.
    pub async fn account(&self, actor: Option<&Actor>) -> Result<User, DomainError> {
        let actor = authz::require_actor(actor)?;
        self.load_user(actor.user_id).await
    }

    /// Soft-delete the caller after re-checking their password.
    pub async fn deactivate(
        &self,
        actor: Option<&Actor>,
        password: &str,
    ) -> Result<User, DomainError> {
        let actor = authz::require_actor(actor)?;
        let mut user = self.load_user(actor.user_id).await?;

        if !self.verify_credential(&user, password)? {
            return Err(DomainError::Validation(ValidationErrors::field(
                "password",
                WRONG_PASSWORD,
            )));
        }

        user.deactivate();
        let user = self.users.update(user).await?;

        tracing::info!(user_id = %user.id, "Identity deactivated");
        Ok(user)
    }

    /// Change password and/or account fields once `current_password` verifies.
    pub async fn update_credentials(
        &self,
        actor: Option<&Actor>,
        changes: CredentialChanges,
    ) -> Result<User, DomainError> {
        let actor = authz::require_actor(actor)?;
        let mut user = self.load_user(actor.user_id).await?;

        if !self.verify_credential(&user, &changes.current_password)? {
            return Err(DomainError::Validation(ValidationErrors::field(
                "current_password",
                WRONG_PASSWORD,
            )));
        }

        let username = changes.username.filter(|u| *u != user.username);
        let email = changes
            .email
            .map(|e| normalize_email(&e))
            .filter(|e| *e != user.email);

        let mut errors = ValidationErrors::new();
        if let Some(username) = &username {
            validation::check_username(&mut errors, username);
        }
        if let Some(email) = &email {
            validation::check_email(&mut errors, email);
        }
        let new_password = match (changes.new_password, changes.new_password_confirmation) {
            (None, None) => None,
            (password, confirmation) => {
                let password = password.unwrap_or_default();
                validation::check_new_password(
                    &mut errors,
                    "new_password",
                    &password,
                    &confirmation.unwrap_or_default(),
                );
                Some(password)
            }
        };
        self.check_unique(&mut errors, username.as_deref(), email.as_deref())
            .await?;
        errors.into_result()?;

        if let Some(password) = new_password {
            user.password_hash = self.passwords.hash(&password)?;
        }
        if let Some(username) = username {
            user.username = username;
        }
        if let Some(email) = email {
            user.email = email;
        }
        user.touch();

        let user = self.users.update(user).await.map_err(uniqueness_race)?;
        tracing::info!(user_id = %user.id, "Credentials updated");
        Ok(user)
    }

    /// Public profile page. Deactivated identities report `Deactivated`.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<ProfileView, DomainError> {
        let user = self.load_user(user_id).await?;
        authz::authorize(Action::Read, None, &Resource::Profile(&user))?;

        let profile = self
            .profiles
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("profile", user_id))?;
        let articles = self
            .articles
            .find_by_author(user_id)
            .await?
            .into_iter()
            .map(|a| AuthoredArticle {
                id: a.id,
                title: a.title,
            })
            .collect();

        Ok(ProfileView {
            user_id,
            username: user.username,
            email: user.email,
            bio: profile.bio,
            image: profile.image,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            articles,
        })
    }

    /// Edit bio/image. Only the profile's own identity may do this.
    pub async fn update_profile(
        &self,
        actor: Option<&Actor>,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Profile, DomainError> {
        let actor = authz::require_actor(actor)?;
        let user = self.load_user(user_id).await?;
        authz::authorize(Action::Update, Some(actor), &Resource::Profile(&user))?;

        let mut profile = self
            .profiles
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("profile", user_id))?;

        if let Some(bio) = changes.bio {
            profile.bio = Some(bio).filter(|b| !b.is_empty());
        }
        if let Some(image) = changes.image {
            profile.image = Some(image).filter(|i| !i.is_empty());
        }
        profile.touch();

        Ok(self.profiles.update(profile).await?)
    }

    async fn load_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", id))
    }

    /// Record taken handles/emails. Fields that already failed their policy are
    /// not looked up.
    async fn check_unique(
        &self,
        errors: &mut ValidationErrors,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), RepoError> {
        if let Some(username) = username.filter(|_| !errors.contains("username")) {
            if self.users.find_by_username(username).await?.is_some() {
                errors.add("username", USERNAME_TAKEN);
            }
        }
        if let Some(email) = email.filter(|_| !errors.contains("email")) {
            if self.users.find_by_email(email).await?.is_some() {
                errors.add("email", EMAIL_TAKEN);
            }
        }
        Ok(())
    }
}

/// Lowercase the domain part, keep the local part as typed.
fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// A unique index fired after the pre-check passed: a concurrent signup won.
fn uniqueness_race(err: RepoError) -> DomainError {
    match err {
        RepoError::Constraint(detail) => {
            tracing::debug!(%detail, "Unique constraint hit after pre-check");
            DomainError::Validation(ValidationErrors::field(
                "username",
                "이미 사용 중인 아이디 또는 이메일입니다.",
            ))
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        assert_eq!(normalize_email(" AbCd@Naver.COM "), "AbCd@naver.com");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }
}
