//! Authentication ports: token issuance and password hashing.

use uuid::Uuid;

use crate::domain::User;

/// Which half of a token pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Claims carried by a validated token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub kind: TokenKind,
    pub exp: i64,
}

/// Access/refresh pair handed out at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Token service trait for JWT operations.
pub trait TokenService: Send + Sync {
    /// Issue an access/refresh pair for a user.
    fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError>;

    /// Issue a fresh access token for a user.
    fn issue_access(&self, user: &User) -> Result<String, AuthError>;

    /// Validate a token and require it to be of `kind`.
    fn validate(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError>;

    /// Validate signature, issuer and expiry of a token of either kind.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of access tokens, in seconds.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Hashing error: {0}")]
    HashingError(String),
}

impl From<AuthError> for crate::error::DomainError {
    fn from(err: AuthError) -> Self {
        use crate::error::DomainError;

        match err {
            AuthError::InvalidCredentials => DomainError::InvalidCredentials,
            AuthError::TokenExpired | AuthError::InvalidToken(_) | AuthError::MissingAuth => {
                DomainError::AuthenticationRequired
            }
            AuthError::HashingError(msg) => DomainError::Internal(msg),
        }
    }
}
