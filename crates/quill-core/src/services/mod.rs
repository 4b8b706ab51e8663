//! Application services - the operations the HTTP layer calls.
//!
//! Every service takes the requester as an explicit `Option<&Actor>` and runs
//! the authorization rules in [`crate::authz`] before touching state.

mod content;
mod feed;
mod identity;
mod relation;

use std::sync::Arc;

use crate::ports::{
    ArticleRepository, CommentRepository, ProfileRepository, RelationRepository, UserRepository,
};

pub use content::{ArticleChanges, CommentChanges, ContentService, NewArticle, NewComment};
pub use feed::{Feed, FeedService};
pub use identity::{CredentialChanges, IdentityService, ProfileChanges, SignUp};
pub use relation::RelationService;

/// The full set of repositories a deployment provides.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub relations: Arc<dyn RelationRepository>,
}
