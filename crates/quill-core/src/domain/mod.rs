//! Domain entities - the core business objects.

mod actor;
mod article;
mod comment;
mod page;
mod profile;
mod relation;
mod user;

pub mod validation;

pub use actor::Actor;
pub use article::{Article, ArticleDetail, ArticleSummary};
pub use comment::Comment;
pub use page::{Page, PageRequest};
pub use profile::{AuthoredArticle, Profile, ProfileView};
pub use relation::{RelationKind, ToggleState};
pub use user::User;
