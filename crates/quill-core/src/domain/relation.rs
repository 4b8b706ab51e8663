use serde::{Deserialize, Serialize};

/// The three toggle relations. Like and bookmark target articles, follow
/// targets users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Like,
    Bookmark,
    Follow,
}

impl RelationKind {
    /// Whether the target side of the edge is an article (otherwise a user).
    pub fn targets_article(self) -> bool {
        matches!(self, Self::Like | Self::Bookmark)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Bookmark => "bookmark",
            Self::Follow => "follow",
        }
    }
}

/// Outcome of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Added,
    Removed,
}

impl ToggleState {
    pub fn is_added(self) -> bool {
        self == Self::Added
    }
}
