//! Typed identifiers.
//!
//! Post ids are assigned by the primary store; comment and vote ids are only
//! unique inside their owning post.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Primary-store identity of a post.
    PostId
);
numeric_id!(
    /// Category a post is filed under. Categories themselves live outside
    /// this core; posts only carry the reference.
    CategoryId
);
numeric_id!(
    /// Scoped to the owning post's comment collection.
    CommentId
);
numeric_id!(
    /// Scoped to the owning post's vote ledger.
    VoteId
);

/// Storage-assigned id of a search document. Never used as a join key from
/// the post side; lookups go through the document's `post_id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(pub String);

impl DocId {
    /// Time-ordered id for freshly indexed documents.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
