//! # Domain Models
//!
//! The post aggregate and its embedded comment collection and vote ledger,
//! plus the derived search document the discovery side reads.

mod comment;
mod identity;
mod ids;
mod post;
mod search;
mod vote;

pub use comment::{Comment, CommentCollection};
pub use identity::{Identity, Username};
pub use ids::{CategoryId, CommentId, DocId, PostId, VoteId};
pub use post::{NewPost, PersistedPost, Post, PostEdit, Tags};
pub use search::{
    DiscoveryLimits, Page, PageRequest, SearchDocument, SearchFilter, SearchOrder, TermCount,
    TermField,
};
pub use vote::{Vote, VoteLedger};
