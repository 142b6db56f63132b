//! # Ports
//!
//! Contracts the core consumes. Storage and identity plugins implement these;
//! services only ever see the traits.
//!
//! Absence is a value (`Option`/`bool`), not an error. Any `Err` returned
//! here is treated by the services as the store being unavailable.

use async_trait::async_trait;

use crate::models::{
    DocId, Identity, Page, PageRequest, Post, PostId, SearchDocument, SearchFilter, SearchOrder,
    TermCount, TermField, Username,
};

/// Authoritative persistence for post aggregates, comments and votes included.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Inserts a new post (no id) or overwrites the post with its id.
    /// Idempotent by id. Returns the confirmed id.
    async fn insert_or_update(&self, post: &Post) -> anyhow::Result<PostId>;

    async fn find_by_id(&self, id: PostId) -> anyhow::Result<Option<Post>>;

    /// Returns `false` when no post had this id.
    async fn delete_by_id(&self, id: PostId) -> anyhow::Result<bool>;

    /// Post ids in ascending order, for reconciliation sweeps.
    async fn list_ids(&self, limit: usize, offset: usize) -> anyhow::Result<Vec<PostId>>;
}

/// Secondary full-text index holding one derived document per post.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn find_by_post_id(&self, post_id: PostId) -> anyhow::Result<Option<SearchDocument>>;

    /// Stores `doc`, assigning a document id when it has none.
    /// Idempotent by back-reference.
    async fn upsert(&self, doc: SearchDocument) -> anyhow::Result<SearchDocument>;

    /// Returns `false` when no document had this id.
    async fn delete_by_id(&self, id: &DocId) -> anyhow::Result<bool>;

    /// Documents matching `filter`, ranked by `order`, sliced to `page`.
    async fn query(
        &self,
        filter: &SearchFilter,
        order: SearchOrder,
        page: PageRequest,
    ) -> anyhow::Result<Page<SearchDocument>>;

    /// Top `top_n` terms of `field` by number of documents containing them.
    async fn term_frequency(&self, field: TermField, top_n: usize) -> anyhow::Result<Vec<TermCount>>;

    /// Back-references of every indexed document.
    async fn list_post_ids(&self) -> anyhow::Result<Vec<PostId>>;
}

/// User directory owned outside this core.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Unknown usernames are omitted; result order is unspecified.
    async fn resolve_by_usernames(&self, usernames: &[Username]) -> anyhow::Result<Vec<Identity>>;
}
