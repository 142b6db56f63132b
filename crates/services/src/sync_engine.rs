//! # Sync Engine
//!
//! Writes a post to the primary store and projects it into the search index.
//!
//! The two writes are not atomic. The primary store always goes first because
//! it is authoritative; if the index write fails afterwards the call still
//! succeeds, carrying [`IndexSync::Stale`] so the caller sees the degradation.
//! A stale index is repaired by re-deriving from primary (`resync`,
//! `reconcile`). Nothing is rolled back.
//!
//! The engine also owns the per-post locks. Every load → save sequence on
//! an existing post, including the re-derivations here, runs under the
//! post's lock so an older read can never overwrite a newer document.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use domains::{AppError, Post, PostId, PostRepository, Result, SearchDocument, SearchIndex};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::locks::{PostGuard, PostLocks};

/// State of the search index after a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IndexSync {
    /// The index reflects the primary write.
    Current,
    /// Primary committed but the index write failed; holds the reason.
    Stale(String),
}

impl IndexSync {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }
}

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// The post as persisted, id assigned.
    pub post: Post,
    /// The document written to the index, when that write succeeded.
    pub document: Option<SearchDocument>,
    pub index: IndexSync,
}

impl SaveOutcome {
    /// Primary committed, index stale.
    pub fn is_degraded(&self) -> bool {
        self.index.is_stale()
    }

    pub fn post_id(&self) -> Option<PostId> {
        self.post.id()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub post_id: PostId,
    pub index: IndexSync,
}

impl DeleteOutcome {
    pub fn is_degraded(&self) -> bool {
        self.index.is_stale()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub batches: usize,
    pub posts_scanned: usize,
    pub documents_written: usize,
    pub documents_unchanged: usize,
    pub orphans_removed: usize,
    /// Posts whose document could not be written, with the reason.
    pub failures: Vec<(PostId, String)>,
}

pub struct SyncEngine {
    posts: Arc<dyn PostRepository>,
    index: Arc<dyn SearchIndex>,
    locks: PostLocks,
}

impl SyncEngine {
    pub fn new(posts: Arc<dyn PostRepository>, index: Arc<dyn SearchIndex>) -> Self {
        Self { posts, index, locks: PostLocks::default() }
    }

    /// Serializes work on one post. Hold the guard across load → mutate →
    /// `save`/`delete`; those two do not lock on their own.
    pub async fn lock(&self, id: PostId) -> PostGuard<'_> {
        self.locks.acquire(id).await
    }

    #[cfg(test)]
    pub(crate) fn tracked_locks(&self) -> usize {
        self.locks.len()
    }

    /// Persists `post`, then upserts its search document.
    ///
    /// A primary failure is fatal. An index failure yields a degraded
    /// success.
    pub async fn save(&self, mut post: Post) -> Result<SaveOutcome> {
        let id = self.posts.insert_or_update(&post).await.map_err(AppError::store)?;
        post.mark_persisted(id);
        debug!(post_id = %id, "post written to primary store");

        let (document, index) = match self.project(&post).await {
            Ok(doc) => (Some(doc), IndexSync::Current),
            Err(e) => {
                warn!(post_id = %id, error = %format!("{e:#}"), "primary committed, search index stale");
                (None, IndexSync::Stale(format!("{e:#}")))
            }
        };
        Ok(SaveOutcome { post, document, index })
    }

    /// Deletes the post, then its search document if one exists.
    ///
    /// A missing post is `NotFound`; a missing document is not an error.
    pub async fn delete(&self, id: PostId) -> Result<DeleteOutcome> {
        let existed = self.posts.delete_by_id(id).await.map_err(AppError::store)?;
        if !existed {
            return Err(AppError::not_found("Post", id));
        }
        debug!(post_id = %id, "post deleted from primary store");

        let index = match self.unproject(id).await {
            Ok(true) => IndexSync::Current,
            Ok(false) => {
                debug!(post_id = %id, "no search document to remove");
                IndexSync::Current
            }
            Err(e) => {
                warn!(post_id = %id, error = %format!("{e:#}"), "primary delete committed, search document left behind");
                IndexSync::Stale(format!("{e:#}"))
            }
        };
        Ok(DeleteOutcome { post_id: id, index })
    }

    /// Re-derives the document of one post from the primary store.
    pub async fn resync(&self, id: PostId) -> Result<SaveOutcome> {
        let _guard = self.lock(id).await;
        let post = self
            .posts
            .find_by_id(id)
            .await
            .map_err(AppError::store)?
            .ok_or_else(|| AppError::not_found("Post", id))?;
        match self.project(&post).await {
            Ok(doc) => Ok(SaveOutcome { post, document: Some(doc), index: IndexSync::Current }),
            Err(e) => Err(AppError::store(e)),
        }
    }

    /// Sweeps every post in batches, rewriting documents that drifted, then
    /// removes documents whose post no longer exists.
    ///
    /// Failures on individual documents are collected in the report; only a
    /// failure to list or read the primary store aborts the sweep.
    pub async fn reconcile(&self, batch_size: usize) -> Result<ReconcileReport> {
        let batch = batch_size.max(1);
        let mut report = ReconcileReport::default();
        let mut seen: HashSet<PostId> = HashSet::new();
        let mut offset = 0;

        loop {
            let ids = self.posts.list_ids(batch, offset).await.map_err(AppError::store)?;
            if ids.is_empty() {
                break;
            }
            report.batches += 1;
            offset += ids.len();

            for id in ids {
                seen.insert(id);
                let _guard = self.lock(id).await;
                let Some(post) = self.posts.find_by_id(id).await.map_err(AppError::store)? else {
                    continue;
                };
                report.posts_scanned += 1;
                match self.refresh(&post).await {
                    Ok(true) => report.documents_written += 1,
                    Ok(false) => report.documents_unchanged += 1,
                    Err(e) => report.failures.push((id, format!("{e:#}"))),
                }
            }
        }

        let indexed = self.index.list_post_ids().await.map_err(AppError::store)?;
        for post_id in indexed.into_iter().filter(|id| !seen.contains(id)) {
            let _guard = self.lock(post_id).await;
            // the post may have been created after its batch was listed
            if self.posts.find_by_id(post_id).await.map_err(AppError::store)?.is_some() {
                continue;
            }
            match self.unproject(post_id).await {
                Ok(true) => report.orphans_removed += 1,
                Ok(false) => {}
                Err(e) => report.failures.push((post_id, format!("{e:#}"))),
            }
        }

        info!(
            scanned = report.posts_scanned,
            written = report.documents_written,
            orphans = report.orphans_removed,
            failures = report.failures.len(),
            "reconciliation finished"
        );
        Ok(report)
    }

    /// Derives the document for a persisted post and upserts it. An existing
    /// document is fully overwritten, never patched.
    async fn project(&self, post: &Post) -> anyhow::Result<SearchDocument> {
        let id = post.id().context("post has no primary id")?;
        let doc = match self.index.find_by_post_id(id).await? {
            Some(mut existing) => {
                existing.overwrite_from(post);
                existing
            }
            None => SearchDocument::derive(post).context("post has no primary id")?,
        };
        self.index.upsert(doc).await
    }

    /// Like `project`, but skips the write when the document already matches.
    async fn refresh(&self, post: &Post) -> anyhow::Result<bool> {
        let id = post.id().context("post has no primary id")?;
        if let Some(existing) = self.index.find_by_post_id(id).await? {
            if existing.reflects(post) {
                return Ok(false);
            }
        }
        self.project(post).await?;
        Ok(true)
    }

    /// Removes the document back-referencing `post_id`, if any.
    async fn unproject(&self, post_id: PostId) -> anyhow::Result<bool> {
        let Some(doc) = self.index.find_by_post_id(post_id).await? else {
            return Ok(false);
        };
        let doc_id = doc
            .id
            .with_context(|| format!("document for post {post_id} has no id, cannot delete it"))?;
        self.index.delete_by_id(&doc_id).await
    }
}
