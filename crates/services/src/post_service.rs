//! # Post Service
//!
//! Use cases over a single post: load the aggregate, apply one mutation,
//! save through the [`SyncEngine`]. Calls targeting the same post id are
//! serialized on the engine's post lock, so the duplicate-vote check and the
//! save see the same state.

use std::sync::Arc;

use domains::{
    AppError, Comment, CommentId, NewPost, Post, PostEdit, PostId, PostRepository, Result,
    Username, Vote, VoteId,
};
use tracing::{debug, info};

use crate::sync_engine::{DeleteOutcome, SaveOutcome, SyncEngine};

/// The value a mutation produced plus the result of persisting it.
#[derive(Debug, Clone)]
pub struct Applied<T> {
    pub value: T,
    pub outcome: SaveOutcome,
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    sync: Arc<SyncEngine>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, sync: Arc<SyncEngine>) -> Self {
        Self { posts, sync }
    }

    pub async fn create_post(&self, new: NewPost) -> Result<SaveOutcome> {
        let post = Post::create(new)?;
        let outcome = self.sync.save(post).await?;
        info!(post_id = ?outcome.post_id(), degraded = outcome.is_degraded(), "post created");
        Ok(outcome)
    }

    pub async fn get_post(&self, id: PostId) -> Result<Post> {
        self.load(id).await
    }

    pub async fn edit_post(&self, id: PostId, edit: PostEdit) -> Result<SaveOutcome> {
        self.mutate(id, move |post| post.revise(edit)).await.map(|a| a.outcome)
    }

    pub async fn remove_post(&self, id: PostId) -> Result<DeleteOutcome> {
        let _guard = self.sync.lock(id).await;
        let outcome = self.sync.delete(id).await?;
        info!(post_id = %id, degraded = outcome.is_degraded(), "post removed");
        Ok(outcome)
    }

    /// Counts one view. Repeated reads by the same reader all count.
    pub async fn increase_read_count(&self, id: PostId) -> Result<Applied<u64>> {
        self.mutate(id, |post| Ok(post.increase_read_count())).await
    }

    pub async fn create_comment(
        &self,
        id: PostId,
        author: Username,
        content: String,
    ) -> Result<Applied<CommentId>> {
        self.mutate(id, move |post| post.add_comment(author, content)).await
    }

    pub async fn remove_comment(&self, id: PostId, comment_id: CommentId) -> Result<Applied<Comment>> {
        self.mutate(id, |post| post.remove_comment(comment_id)).await
    }

    /// Fails with `DuplicateVote` if `voter` already voted; nothing is saved then.
    pub async fn create_vote(&self, id: PostId, voter: Username) -> Result<Applied<VoteId>> {
        self.mutate(id, move |post| post.add_vote(voter)).await
    }

    pub async fn remove_vote(&self, id: PostId, vote_id: VoteId) -> Result<Applied<Vote>> {
        self.mutate(id, |post| post.remove_vote(vote_id)).await
    }

    async fn load(&self, id: PostId) -> Result<Post> {
        self.posts
            .find_by_id(id)
            .await
            .map_err(AppError::store)?
            .ok_or_else(|| AppError::not_found("Post", id))
    }

    /// Load, mutate, save under the post's lock. A rejected mutation saves
    /// nothing.
    async fn mutate<T, F>(&self, id: PostId, apply: F) -> Result<Applied<T>>
    where
        F: FnOnce(&mut Post) -> Result<T> + Send,
        T: Send,
    {
        let _guard = self.sync.lock(id).await;
        let mut post = self.load(id).await?;
        let value = match apply(&mut post) {
            Ok(value) => value,
            Err(e) => {
                debug!(post_id = %id, error = %e, "mutation rejected");
                return Err(e);
            }
        };
        let outcome = self.sync.save(post).await?;
        Ok(Applied { value, outcome })
    }
}
