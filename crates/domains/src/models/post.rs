//! # Post Aggregate
//!
//! The post is the aggregate root: it owns its comments and votes by
//! composition and is the only way to mutate them. Every mutation keeps
//! `comment_count == comments.len()` and `vote_count == votes.len()`.
//! Persistence is not the aggregate's concern; callers hand the mutated
//! value to the sync engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    CategoryId, Comment, CommentCollection, CommentId, PostId, Username, Vote, VoteId,
    VoteLedger,
};
use crate::errors::{AppError, Result};

/// Small ordered set of tags. Trimmed, non-empty, first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<String>);

impl Tags {
    /// Builds a tag set. Commas inside an entry split it, since the joined
    /// form uses them as the separator.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for raw in tags {
            for tag in raw.as_ref().split(',') {
                let tag = tag.trim();
                if !tag.is_empty() && !out.iter().any(|t| t == tag) {
                    out.push(tag.to_string());
                }
            }
        }
        Self(out)
    }

    /// Parses the comma-joined storage form, e.g. `"go, systems"`.
    pub fn parse(joined: &str) -> Self {
        Self::new([joined])
    }

    pub fn joined(&self) -> String {
        self.0.join(",")
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fields supplied when authoring a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub tags: Tags,
    pub owner: Username,
    #[serde(default)]
    pub category: Option<CategoryId>,
}

/// Replacement for the editable fields of an existing post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostEdit {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub tags: Tags,
    #[serde(default)]
    pub category: Option<CategoryId>,
}

/// Everything the primary store keeps for one post, used to rebuild it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPost {
    pub id: PostId,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub tags: Tags,
    pub owner: Username,
    pub category: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub read_count: u64,
    pub comments: Vec<Comment>,
    pub next_comment_id: i64,
    pub votes: Vec<Vote>,
    pub next_vote_id: i64,
}

/// Serializable for display, never deserializable: a post read back from
/// storage goes through [`Post::restore`], which re-derives the counters.
///
/// ```compile_fail
/// let post: domains::Post = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    /// `None` until the primary store has assigned one.
    id: Option<PostId>,
    title: String,
    summary: String,
    content: String,
    tags: Tags,
    owner: Username,
    category: Option<CategoryId>,
    created_at: DateTime<Utc>,
    read_count: u64,
    comment_count: u64,
    vote_count: u64,
    comments: CommentCollection,
    votes: VoteLedger,
}

impl Post {
    /// Validates and builds an unpersisted post with zeroed counters.
    pub fn create(new: NewPost) -> Result<Self> {
        validate_title(&new.title)?;
        if new.owner.is_blank() {
            return Err(AppError::ValidationError("post owner must not be empty".into()));
        }
        Ok(Self {
            id: None,
            title: new.title,
            summary: new.summary,
            content: new.content,
            tags: new.tags,
            owner: new.owner,
            category: new.category,
            created_at: Utc::now(),
            read_count: 0,
            comment_count: 0,
            vote_count: 0,
            comments: CommentCollection::default(),
            votes: VoteLedger::default(),
        })
    }

    /// Rebuilds a post read back from the primary store. Comment and vote
    /// counters are re-derived from the collections.
    pub fn restore(p: PersistedPost) -> Self {
        let comments = CommentCollection::restore(p.comments, p.next_comment_id);
        let votes = VoteLedger::restore(p.votes, p.next_vote_id);
        Self {
            id: Some(p.id),
            title: p.title,
            summary: p.summary,
            content: p.content,
            tags: p.tags,
            owner: p.owner,
            category: p.category,
            created_at: p.created_at,
            read_count: p.read_count,
            comment_count: comments.len() as u64,
            vote_count: votes.len() as u64,
            comments,
            votes,
        }
    }

    /// Replaces title, summary, body, tags and category. Validated like
    /// `create`.
    pub fn revise(&mut self, edit: PostEdit) -> Result<()> {
        validate_title(&edit.title)?;
        self.title = edit.title;
        self.summary = edit.summary;
        self.content = edit.content;
        self.tags = edit.tags;
        self.category = edit.category;
        Ok(())
    }

    /// Records the id confirmed by the primary store.
    pub fn mark_persisted(&mut self, id: PostId) {
        self.id = Some(id);
    }

    pub fn add_comment(&mut self, author: Username, content: impl Into<String>) -> Result<CommentId> {
        let content = content.into();
        if author.is_blank() {
            return Err(AppError::ValidationError("comment author must not be empty".into()));
        }
        if content.trim().is_empty() {
            return Err(AppError::ValidationError("comment must not be empty".into()));
        }
        let id = self.comments.append(author, content, Utc::now()).id;
        self.comment_count += 1;
        self.debug_check_counters();
        Ok(id)
    }

    /// Removes a comment. The counter only moves when something was removed.
    pub fn remove_comment(&mut self, id: CommentId) -> Result<Comment> {
        let removed = self
            .comments
            .remove(id)
            .ok_or_else(|| AppError::not_found("Comment", id))?;
        self.comment_count -= 1;
        self.debug_check_counters();
        Ok(removed)
    }

    /// Adds a vote for `voter`.
    ///
    /// A second vote by the same voter leaves the post unchanged and fails
    /// with [`AppError::DuplicateVote`].
    pub fn add_vote(&mut self, voter: Username) -> Result<VoteId> {
        if voter.is_blank() {
            return Err(AppError::ValidationError("voter must not be empty".into()));
        }
        if !self.votes.try_add(voter.clone(), Utc::now()) {
            return Err(AppError::DuplicateVote(voter.to_string()));
        }
        self.vote_count += 1;
        self.debug_check_counters();
        self.votes
            .find_by_voter(&voter)
            .map(|v| v.id)
            .ok_or_else(|| AppError::not_found("Vote", &voter))
    }

    pub fn remove_vote(&mut self, id: VoteId) -> Result<Vote> {
        let removed = self
            .votes
            .remove(id)
            .ok_or_else(|| AppError::not_found("Vote", id))?;
        self.vote_count -= 1;
        self.debug_check_counters();
        Ok(removed)
    }

    /// View counter: every call counts, repeated readers included.
    pub fn increase_read_count(&mut self) -> u64 {
        self.read_count += 1;
        self.read_count
    }

    pub fn id(&self) -> Option<PostId> {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn owner(&self) -> &Username {
        &self.owner
    }

    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    pub fn comment_count(&self) -> u64 {
        self.comment_count
    }

    pub fn vote_count(&self) -> u64 {
        self.vote_count
    }

    pub fn comments(&self) -> &CommentCollection {
        &self.comments
    }

    pub fn votes(&self) -> &VoteLedger {
        &self.votes
    }

    fn debug_check_counters(&self) {
        debug_assert_eq!(self.comment_count, self.comments.len() as u64);
        debug_assert_eq!(self.vote_count, self.votes.len() as u64);
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AppError::ValidationError("post title must not be empty".into()));
    }
    Ok(())
}
