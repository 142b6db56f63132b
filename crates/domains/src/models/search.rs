//! Search-side read models: the denormalized document, orderings and paging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CategoryId, DocId, Post, PostId, Username};

/// Denormalized projection of a post used only for discovery reads.
///
/// `post_id` is the back-reference and the join key for re-sync; `id` is
/// assigned by the index on first upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: Option<DocId>,
    pub post_id: PostId,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub tags: Vec<String>,
    pub username: Username,
    #[serde(default)]
    pub category: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub read_count: u64,
    pub comment_count: u64,
    pub vote_count: u64,
}

impl SearchDocument {
    /// Fresh document for a persisted post. Returns `None` for a post that
    /// has no id yet, which cannot be back-referenced.
    pub fn derive(post: &Post) -> Option<Self> {
        let post_id = post.id()?;
        Some(Self {
            id: None,
            post_id,
            title: post.title().to_string(),
            summary: post.summary().to_string(),
            content: post.content().to_string(),
            tags: post.tags().as_slice().to_vec(),
            username: post.owner().clone(),
            category: post.category(),
            created_at: post.created_at(),
            read_count: post.read_count(),
            comment_count: post.comment_count(),
            vote_count: post.vote_count(),
        })
    }

    /// Full overwrite from `post`, keeping only this document's own id.
    pub fn overwrite_from(&mut self, post: &Post) -> bool {
        match Self::derive(post) {
            Some(fresh) => {
                let id = self.id.take();
                *self = Self { id, ..fresh };
                true
            }
            None => false,
        }
    }

    /// True when every projected field equals the post's current value.
    pub fn reflects(&self, post: &Post) -> bool {
        match Self::derive(post) {
            Some(fresh) => Self { id: self.id.clone(), ..fresh } == *self,
            None => false,
        }
    }
}

/// Narrows a search. The keyword is matched as in
/// [`crate::ranking::matches_keyword`]; owner and category must match
/// exactly when set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilter {
    pub keyword: String,
    pub owner: Option<Username>,
    pub category: Option<CategoryId>,
}

impl SearchFilter {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self { keyword: keyword.into(), ..Self::default() }
    }

    pub fn owned_by(mut self, owner: Username) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn in_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }
}

/// Result ordering for keyword search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOrder {
    /// Creation time, most recent first.
    Newest,
    /// Read, comment, vote counts then creation time, all descending.
    Hottest,
}

/// Document field a term-frequency aggregation runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermField {
    Tags,
    Username,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: u64,
}

impl TermCount {
    pub fn new(term: impl Into<String>, count: u64) -> Self {
        Self { term: term.into(), count }
    }
}

/// Page-size bounds and default list lengths for discovery views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub top_tags: usize,
    pub top_contributors: usize,
    pub top_posts: usize,
}

impl Default for DiscoveryLimits {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            top_tags: 30,
            top_contributors: 12,
            top_posts: 5,
        }
    }
}

impl DiscoveryLimits {
    /// Zero size means "default"; anything above the maximum is clamped.
    pub fn normalize(&self, page: PageRequest) -> PageRequest {
        let size = match page.size {
            0 => self.default_page_size,
            n => n.min(self.max_page_size),
        };
        PageRequest { index: page.index, size }
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub index: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(index: usize, size: usize) -> Self {
        Self { index, size }
    }

    pub fn first(size: usize) -> Self {
        Self { index: 0, size }
    }

    pub fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub index: usize,
    pub size: usize,
    /// Number of matches across all pages.
    pub total: usize,
}

impl<T> Page<T> {
    pub fn empty(request: PageRequest) -> Self {
        Self { items: Vec::new(), index: request.index, size: request.size, total: 0 }
    }

    pub fn total_pages(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.total.div_ceil(self.size)
        }
    }

    pub fn has_next(&self) -> bool {
        self.index.saturating_add(1) < self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            index: self.index,
            size: self.size,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_possible_page_has_no_next() {
        let page: Page<()> = Page { items: Vec::new(), index: usize::MAX, size: 1, total: usize::MAX };
        assert!(!page.has_next());

        let middle: Page<()> = Page { items: Vec::new(), index: 1, size: 2, total: 5 };
        assert!(middle.has_next());
    }

}
