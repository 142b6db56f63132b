//! # In-memory search index
//!
//! Process-local [`SearchIndex`] backed by two concurrent maps: documents by
//! document id, and document id by post back-reference. Matching, ordering
//! and term tallies are delegated to `domains::ranking`.

use async_trait::async_trait;
use dashmap::DashMap;
use domains::ranking;
use domains::{
    DocId, Page, PageRequest, PostId, SearchDocument, SearchFilter, SearchIndex, SearchOrder,
    TermCount, TermField,
};

#[derive(Default)]
pub struct InMemorySearchIndex {
    docs: DashMap<DocId, SearchDocument>,
    by_post: DashMap<PostId, DocId>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn snapshot(&self) -> Vec<SearchDocument> {
        self.docs.iter().map(|entry| entry.value().clone()).collect()
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn find_by_post_id(&self, post_id: PostId) -> anyhow::Result<Option<SearchDocument>> {
        let Some(doc_id) = self.by_post.get(&post_id).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        Ok(self.docs.get(&doc_id).map(|doc| doc.value().clone()))
    }

    /// A document without an id takes over the id already indexed for its
    /// post, so repeated upserts never produce a second document.
    async fn upsert(&self, mut doc: SearchDocument) -> anyhow::Result<SearchDocument> {
        let existing = self.by_post.get(&doc.post_id).map(|id| id.value().clone());
        let id = match (doc.id.clone(), existing) {
            (Some(id), Some(old)) if id != old => {
                self.docs.remove(&old);
                id
            }
            (Some(id), _) => id,
            (None, Some(old)) => old,
            (None, None) => DocId::generate(),
        };
        doc.id = Some(id.clone());
        self.by_post.insert(doc.post_id, id.clone());
        self.docs.insert(id.clone(), doc.clone());
        tracing::trace!(doc_id = %id, post_id = %doc.post_id, "document indexed");
        Ok(doc)
    }

    async fn delete_by_id(&self, id: &DocId) -> anyhow::Result<bool> {
        let Some((_, doc)) = self.docs.remove(id) else {
            return Ok(false);
        };
        self.by_post.remove_if(&doc.post_id, |_, mapped| mapped == id);
        Ok(true)
    }

    async fn query(
        &self,
        filter: &SearchFilter,
        order: SearchOrder,
        page: PageRequest,
    ) -> anyhow::Result<Page<SearchDocument>> {
        Ok(ranking::rank(self.snapshot(), filter, order, page))
    }

    async fn term_frequency(&self, field: TermField, top_n: usize) -> anyhow::Result<Vec<TermCount>> {
        let docs = self.snapshot();
        Ok(ranking::tally_terms(&docs, field, top_n))
    }

    async fn list_post_ids(&self) -> anyhow::Result<Vec<PostId>> {
        let mut ids: Vec<PostId> = self.by_post.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        Ok(ids)
    }
}
