//! Wiring shared by the integration suites: SQLite in memory as primary,
//! the in-memory index as secondary, optionally behind a switch that makes
//! every index call fail.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use domains::{
    DocId, Identity, NewPost, Page, PageRequest, PostId, PostRepository, SearchDocument,
    SearchFilter, SearchIndex, SearchOrder, Tags, TermCount, TermField,
};
use services::{DiscoveryLimits, PostService, RankingService, SyncEngine};
use storage_adapters::sqlite::connect_in_memory;
use storage_adapters::{InMemorySearchIndex, SqliteIdentityDirectory, SqlitePostRepository};

/// Search index that can be taken offline mid-test.
#[derive(Default)]
pub struct SwitchableIndex {
    inner: InMemorySearchIndex,
    offline: AtomicBool,
}

impl SwitchableIndex {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            anyhow::bail!("search index unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for SwitchableIndex {
    async fn find_by_post_id(&self, post_id: PostId) -> anyhow::Result<Option<SearchDocument>> {
        self.check()?;
        self.inner.find_by_post_id(post_id).await
    }

    async fn upsert(&self, doc: SearchDocument) -> anyhow::Result<SearchDocument> {
        self.check()?;
        self.inner.upsert(doc).await
    }

    async fn delete_by_id(&self, id: &DocId) -> anyhow::Result<bool> {
        self.check()?;
        self.inner.delete_by_id(id).await
    }

    async fn query(
        &self,
        filter: &SearchFilter,
        order: SearchOrder,
        page: PageRequest,
    ) -> anyhow::Result<Page<SearchDocument>> {
        self.check()?;
        self.inner.query(filter, order, page).await
    }

    async fn term_frequency(&self, field: TermField, top_n: usize) -> anyhow::Result<Vec<TermCount>> {
        self.check()?;
        self.inner.term_frequency(field, top_n).await
    }

    async fn list_post_ids(&self) -> anyhow::Result<Vec<PostId>> {
        self.check()?;
        self.inner.list_post_ids().await
    }
}

pub struct Blog {
    pub posts: Arc<SqlitePostRepository>,
    pub index: Arc<SwitchableIndex>,
    pub identities: Arc<SqliteIdentityDirectory>,
    pub sync: Arc<SyncEngine>,
    pub service: PostService,
    pub ranking: RankingService,
}

pub async fn blog() -> Blog {
    let pool = connect_in_memory().await.expect("in-memory sqlite");
    let posts = Arc::new(SqlitePostRepository::new(pool.clone()));
    let identities = Arc::new(SqliteIdentityDirectory::new(pool));
    let index = Arc::new(SwitchableIndex::default());

    let repo: Arc<dyn PostRepository> = posts.clone();
    let sync = Arc::new(SyncEngine::new(repo.clone(), index.clone()));
    let service = PostService::new(repo, sync.clone());
    let ranking = RankingService::new(index.clone(), identities.clone(), DiscoveryLimits::default());

    Blog { posts, index, identities, sync, service, ranking }
}

pub fn new_post(title: &str, tags: &str, owner: &str) -> NewPost {
    NewPost {
        title: title.into(),
        summary: format!("{title} in brief"),
        content: format!("all about {title}"),
        tags: Tags::parse(tags),
        owner: owner.into(),
        category: None,
    }
}

pub fn identity(username: &str) -> Identity {
    Identity {
        username: username.into(),
        name: username.to_uppercase(),
        email: format!("{username}@example.com"),
        avatar: None,
    }
}
