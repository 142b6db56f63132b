//! # Ranking Service
//!
//! Read-only discovery over the search index: keyword search in newest or
//! hottest order, per-owner and per-category listings, trending tags and top
//! contributors. Never touches the primary store, so results are as fresh as
//! the index.

use std::collections::HashMap;
use std::sync::Arc;

use domains::ranking::top_terms;
use domains::{
    AppError, CategoryId, DiscoveryLimits, Identity, IdentityLookup, Page, PageRequest, Result,
    SearchDocument, SearchFilter, SearchIndex, SearchOrder, TermCount, TermField, Username,
};
use tracing::debug;

pub struct RankingService {
    index: Arc<dyn SearchIndex>,
    identities: Arc<dyn IdentityLookup>,
    limits: DiscoveryLimits,
}

impl RankingService {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        identities: Arc<dyn IdentityLookup>,
        limits: DiscoveryLimits,
    ) -> Self {
        Self { index, identities, limits }
    }

    pub fn limits(&self) -> DiscoveryLimits {
        self.limits
    }

    /// Runs `filter` against the index with a trimmed keyword and a
    /// normalized page.
    pub async fn query(
        &self,
        mut filter: SearchFilter,
        order: SearchOrder,
        page: PageRequest,
    ) -> Result<Page<SearchDocument>> {
        let page = self.limits.normalize(page);
        filter.keyword = filter.keyword.trim().to_string();
        self.index
            .query(&filter, order, page)
            .await
            .map_err(AppError::store)
    }

    pub async fn search(
        &self,
        keyword: &str,
        order: SearchOrder,
        page: PageRequest,
    ) -> Result<Page<SearchDocument>> {
        self.query(SearchFilter::keyword(keyword), order, page).await
    }

    /// Posts by `owner` matching `keyword`, in the caller's order.
    pub async fn by_owner(
        &self,
        owner: Username,
        keyword: &str,
        order: SearchOrder,
        page: PageRequest,
    ) -> Result<Page<SearchDocument>> {
        self.query(SearchFilter::keyword(keyword).owned_by(owner), order, page).await
    }

    /// Posts filed under `category`, in the caller's order.
    pub async fn by_category(
        &self,
        category: CategoryId,
        order: SearchOrder,
        page: PageRequest,
    ) -> Result<Page<SearchDocument>> {
        self.query(SearchFilter::default().in_category(category), order, page).await
    }

    pub async fn newest(&self, keyword: &str, page: PageRequest) -> Result<Page<SearchDocument>> {
        self.search(keyword, SearchOrder::Newest, page).await
    }

    pub async fn hottest(&self, keyword: &str, page: PageRequest) -> Result<Page<SearchDocument>> {
        self.search(keyword, SearchOrder::Hottest, page).await
    }

    pub async fn top_newest(&self, n: usize) -> Result<Vec<SearchDocument>> {
        self.top_posts(SearchOrder::Newest, n).await
    }

    pub async fn top_hottest(&self, n: usize) -> Result<Vec<SearchDocument>> {
        self.top_posts(SearchOrder::Hottest, n).await
    }

    /// Most used tags, ties broken by tag ascending.
    pub async fn top_tags(&self, n: usize) -> Result<Vec<TermCount>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let terms = self
            .index
            .term_frequency(TermField::Tags, n)
            .await
            .map_err(AppError::store)?;
        Ok(top_terms(terms.into_iter().map(|t| (t.term, t.count)), n))
    }

    /// Owners of the most posts, resolved to full identities in rank order.
    /// Usernames the directory does not know are skipped.
    pub async fn top_contributors(&self, n: usize) -> Result<Vec<Identity>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let terms = self
            .index
            .term_frequency(TermField::Username, n)
            .await
            .map_err(AppError::store)?;
        let ranked: Vec<Username> = top_terms(terms.into_iter().map(|t| (t.term, t.count)), n)
            .into_iter()
            .map(|t| Username::new(t.term))
            .collect();
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let resolved = self
            .identities
            .resolve_by_usernames(&ranked)
            .await
            .map_err(AppError::store)?;
        let mut by_name: HashMap<Username, Identity> =
            resolved.into_iter().map(|i| (i.username.clone(), i)).collect();

        let mut out = Vec::with_capacity(ranked.len());
        for username in ranked {
            match by_name.remove(&username) {
                Some(identity) => out.push(identity),
                None => debug!(%username, "contributor not found in identity directory"),
            }
        }
        Ok(out)
    }

    pub async fn trending_tags(&self) -> Result<Vec<TermCount>> {
        self.top_tags(self.limits.top_tags).await
    }

    pub async fn leading_contributors(&self) -> Result<Vec<Identity>> {
        self.top_contributors(self.limits.top_contributors).await
    }

    pub async fn newest_highlights(&self) -> Result<Vec<SearchDocument>> {
        self.top_newest(self.limits.top_posts).await
    }

    pub async fn hottest_highlights(&self) -> Result<Vec<SearchDocument>> {
        self.top_hottest(self.limits.top_posts).await
    }

    async fn top_posts(&self, order: SearchOrder, n: usize) -> Result<Vec<SearchDocument>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        Ok(self.search("", order, PageRequest::first(n)).await?.items)
    }
}
