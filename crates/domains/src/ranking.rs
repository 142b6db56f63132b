//! # Ranking primitives
//!
//! Keyword and filter matching, the two result orderings, paging and term-frequency
//! tallies. Index adapters call these so every backend ranks identically.
//!
//! Ties that survive every sort key are broken by `post_id`, larger first.
//! The back-reference is used instead of the document id because it stays
//! stable when a document is re-derived.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    Page, PageRequest, SearchDocument, SearchFilter, SearchOrder, TermCount, TermField,
};

/// Case-insensitive substring match on title, summary, body or any tag.
/// A blank keyword matches every document.
pub fn matches_keyword(doc: &SearchDocument, keyword: &str) -> bool {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let hit = |field: &str| field.to_lowercase().contains(&needle);
    hit(&doc.title)
        || hit(&doc.summary)
        || hit(&doc.content)
        || doc.tags.iter().any(|t| hit(t))
}

/// Keyword match plus exact owner and category checks when those are set.
pub fn matches(doc: &SearchDocument, filter: &SearchFilter) -> bool {
    filter.owner.as_ref().is_none_or(|owner| doc.username == *owner)
        && filter.category.is_none_or(|category| doc.category == Some(category))
        && matches_keyword(doc, &filter.keyword)
}

/// `Ordering::Less` means `a` is listed before `b`.
pub fn compare(order: SearchOrder, a: &SearchDocument, b: &SearchDocument) -> Ordering {
    let primary = match order {
        SearchOrder::Newest => b.created_at.cmp(&a.created_at),
        SearchOrder::Hottest => b
            .read_count
            .cmp(&a.read_count)
            .then_with(|| b.comment_count.cmp(&a.comment_count))
            .then_with(|| b.vote_count.cmp(&a.vote_count))
            .then_with(|| b.created_at.cmp(&a.created_at)),
    };
    primary.then_with(|| b.post_id.cmp(&a.post_id))
}

/// Filters, sorts and slices `docs` into the requested page.
pub fn rank(
    docs: impl IntoIterator<Item = SearchDocument>,
    filter: &SearchFilter,
    order: SearchOrder,
    page: PageRequest,
) -> Page<SearchDocument> {
    let mut hits: Vec<SearchDocument> = docs.into_iter().filter(|d| matches(d, filter)).collect();
    hits.sort_by(|a, b| compare(order, a, b));
    let total = hits.len();
    let items = hits.into_iter().skip(page.offset()).take(page.size).collect();
    Page { items, index: page.index, size: page.size, total }
}

/// Counts documents per term of `field`. A document counts once per distinct
/// term. Sorted by count descending, then term ascending.
pub fn tally_terms<'a>(
    docs: impl IntoIterator<Item = &'a SearchDocument>,
    field: TermField,
    top_n: usize,
) -> Vec<TermCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for doc in docs {
        match field {
            TermField::Tags => {
                let distinct: BTreeSet<&str> = doc.tags.iter().map(String::as_str).collect();
                for tag in distinct {
                    *counts.entry(tag.to_string()).or_default() += 1;
                }
            }
            TermField::Username => {
                *counts.entry(doc.username.to_string()).or_default() += 1;
            }
        }
    }
    top_terms(counts, top_n)
}

/// Orders raw term counts by count descending, then term ascending.
pub fn top_terms(counts: impl IntoIterator<Item = (String, u64)>, top_n: usize) -> Vec<TermCount> {
    let mut terms: Vec<TermCount> = counts.into_iter().map(|(t, c)| TermCount::new(t, c)).collect();
    terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    terms.truncate(top_n);
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, PostId};
    use chrono::{TimeZone, Utc};

    fn doc(post_id: i64, counts: (u64, u64, u64), minute: u32) -> SearchDocument {
        SearchDocument {
            id: None,
            post_id: PostId(post_id),
            title: format!("post {post_id}"),
            summary: String::new(),
            content: String::new(),
            tags: Vec::new(),
            username: "carol".into(),
            category: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
            read_count: counts.0,
            comment_count: counts.1,
            vote_count: counts.2,
        }
    }

    fn ids(page: &Page<SearchDocument>) -> Vec<i64> {
        page.items.iter().map(|d| d.post_id.0).collect()
    }

    #[test]
    fn hottest_breaks_ties_field_by_field() {
        let docs = vec![
            doc(1, (5, 0, 0), 0),
            doc(2, (5, 2, 0), 0),
            doc(3, (5, 2, 7), 0),
            doc(4, (9, 0, 0), 0),
            doc(5, (5, 2, 7), 30),
        ];
        let page = rank(docs, &SearchFilter::default(), SearchOrder::Hottest, PageRequest::first(10));
        assert_eq!(ids(&page), [4, 5, 3, 2, 1]);
    }

    #[test]
    fn identical_keys_fall_back_to_larger_post_id() {
        let docs = vec![doc(7, (1, 1, 1), 5), doc(9, (1, 1, 1), 5), doc(8, (1, 1, 1), 5)];
        let hottest = rank(docs.clone(), &SearchFilter::default(), SearchOrder::Hottest, PageRequest::first(10));
        let newest = rank(docs, &SearchFilter::default(), SearchOrder::Newest, PageRequest::first(10));
        assert_eq!(ids(&hottest), [9, 8, 7]);
        assert_eq!(ids(&newest), [9, 8, 7]);
    }

    #[test]
    fn newest_orders_by_creation_time() {
        let docs = vec![doc(1, (100, 0, 0), 1), doc(2, (0, 0, 0), 40), doc(3, (0, 0, 0), 20)];
        let page = rank(docs, &SearchFilter::default(), SearchOrder::Newest, PageRequest::first(10));
        assert_eq!(ids(&page), [2, 3, 1]);
    }

    #[test]
    fn keyword_matches_any_field_case_insensitively() {
        let mut tagged = doc(1, (0, 0, 0), 0);
        tagged.tags = vec!["Rust".into()];
        let mut summarized = doc(2, (0, 0, 0), 0);
        summarized.summary = "why RUST matters".into();
        let mut body = doc(3, (0, 0, 0), 0);
        body.content = "trust issues".into();
        let other = doc(4, (0, 0, 0), 0);

        assert!(matches_keyword(&tagged, "rust"));
        assert!(matches_keyword(&summarized, "Rust"));
        assert!(matches_keyword(&body, " rust "));
        assert!(!matches_keyword(&other, "rust"));
        assert!(matches_keyword(&other, ""));
    }

    #[test]
    fn owner_and_category_narrow_keyword_hits() {
        let mut mine = doc(1, (0, 0, 0), 10);
        mine.title = "Rust at work".into();
        mine.category = Some(CategoryId(3));
        let mut older_mine = doc(2, (0, 0, 0), 5);
        older_mine.tags = vec!["rust".into()];
        let mut theirs = doc(3, (0, 0, 0), 20);
        theirs.title = "Rust elsewhere".into();
        theirs.username = "dave".into();
        theirs.category = Some(CategoryId(3));
        let docs = vec![mine, older_mine, theirs];

        let carol = SearchFilter::keyword("rust").owned_by("carol".into());
        let page = rank(docs.clone(), &carol, SearchOrder::Newest, PageRequest::first(10));
        assert_eq!(ids(&page), [1, 2]);

        let filed = SearchFilter::default().in_category(CategoryId(3));
        let page = rank(docs.clone(), &filed, SearchOrder::Newest, PageRequest::first(10));
        assert_eq!(ids(&page), [3, 1]);

        let both = carol.in_category(CategoryId(3));
        assert_eq!(ids(&rank(docs, &both, SearchOrder::Hottest, PageRequest::first(10))), [1]);
    }

    #[test]
    fn paging_slices_after_sorting() {
        let docs: Vec<_> = (1..=5).map(|i| doc(i, (i as u64, 0, 0), 0)).collect();
        let page = rank(docs, &SearchFilter::default(), SearchOrder::Hottest, PageRequest::new(1, 2));
        assert_eq!(ids(&page), [3, 2]);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
    }

    #[test]
    fn top_tags_ties_resolve_alphabetically() {
        let mut a = doc(1, (0, 0, 0), 0);
        a.tags = vec!["go".into(), "systems".into()];
        let mut b = doc(2, (0, 0, 0), 0);
        b.tags = vec!["go".into()];
        let mut c = doc(3, (0, 0, 0), 0);
        c.tags = vec!["rust".into()];

        let top = tally_terms([&a, &b, &c], TermField::Tags, 2);
        assert_eq!(top, vec![TermCount::new("go", 2), TermCount::new("rust", 1)]);
    }

    #[test]
    fn repeated_tag_in_one_document_counts_once() {
        let mut a = doc(1, (0, 0, 0), 0);
        a.tags = vec!["go".into(), "go".into()];
        let top = tally_terms([&a], TermField::Tags, 10);
        assert_eq!(top, vec![TermCount::new("go", 1)]);
    }

    #[test]
    fn contributors_are_counted_per_document() {
        let a = doc(1, (0, 0, 0), 0);
        let b = doc(2, (0, 0, 0), 0);
        let mut c = doc(3, (0, 0, 0), 0);
        c.username = "alice".into();
        let top = tally_terms([&a, &b, &c], TermField::Username, 5);
        assert_eq!(top, vec![TermCount::new("carol", 2), TermCount::new("alice", 1)]);
    }
}
