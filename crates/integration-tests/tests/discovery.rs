mod support;

use domains::{CategoryId, NewPost, PageRequest, PostId, SearchOrder, TermCount};
use support::{blog, identity, new_post, Blog};

async fn publish(blog: &Blog, title: &str, tags: &str, owner: &str) -> PostId {
    create(blog, new_post(title, tags, owner)).await
}

async fn create(blog: &Blog, post: NewPost) -> PostId {
    blog.service.create_post(post).await.unwrap().post_id().unwrap()
}

#[tokio::test]
async fn top_tags_breaks_ties_by_tag_ascending() {
    let blog = blog().await;
    publish(&blog, "Go Basics", "go, systems", "carol").await;
    publish(&blog, "Go Modules", "go", "carol").await;
    publish(&blog, "Rust Intro", "rust", "dave").await;

    let tags = blog.ranking.top_tags(2).await.unwrap();
    assert_eq!(tags, [TermCount::new("go", 2), TermCount::new("rust", 1)]);
}

#[tokio::test]
async fn hottest_is_non_increasing_in_activity() {
    let blog = blog().await;
    let quiet = publish(&blog, "Quiet", "", "carol").await;
    let busy = publish(&blog, "Busy", "", "carol").await;
    let chatty = publish(&blog, "Chatty", "", "dave").await;

    for _ in 0..3 {
        blog.service.increase_read_count(busy).await.unwrap();
    }
    blog.service.increase_read_count(chatty).await.unwrap();
    blog.service
        .create_comment(chatty, "bob".into(), "first".into())
        .await
        .unwrap();
    blog.service.create_vote(quiet, "bob".into()).await.unwrap();

    let page = blog.ranking.hottest("", PageRequest::first(10)).await.unwrap();
    let order: Vec<_> = page.items.iter().map(|d| d.post_id).collect();
    assert_eq!(order, [busy, chatty, quiet]);

    for pair in page.items.windows(2) {
        let key = |d: &domains::SearchDocument| {
            (d.read_count, d.comment_count, d.vote_count, d.created_at)
        };
        assert!(key(&pair[0]) >= key(&pair[1]));
    }
}

#[tokio::test]
async fn keyword_matches_any_field_case_insensitively() {
    let blog = blog().await;
    let by_title = publish(&blog, "Borrow Checker", "", "carol").await;
    let by_tag = publish(&blog, "Lifetimes", "borrowing", "carol").await;
    publish(&blog, "Unrelated", "misc", "carol").await;

    let page = blog
        .ranking
        .search("BORROW", SearchOrder::Newest, PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    let ids: Vec<_> = page.items.iter().map(|d| d.post_id).collect();
    assert_eq!(ids, [by_tag, by_title]);

    let summary_hit = blog
        .ranking
        .newest("unrelated in brief", PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(summary_hit.total, 1);
}

#[tokio::test]
async fn newest_pages_through_every_post_once() {
    let blog = blog().await;
    let mut ids = Vec::new();
    for n in 0..7 {
        ids.push(publish(&blog, &format!("post {n}"), "", "carol").await);
    }
    ids.reverse();

    let mut seen = Vec::new();
    let mut request = PageRequest::first(3);
    loop {
        let page = blog.ranking.newest("", request).await.unwrap();
        seen.extend(page.items.iter().map(|d| d.post_id));
        if !page.has_next() {
            assert_eq!(page.total_pages(), 3);
            break;
        }
        request = PageRequest::new(request.index + 1, request.size);
    }
    assert_eq!(seen, ids);

    let highlights = blog.ranking.newest_highlights().await.unwrap();
    assert_eq!(highlights.len(), 5);
    assert_eq!(highlights[0].post_id, ids[0]);
}

#[tokio::test]
async fn top_contributors_resolve_through_identity_directory() {
    let blog = blog().await;
    for name in ["carol", "dave"] {
        blog.identities.upsert_identity(&identity(name)).await.unwrap();
    }
    publish(&blog, "a", "", "dave").await;
    publish(&blog, "b", "", "carol").await;
    publish(&blog, "c", "", "carol").await;
    publish(&blog, "d", "", "erin").await;

    let top = blog.ranking.top_contributors(3).await.unwrap();
    let names: Vec<_> = top.iter().map(|i| i.username.as_str()).collect();
    assert_eq!(names, ["carol", "dave"]);
    assert_eq!(top[0].email, "carol@example.com");

    let defaults = blog.ranking.leading_contributors().await.unwrap();
    assert_eq!(defaults, top);
}

#[tokio::test]
async fn owner_listing_keeps_only_their_matching_posts() {
    let blog = blog().await;
    let by_title = publish(&blog, "Rust Intro", "", "dave").await;
    publish(&blog, "Gardening", "", "dave").await;
    let by_tag = publish(&blog, "Async", "rust", "dave").await;
    publish(&blog, "Rust Elsewhere", "rust", "carol").await;

    let newest = blog
        .ranking
        .by_owner("dave".into(), "RUST", SearchOrder::Newest, PageRequest::first(10))
        .await
        .unwrap();
    let ids: Vec<_> = newest.items.iter().map(|d| d.post_id).collect();
    assert_eq!(ids, [by_tag, by_title]);

    for _ in 0..2 {
        blog.service.increase_read_count(by_title).await.unwrap();
    }
    let hottest = blog
        .ranking
        .by_owner("dave".into(), "rust", SearchOrder::Hottest, PageRequest::first(10))
        .await
        .unwrap();
    let ids: Vec<_> = hottest.items.iter().map(|d| d.post_id).collect();
    assert_eq!(ids, [by_title, by_tag]);

    let all = blog
        .ranking
        .by_owner("dave".into(), "", SearchOrder::Newest, PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(all.total, 3);
}

#[tokio::test]
async fn category_listing_follows_edits() {
    let blog = blog().await;
    let languages = CategoryId(1);
    let databases = CategoryId(2);
    let go = create(&blog, NewPost { category: Some(languages), ..new_post("Go", "", "carol") }).await;
    let rust = create(&blog, NewPost { category: Some(languages), ..new_post("Rust", "", "dave") }).await;
    publish(&blog, "Uncategorized", "", "carol").await;

    let page = blog
        .ranking
        .by_category(languages, SearchOrder::Newest, PageRequest::first(10))
        .await
        .unwrap();
    let ids: Vec<_> = page.items.iter().map(|d| d.post_id).collect();
    assert_eq!(ids, [rust, go]);

    let post = blog.service.get_post(go).await.unwrap();
    blog.service
        .edit_post(
            go,
            domains::PostEdit {
                title: post.title().into(),
                summary: post.summary().into(),
                content: post.content().into(),
                tags: post.tags().clone(),
                category: Some(databases),
            },
        )
        .await
        .unwrap();

    let languages_now = blog
        .ranking
        .by_category(languages, SearchOrder::Newest, PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(languages_now.items.iter().map(|d| d.post_id).collect::<Vec<_>>(), [rust]);
    let databases_now = blog
        .ranking
        .by_category(databases, SearchOrder::Newest, PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(databases_now.items.iter().map(|d| d.post_id).collect::<Vec<_>>(), [go]);
}
