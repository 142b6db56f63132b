//! # Seed
//!
//! Assembles the blog core from settings, fills it with demo users, posts,
//! votes and comments, runs a reconciliation sweep and prints the discovery
//! views as JSON.

use std::sync::Arc;

use anyhow::Context;
use configs::{LogSettings, Settings};
use domains::{CategoryId, Identity, NewPost, PageRequest, PostRepository, SearchOrder, Tags};
use secrecy::ExposeSecret;
use services::{PostService, RankingService, SyncEngine};
use storage_adapters::{sqlite, InMemorySearchIndex, SqliteIdentityDirectory, SqlitePostRepository};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USERS: &[(&str, &str)] = &[
    ("carol", "Carol Jones"),
    ("dave", "Dave Smith"),
    ("erin", "Erin Park"),
];

const LANGUAGES: CategoryId = CategoryId(1);
const DATABASES: CategoryId = CategoryId(2);

const POSTS: &[(&str, &str, &str, &str, CategoryId)] = &[
    ("Go Basics", "First steps with Go", "go, systems", "carol", LANGUAGES),
    ("Go Modules", "Dependency management in Go", "go", "carol", LANGUAGES),
    ("Rust Intro", "Ownership in five minutes", "rust", "dave", LANGUAGES),
    ("Async Rust", "Futures, tasks and executors", "rust, async", "dave", LANGUAGES),
    ("SQLite Tips", "Pragmas worth knowing", "sqlite, databases", "erin", DATABASES),
];

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_tracing(&settings.log);

    let pool = sqlite::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
    )
    .await?;
    let posts: Arc<dyn PostRepository> = Arc::new(SqlitePostRepository::new(pool.clone()));
    let identities = Arc::new(SqliteIdentityDirectory::new(pool));
    let index = Arc::new(InMemorySearchIndex::new());

    let sync = Arc::new(SyncEngine::new(posts.clone(), index.clone()));
    let service = PostService::new(posts, sync.clone());
    let ranking = RankingService::new(index.clone(), identities.clone(), settings.discovery);

    for (username, name) in USERS {
        identities
            .upsert_identity(&Identity {
                username: (*username).into(),
                name: (*name).into(),
                email: format!("{username}@example.com"),
                avatar: None,
            })
            .await?;
    }

    let mut ids = Vec::with_capacity(POSTS.len());
    for (title, summary, tags, owner, category) in POSTS {
        let outcome = service
            .create_post(NewPost {
                title: (*title).into(),
                summary: (*summary).into(),
                content: format!("{summary}."),
                tags: Tags::parse(tags),
                owner: (*owner).into(),
                category: Some(*category),
            })
            .await?;
        if outcome.is_degraded() {
            warn!(title, "seeded post is missing from the search index");
        }
        ids.extend(outcome.post_id());
    }

    for (i, id) in ids.iter().enumerate() {
        for _ in 0..(i * 2 + 1) {
            service.increase_read_count(*id).await?;
        }
        for (voter, _) in USERS.iter().take(i % USERS.len() + 1) {
            service.create_vote(*id, (*voter).into()).await?;
        }
        service
            .create_comment(*id, "erin".into(), format!("Comment #{} on post {id}", i + 1))
            .await?;
    }
    info!(posts = ids.len(), "demo content seeded");

    let report = sync.reconcile(100).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    println!("{}", serde_json::to_string_pretty(&ranking.hottest_highlights().await?)?);
    println!("{}", serde_json::to_string_pretty(&ranking.newest_highlights().await?)?);
    println!("{}", serde_json::to_string_pretty(&ranking.trending_tags().await?)?);
    println!("{}", serde_json::to_string_pretty(&ranking.leading_contributors().await?)?);

    let first_page = PageRequest::first(0);
    let daves = ranking.by_owner("dave".into(), "async", SearchOrder::Newest, first_page).await?;
    println!("{}", serde_json::to_string_pretty(&daves)?);
    let filed = ranking.by_category(DATABASES, SearchOrder::Hottest, first_page).await?;
    println!("{}", serde_json::to_string_pretty(&filed)?);
    Ok(())
}
