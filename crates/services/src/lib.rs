//! services
//!
//! Application use cases over the blog core: post mutations routed through
//! the sync engine, and read-only discovery over the search index.

mod locks;
pub mod post_service;
pub mod ranking_service;
pub mod sync_engine;

pub use locks::PostGuard;
pub use post_service::{Applied, PostService};
pub use domains::DiscoveryLimits;
pub use ranking_service::RankingService;
pub use sync_engine::{DeleteOutcome, IndexSync, ReconcileReport, SaveOutcome, SyncEngine};
