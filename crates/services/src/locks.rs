//! Per-post async locks. An entry lives only while someone holds or waits
//! on it, so ids that are touched once (or never existed) leave nothing
//! behind.

use std::sync::Arc;

use dashmap::DashMap;
use domains::PostId;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub(crate) struct PostLocks {
    locks: DashMap<PostId, Arc<Mutex<()>>>,
}

impl PostLocks {
    pub(crate) async fn acquire(&self, id: PostId) -> PostGuard<'_> {
        // clone out of the map before awaiting so no shard lock is held
        let lock = self.locks.entry(id).or_default().clone();
        let guard = lock.lock_owned().await;
        PostGuard { locks: self, id, guard: Some(guard) }
    }

    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Holds one post's lock; releasing it evicts the map entry once no other
/// task holds a handle to the same mutex.
pub struct PostGuard<'a> {
    locks: &'a PostLocks,
    id: PostId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PostGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn released_lock_leaves_no_entry() {
        let locks = PostLocks::default();
        for i in 0..100 {
            let _guard = locks.acquire(PostId(i)).await;
            assert_eq!(locks.len(), 1);
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn waiter_keeps_entry_until_it_is_done() {
        let locks = Arc::new(PostLocks::default());
        let first = locks.acquire(PostId(1)).await;

        let waiter = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.acquire(PostId(1)).await;
                locks.len()
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        assert_eq!(locks.len(), 1);
        assert_eq!(waiter.await.unwrap(), 1);
        assert_eq!(locks.len(), 0);
    }
}
