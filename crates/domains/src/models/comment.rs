use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentId, Username};

/// Immutable once appended; removal is the only lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: Username,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Ordered comments of one post. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentCollection {
    items: Vec<Comment>,
    next_id: i64,
}

impl Default for CommentCollection {
    fn default() -> Self {
        Self { items: Vec::new(), next_id: 1 }
    }
}

impl CommentCollection {
    /// Rebuilds a collection from persisted comments, ordered by id.
    pub fn restore(mut items: Vec<Comment>, next_id: i64) -> Self {
        items.sort_by_key(|c| c.id);
        let floor = items.last().map_or(1, |c| c.id.0 + 1);
        Self { items, next_id: next_id.max(floor) }
    }

    pub fn append(&mut self, author: Username, content: String, at: DateTime<Utc>) -> &Comment {
        let id = CommentId(self.next_id);
        self.next_id += 1;
        self.items.push(Comment { id, author, content, created_at: at });
        &self.items[self.items.len() - 1]
    }

    /// Removes the comment with `id` without disturbing the order of the rest.
    pub fn remove(&mut self, id: CommentId) -> Option<Comment> {
        let pos = self.items.iter().position(|c| c.id == id)?;
        Some(self.items.remove(pos))
    }

    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.items.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn next_id(&self) -> i64 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_creation_order_and_fresh_ids() {
        let mut comments = CommentCollection::default();
        let a = comments.append("alice".into(), "first".into(), Utc::now()).id;
        let b = comments.append("bob".into(), "second".into(), Utc::now()).id;
        assert_ne!(a, b);
        let texts: Vec<_> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[test]
    fn removing_middle_comment_keeps_siblings_intact() {
        let mut comments = CommentCollection::default();
        comments.append("a".into(), "one".into(), Utc::now());
        let mid = comments.append("b".into(), "two".into(), Utc::now()).id;
        comments.append("c".into(), "three".into(), Utc::now());

        let removed = comments.remove(mid).unwrap();
        assert_eq!(removed.content, "two");
        let texts: Vec<_> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, ["one", "three"]);
        assert!(comments.remove(CommentId(99)).is_none());
    }

    #[test]
    fn restore_sorts_by_id() {
        let now = Utc::now();
        let items = vec![
            Comment { id: CommentId(5), author: "b".into(), content: "later".into(), created_at: now },
            Comment { id: CommentId(2), author: "a".into(), content: "earlier".into(), created_at: now },
        ];
        let comments = CommentCollection::restore(items, 0);
        assert_eq!(comments.iter().next().unwrap().id, CommentId(2));
        assert_eq!(comments.next_id(), 6);
    }
}
