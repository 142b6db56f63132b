use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Username, VoteId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub voter: Username,
    pub created_at: DateTime<Utc>,
}

/// Per-post record of who voted.
///
/// Holds at most one vote per voter. Knows nothing about the post's
/// counters; the aggregate adjusts those from the return values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteLedger {
    votes: Vec<Vote>,
    next_id: i64,
}

impl Default for VoteLedger {
    fn default() -> Self {
        Self { votes: Vec::new(), next_id: 1 }
    }
}

impl VoteLedger {
    /// Rebuilds a ledger from persisted votes.
    ///
    /// `next_id` never moves backwards past an existing id, so ids of removed
    /// votes are not handed out again. A repeated voter keeps only its
    /// earliest vote.
    pub fn restore(mut votes: Vec<Vote>, next_id: i64) -> Self {
        votes.sort_by_key(|v| v.id);
        let mut kept: Vec<Vote> = Vec::with_capacity(votes.len());
        for vote in votes {
            if !kept.iter().any(|k| k.voter == vote.voter) {
                kept.push(vote);
            }
        }
        let floor = kept.last().map_or(1, |v| v.id.0 + 1);
        Self { votes: kept, next_id: next_id.max(floor) }
    }

    /// Inserts a vote for `voter` unless one already exists.
    /// Returns `false` and leaves the ledger untouched on a duplicate.
    pub fn try_add(&mut self, voter: Username, at: DateTime<Utc>) -> bool {
        if self.contains(&voter) {
            return false;
        }
        let id = VoteId(self.next_id);
        self.next_id += 1;
        self.votes.push(Vote { id, voter, created_at: at });
        true
    }

    /// Removes the vote with `id`, returning it, or `None` if absent.
    pub fn remove(&mut self, id: VoteId) -> Option<Vote> {
        let pos = self.votes.iter().position(|v| v.id == id)?;
        Some(self.votes.remove(pos))
    }

    pub fn contains(&self, voter: &Username) -> bool {
        self.find_by_voter(voter).is_some()
    }

    pub fn find_by_voter(&self, voter: &Username) -> Option<&Vote> {
        self.votes.iter().find(|v| &v.voter == voter)
    }

    pub fn get(&self, id: VoteId) -> Option<&Vote> {
        self.votes.iter().find(|v| v.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vote> {
        self.votes.iter()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// The id the next accepted vote will receive.
    pub fn next_id(&self) -> i64 {
        self.next_id
    }
}
