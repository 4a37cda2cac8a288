use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    #[serde(alias = "upvote")]
    Up,
    #[serde(alias = "downvote")]
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" | "upvote" => Some(VoteDirection::Up),
            "down" | "downvote" => Some(VoteDirection::Down),
            _ => None,
        }
    }
}

/// Vote counters of a review or an edit suggestion.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
}

/// What a cast did, and the voter's standing vote afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub upvotes: i64,
    pub downvotes: i64,
    pub user_vote: Option<VoteDirection>,
}

impl VoteTally {
    pub fn new(upvotes: i64, downvotes: i64) -> Self {
        Self { upvotes, downvotes }
    }

    pub fn net(&self) -> i64 {
        self.upvotes - self.downvotes
    }

    /// Applies a toggle vote. Repeating the standing vote withdraws it, the
    /// opposite direction flips it, otherwise a new vote is added.
    pub fn cast(&mut self, previous: Option<VoteDirection>, direction: VoteDirection) -> VoteOutcome {
        let user_vote = match previous {
            Some(prev) if prev == direction => {
                self.retract(prev);
                None
            }
            Some(prev) => {
                self.retract(prev);
                self.add(direction);
                Some(direction)
            }
            None => {
                self.add(direction);
                Some(direction)
            }
        };

        VoteOutcome {
            upvotes: self.upvotes,
            downvotes: self.downvotes,
            user_vote,
        }
    }

    fn add(&mut self, direction: VoteDirection) {
        match direction {
            VoteDirection::Up => self.upvotes += 1,
            VoteDirection::Down => self.downvotes += 1,
        }
    }

    fn retract(&mut self, direction: VoteDirection) {
        let counter = match direction {
            VoteDirection::Up => &mut self.upvotes,
            VoteDirection::Down => &mut self.downvotes,
        };
        *counter = (*counter - 1).max(0);
    }
}

/// Optimistic deltas for one review, relative to the last server counts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteDelta {
    pub up: i64,
    pub down: i64,
}

impl VoteDelta {
    fn is_zero(&self) -> bool {
        self.up == 0 && self.down == 0
    }
}

#[derive(Debug, Clone, Default)]
struct RestaurantBuffer {
    generation: u64,
    deltas: HashMap<i64, VoteDelta>,
}

/// Marks the buffer state a sync was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTicket {
    restaurant_id: i64,
    generation: u64,
}

/// Client-side bookkeeping for votes that have not reached the server yet.
#[derive(Debug, Clone, Default)]
pub struct PendingVotes {
    buffers: HashMap<i64, RestaurantBuffer>,
}

impl PendingVotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the delta between the counts before and after an optimistic vote.
    pub fn record(&mut self, restaurant_id: i64, review_id: i64, before: VoteTally, after: VoteTally) {
        let buffer = self.buffers.entry(restaurant_id).or_default();
        buffer.generation += 1;

        let delta = buffer.deltas.entry(review_id).or_default();
        delta.up += after.upvotes - before.upvotes;
        delta.down += after.downvotes - before.downvotes;
        if delta.is_zero() {
            buffer.deltas.remove(&review_id);
        }
        if buffer.deltas.is_empty() {
            self.buffers.remove(&restaurant_id);
        }
    }

    pub fn delta(&self, restaurant_id: i64, review_id: i64) -> Option<VoteDelta> {
        self.buffers
            .get(&restaurant_id)
            .and_then(|b| b.deltas.get(&review_id))
            .copied()
    }

    /// Server counts with the pending deltas layered on top.
    pub fn merged(&self, restaurant_id: i64, review_id: i64, server: VoteTally) -> VoteTally {
        match self.delta(restaurant_id, review_id) {
            Some(d) => VoteTally {
                upvotes: (server.upvotes + d.up).max(0),
                downvotes: (server.downvotes + d.down).max(0),
            },
            None => server,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn begin_sync(&self, restaurant_id: i64) -> SyncTicket {
        SyncTicket {
            restaurant_id,
            generation: self
                .buffers
                .get(&restaurant_id)
                .map(|b| b.generation)
                .unwrap_or(0),
        }
    }

    /// Clears the restaurant's buffer after a successful sync. Returns false
    /// and keeps the buffer when votes were recorded after the ticket was taken.
    pub fn confirm(&mut self, ticket: SyncTicket) -> bool {
        match self.buffers.get(&ticket.restaurant_id) {
            Some(buffer) if buffer.generation != ticket.generation => false,
            _ => {
                self.buffers.remove(&ticket.restaurant_id);
                true
            }
        }
    }
}
