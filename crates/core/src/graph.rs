//! In-memory friendship graph.
//!
//! Users are vertices; every friend request is a directed edge carrying a
//! [`FriendshipStatus`]. At most one edge exists per unordered pair, enforced
//! through a [`PairKey`] index rather than by looking up both directions.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use kinship_common::{AppError, AppResult};
use kinship_db::entities::friendship::{self, FriendshipStatus};
use serde::Serialize;

/// Externally issued user identifier.
pub type UserId = i32;

/// Friendship edge identifier.
pub type EdgeId = i32;

/// Message used whenever accept/reject cannot find a pending request.
pub const REQUEST_NOT_FOUND: &str = "Friend request not found.";

pub use kinship_db::entities::friendship::REQUEST_EXISTS;

/// Message used for self-addressed requests.
pub const SELF_REQUEST: &str = "Cannot send friend request to yourself.";

/// Canonical key of an unordered user pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    low: UserId,
    high: UserId,
}

impl PairKey {
    /// Key for `{a, b}`; argument order does not matter.
    #[must_use]
    pub const fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&friendship::pair_key(self.low, self.high))
    }
}

/// A directed friend-request edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub id: EdgeId,
    pub sender: UserId,
    pub receiver: UserId,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Edge {
    /// The endpoint that is not `user`, if `user` is an endpoint at all.
    #[must_use]
    pub const fn other_endpoint(&self, user: UserId) -> Option<UserId> {
        friendship::other_endpoint(self.sender, self.receiver, user)
    }
}

impl From<friendship::Model> for Edge {
    fn from(m: friendship::Model) -> Self {
        Self {
            id: m.id,
            sender: m.sender,
            receiver: m.receiver,
            status: m.status,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

/// Friendship relationship graph.
#[derive(Debug, Default)]
pub struct FriendshipGraph {
    users: BTreeSet<UserId>,
    edges: BTreeMap<EdgeId, Edge>,
    pairs: HashMap<PairKey, EdgeId>,
    adjacency: HashMap<UserId, BTreeSet<EdgeId>>,
    last_id: EdgeId,
}

impl FriendshipGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a known user. Returns `false` if the user was already known.
    pub fn register_user(&mut self, user: UserId) -> bool {
        self.users.insert(user)
    }

    /// Whether `user` has been registered.
    #[must_use]
    pub fn contains_user(&self, user: UserId) -> bool {
        self.users.contains(&user)
    }

    /// Look up an edge by its id.
    #[must_use]
    pub fn find_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Record a new `Requested` edge from `sender` to `receiver`.
    pub fn create_request(&mut self, sender: UserId, receiver: UserId) -> AppResult<EdgeId> {
        if sender == receiver {
            return Err(AppError::Validation(SELF_REQUEST.to_string()));
        }
        for user in [sender, receiver] {
            if !self.contains_user(user) {
                return Err(AppError::UserNotFound(user));
            }
        }

        let key = PairKey::new(sender, receiver);
        if self.pairs.contains_key(&key) {
            return Err(AppError::Conflict(REQUEST_EXISTS.to_string()));
        }

        self.last_id += 1;
        let id = self.last_id;
        let now = Utc::now();

        self.edges.insert(
            id,
            Edge {
                id,
                sender,
                receiver,
                status: FriendshipStatus::Requested,
                created_at: now,
                updated_at: now,
            },
        );
        self.pairs.insert(key, id);
        self.adjacency.entry(sender).or_default().insert(id);
        self.adjacency.entry(receiver).or_default().insert(id);

        Ok(id)
    }

    /// Users `user` may send a request to: every known user except `user`
    /// and anyone already joined to `user` by an edge of any status.
    #[must_use]
    pub fn list_eligible(&self, user: UserId) -> BTreeSet<UserId> {
        self.users
            .iter()
            .copied()
            .filter(|&other| other != user && !self.pairs.contains_key(&PairKey::new(user, other)))
            .collect()
    }

    /// Senders of pending requests addressed to `user`, oldest first.
    #[must_use]
    pub fn list_received_requests(&self, user: UserId) -> Vec<UserId> {
        self.received_pending(user).map(|e| e.sender).collect()
    }

    /// Number of pending requests addressed to `user`.
    #[must_use]
    pub fn count_received_requests(&self, user: UserId) -> usize {
        self.received_pending(user).count()
    }

    /// Accept the pending request sent by `request_id` to `acting_user`.
    pub fn accept(&mut self, request_id: UserId, acting_user: UserId) -> AppResult<()> {
        self.resolve(request_id, acting_user, FriendshipStatus::Accepted)
    }

    /// Reject the pending request sent by `request_id` to `acting_user`.
    pub fn reject(&mut self, request_id: UserId, acting_user: UserId) -> AppResult<()> {
        self.resolve(request_id, acting_user, FriendshipStatus::Rejected)
    }

    /// Users joined to `user` by an accepted edge.
    #[must_use]
    pub fn list_friends(&self, user: UserId) -> BTreeSet<UserId> {
        self.edges_of(user)
            .filter(|e| e.status == FriendshipStatus::Accepted)
            .filter_map(|e| e.other_endpoint(user))
            .collect()
    }

    // The request id is matched against the sender, not the edge id; the
    // HTTP surface passes the requesting user's pid.
    fn resolve(
        &mut self,
        request_id: UserId,
        acting_user: UserId,
        status: FriendshipStatus,
    ) -> AppResult<()> {
        let id = self
            .pairs
            .get(&PairKey::new(request_id, acting_user))
            .copied()
            .ok_or_else(|| AppError::NotFound(REQUEST_NOT_FOUND.to_string()))?;

        let edge = self
            .edges
            .get_mut(&id)
            .filter(|e| {
                e.sender == request_id
                    && e.receiver == acting_user
                    && e.status == FriendshipStatus::Requested
            })
            .ok_or_else(|| AppError::NotFound(REQUEST_NOT_FOUND.to_string()))?;

        edge.status = status;
        edge.updated_at = Utc::now();
        Ok(())
    }

    fn edges_of(&self, user: UserId) -> impl Iterator<Item = &Edge> {
        self.adjacency
            .get(&user)
            .into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id))
    }

    fn received_pending(&self, user: UserId) -> impl Iterator<Item = &Edge> {
        self.edges_of(user)
            .filter(move |e| e.receiver == user && e.status == FriendshipStatus::Requested)
    }
}
