//! Friendship storage.
//!
//! The service talks to a [`FriendshipStore`] so the same rules run against
//! the in-memory [`FriendshipGraph`] or the `friendship` table.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use kinship_common::{AppError, AppResult};
use kinship_db::{
    entities::friendship::{self, FriendshipStatus, pair_key},
    repositories::{FriendshipRepository, UserRepository},
};
use sea_orm::Set;
use tokio::sync::RwLock;

use crate::graph::{
    Edge, EdgeId, FriendshipGraph, REQUEST_EXISTS, REQUEST_NOT_FOUND, SELF_REQUEST, UserId,
};

/// Storage of friendship edges.
#[async_trait]
pub trait FriendshipStore: Send + Sync {
    /// Record a pending request from `sender` to `receiver`.
    async fn create_request(&self, sender: UserId, receiver: UserId) -> AppResult<EdgeId>;

    /// Look up an edge by id.
    async fn find_edge(&self, id: EdgeId) -> AppResult<Option<Edge>>;

    /// Users `user` has no edge with, excluding `user`.
    async fn list_eligible(&self, user: UserId) -> AppResult<BTreeSet<UserId>>;

    /// Senders of pending requests addressed to `user`, oldest first.
    async fn list_received_requests(&self, user: UserId) -> AppResult<Vec<UserId>>;

    /// Number of pending requests addressed to `user`.
    async fn count_received_requests(&self, user: UserId) -> AppResult<u64>;

    /// Accept the pending request `request_id -> acting_user`.
    async fn accept(&self, request_id: UserId, acting_user: UserId) -> AppResult<()>;

    /// Reject the pending request `request_id -> acting_user`.
    async fn reject(&self, request_id: UserId, acting_user: UserId) -> AppResult<()>;

    /// Users joined to `user` by an accepted edge.
    async fn list_friends(&self, user: UserId) -> AppResult<BTreeSet<UserId>>;
}

/// Shared friendship store.
pub type FriendshipStoreService = Arc<dyn FriendshipStore>;

/// Store backed by an in-process [`FriendshipGraph`].
#[derive(Clone, Default)]
pub struct MemoryFriendshipStore {
    graph: Arc<RwLock<FriendshipGraph>>,
}

impl MemoryFriendshipStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `user` known to the graph.
    pub async fn register_user(&self, user: UserId) -> bool {
        self.graph.write().await.register_user(user)
    }
}

#[async_trait]
impl FriendshipStore for MemoryFriendshipStore {
    async fn create_request(&self, sender: UserId, receiver: UserId) -> AppResult<EdgeId> {
        self.graph.write().await.create_request(sender, receiver)
    }

    async fn find_edge(&self, id: EdgeId) -> AppResult<Option<Edge>> {
        Ok(self.graph.read().await.find_edge(id).cloned())
    }

    async fn list_eligible(&self, user: UserId) -> AppResult<BTreeSet<UserId>> {
        Ok(self.graph.read().await.list_eligible(user))
    }

    async fn list_received_requests(&self, user: UserId) -> AppResult<Vec<UserId>> {
        Ok(self.graph.read().await.list_received_requests(user))
    }

    async fn count_received_requests(&self, user: UserId) -> AppResult<u64> {
        let count = self.graph.read().await.count_received_requests(user);
        Ok(count as u64)
    }

    async fn accept(&self, request_id: UserId, acting_user: UserId) -> AppResult<()> {
        self.graph.write().await.accept(request_id, acting_user)
    }

    async fn reject(&self, request_id: UserId, acting_user: UserId) -> AppResult<()> {
        self.graph.write().await.reject(request_id, acting_user)
    }

    async fn list_friends(&self, user: UserId) -> AppResult<BTreeSet<UserId>> {
        Ok(self.graph.read().await.list_friends(user))
    }
}

/// Store backed by the `friendship` table.
#[derive(Clone)]
pub struct DbFriendshipStore {
    friendship_repo: FriendshipRepository,
    user_repo: UserRepository,
}

impl DbFriendshipStore {
    /// Create a new database-backed store.
    #[must_use]
    pub const fn new(friendship_repo: FriendshipRepository, user_repo: UserRepository) -> Self {
        Self {
            friendship_repo,
            user_repo,
        }
    }

    async fn resolve(
        &self,
        request_id: UserId,
        acting_user: UserId,
        status: FriendshipStatus,
    ) -> AppResult<()> {
        let edge = self
            .friendship_repo
            .find_pending(request_id, acting_user)
            .await?
            .ok_or_else(|| AppError::NotFound(REQUEST_NOT_FOUND.to_string()))?;

        // A concurrent resolution may have won between the read and the update.
        if !self.friendship_repo.resolve(edge.id, status).await? {
            return Err(AppError::NotFound(REQUEST_NOT_FOUND.to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl FriendshipStore for DbFriendshipStore {
    async fn create_request(&self, sender: UserId, receiver: UserId) -> AppResult<EdgeId> {
        if sender == receiver {
            return Err(AppError::Validation(SELF_REQUEST.to_string()));
        }

        self.user_repo.get_by_pid(receiver).await?;

        if self.friendship_repo.exists_between(sender, receiver).await? {
            return Err(AppError::Conflict(REQUEST_EXISTS.to_string()));
        }

        let now = Utc::now();
        let model = friendship::ActiveModel {
            sender: Set(sender),
            receiver: Set(receiver),
            status: Set(FriendshipStatus::Requested),
            pair_key: Set(pair_key(sender, receiver)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let created = self.friendship_repo.create(model).await?;
        Ok(created.id)
    }

    async fn find_edge(&self, id: EdgeId) -> AppResult<Option<Edge>> {
        Ok(self.friendship_repo.find_by_id(id).await?.map(Edge::from))
    }

    async fn list_eligible(&self, user: UserId) -> AppResult<BTreeSet<UserId>> {
        let mut excluded: Vec<UserId> = self
            .friendship_repo
            .find_touching(user)
            .await?
            .iter()
            .filter_map(|e| e.other_endpoint(user))
            .collect();
        excluded.push(user);

        let users = self.user_repo.find_all_except(&excluded).await?;
        Ok(users.into_iter().map(|u| u.pid).collect())
    }

    async fn list_received_requests(&self, user: UserId) -> AppResult<Vec<UserId>> {
        let edges = self.friendship_repo.find_received_pending(user).await?;
        Ok(edges.into_iter().map(|e| e.sender).collect())
    }

    async fn count_received_requests(&self, user: UserId) -> AppResult<u64> {
        self.friendship_repo.count_received_pending(user).await
    }

    async fn accept(&self, request_id: UserId, acting_user: UserId) -> AppResult<()> {
        self.resolve(request_id, acting_user, FriendshipStatus::Accepted)
            .await
    }

    async fn reject(&self, request_id: UserId, acting_user: UserId) -> AppResult<()> {
        self.resolve(request_id, acting_user, FriendshipStatus::Rejected)
            .await
    }

    async fn list_friends(&self, user: UserId) -> AppResult<BTreeSet<UserId>> {
        let edges = self.friendship_repo.find_accepted_touching(user).await?;
        Ok(edges.iter().filter_map(|e| e.other_endpoint(user)).collect())
    }
}
