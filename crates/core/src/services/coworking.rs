//! Coworking presence.
//!
//! The flag belongs to the coworking subsystem; friendships only read it
//! for the friends overview and forward updates.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use kinship_common::{AppError, AppResult};
use kinship_db::repositories::UserRepository;
use tokio::sync::RwLock;

use crate::graph::UserId;

/// Coworking flag lookup and update.
#[async_trait]
pub trait CoworkingStatus: Send + Sync {
    /// Flags for `pids`. Users without a recorded flag are absent.
    async fn lookup(&self, pids: &[UserId]) -> AppResult<HashMap<UserId, bool>>;

    /// Record the flag for `pid`.
    async fn update(&self, pid: UserId, is_coworking: bool) -> AppResult<()>;
}

/// Shared coworking status source.
pub type CoworkingStatusService = Arc<dyn CoworkingStatus>;

/// In-process coworking flags.
#[derive(Clone, Default)]
pub struct MemoryCoworkingStatus {
    flags: Arc<RwLock<HashMap<UserId, bool>>>,
}

impl MemoryCoworkingStatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CoworkingStatus for MemoryCoworkingStatus {
    async fn lookup(&self, pids: &[UserId]) -> AppResult<HashMap<UserId, bool>> {
        let flags = self.flags.read().await;
        Ok(pids
            .iter()
            .filter_map(|pid| flags.get(pid).map(|&flag| (*pid, flag)))
            .collect())
    }

    async fn update(&self, pid: UserId, is_coworking: bool) -> AppResult<()> {
        self.flags.write().await.insert(pid, is_coworking);
        Ok(())
    }
}

/// Coworking flags stored on the `user` row.
#[derive(Clone)]
pub struct DbCoworkingStatus {
    user_repo: UserRepository,
}

impl DbCoworkingStatus {
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl CoworkingStatus for DbCoworkingStatus {
    async fn lookup(&self, pids: &[UserId]) -> AppResult<HashMap<UserId, bool>> {
        let users = self.user_repo.find_by_pids(pids).await?;
        Ok(users.into_iter().map(|u| (u.pid, u.is_coworking)).collect())
    }

    async fn update(&self, pid: UserId, is_coworking: bool) -> AppResult<()> {
        if !self.user_repo.set_coworking(pid, is_coworking).await? {
            return Err(AppError::UserNotFound(pid));
        }
        Ok(())
    }
}
