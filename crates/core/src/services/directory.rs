//! User directory.
//!
//! Profiles are owned elsewhere; the friendship service only reads them.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use kinship_common::AppResult;
use kinship_db::{entities::user, repositories::UserRepository};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::graph::UserId;

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub pid: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pronouns: String,
}

impl From<user::Model> for UserProfile {
    fn from(u: user::Model) -> Self {
        Self {
            pid: u.pid,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            pronouns: u.pronouns,
        }
    }
}

/// Read access to user profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Every user, ordered by pid.
    async fn list_all(&self) -> AppResult<Vec<UserProfile>>;

    /// Profiles for `pids`, ordered by pid. Unknown pids are skipped.
    async fn find_by_pids(&self, pids: &[UserId]) -> AppResult<Vec<UserProfile>>;

    async fn find_by_pid(&self, pid: UserId) -> AppResult<Option<UserProfile>>;

    /// Resolve a bearer token to its user.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<UserProfile>>;
}

/// Shared user directory.
pub type UserDirectoryService = Arc<dyn UserDirectory>;

#[derive(Debug, Clone)]
struct DirectoryEntry {
    profile: UserProfile,
    token: Option<String>,
}

/// In-process user directory.
#[derive(Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<RwLock<BTreeMap<UserId, DirectoryEntry>>>,
}

impl MemoryUserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    pub async fn insert(&self, profile: UserProfile, token: Option<String>) {
        self.users
            .write()
            .await
            .insert(profile.pid, DirectoryEntry { profile, token });
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn list_all(&self) -> AppResult<Vec<UserProfile>> {
        let users = self.users.read().await;
        Ok(users.values().map(|e| e.profile.clone()).collect())
    }

    async fn find_by_pids(&self, pids: &[UserId]) -> AppResult<Vec<UserProfile>> {
        let users = self.users.read().await;
        let mut found: Vec<UserProfile> = pids
            .iter()
            .filter_map(|pid| users.get(pid))
            .map(|e| e.profile.clone())
            .collect();
        found.sort_by_key(|p| p.pid);
        found.dedup_by_key(|p| p.pid);
        Ok(found)
    }

    async fn find_by_pid(&self, pid: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.users.read().await.get(&pid).map(|e| e.profile.clone()))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<UserProfile>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|e| e.token.as_deref() == Some(token))
            .map(|e| e.profile.clone()))
    }
}

/// User directory backed by the `user` table.
#[derive(Clone)]
pub struct DbUserDirectory {
    user_repo: UserRepository,
}

impl DbUserDirectory {
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl UserDirectory for DbUserDirectory {
    async fn list_all(&self) -> AppResult<Vec<UserProfile>> {
        let users = self.user_repo.find_all().await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    async fn find_by_pids(&self, pids: &[UserId]) -> AppResult<Vec<UserProfile>> {
        let users = self.user_repo.find_by_pids(pids).await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    async fn find_by_pid(&self, pid: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.user_repo.find_by_pid(pid).await?.map(UserProfile::from))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<UserProfile>> {
        Ok(self
            .user_repo
            .find_by_token(token)
            .await?
            .map(UserProfile::from))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(pid: UserId, first_name: &str) -> UserProfile {
        UserProfile {
            pid,
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            pronouns: String::new(),
        }
    }

    #[tokio::test]
    async fn test_memory_directory_lookup() {
        let directory = MemoryUserDirectory::new();
        directory.insert(profile(3, "Third"), None).await;
        directory
            .insert(profile(1, "Root"), Some("root-token".to_string()))
            .await;

        let pids: Vec<_> = directory
            .find_by_pids(&[3, 1, 3, 42])
            .await
            .unwrap()
            .iter()
            .map(|p| p.pid)
            .collect();
        assert_eq!(pids, vec![1, 3]);

        let root = directory.find_by_token("root-token").await.unwrap();
        assert_eq!(root.map(|p| p.pid), Some(1));
        assert!(directory.find_by_token("nope").await.unwrap().is_none());
        assert_eq!(directory.list_all().await.unwrap().len(), 2);
    }
}
