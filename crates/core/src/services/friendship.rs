//! Friendship service.

use std::collections::HashMap;

use kinship_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::graph::{EdgeId, SELF_REQUEST, UserId};
use crate::services::coworking::CoworkingStatusService;
use crate::services::directory::{UserDirectoryService, UserProfile};
use crate::services::store::FriendshipStoreService;

/// A friend together with their coworking flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendCoworkingStatus {
    pub friend_pid: UserId,
    pub first_name: String,
    pub last_name: String,
    pub is_coworking: bool,
}

/// Friendship service for business logic.
#[derive(Clone)]
pub struct FriendshipService {
    store: FriendshipStoreService,
    directory: UserDirectoryService,
    coworking: CoworkingStatusService,
}

impl FriendshipService {
    /// Create a new friendship service.
    #[must_use]
    pub fn new(
        store: FriendshipStoreService,
        directory: UserDirectoryService,
        coworking: CoworkingStatusService,
    ) -> Self {
        Self {
            store,
            directory,
            coworking,
        }
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> AppResult<UserProfile> {
        self.directory
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Every user, ordered by pid.
    pub async fn list_all_users(&self) -> AppResult<Vec<UserProfile>> {
        self.directory.list_all().await
    }

    /// Users `user` may still send a request to.
    pub async fn eligible_users(&self, user: UserId) -> AppResult<Vec<UserProfile>> {
        let pids: Vec<UserId> = self.store.list_eligible(user).await?.into_iter().collect();
        self.directory.find_by_pids(&pids).await
    }

    /// Send a friend request.
    pub async fn send_request(&self, sender: UserId, receiver: UserId) -> AppResult<EdgeId> {
        if sender == receiver {
            return Err(AppError::Validation(SELF_REQUEST.to_string()));
        }

        let id = self.store.create_request(sender, receiver).await?;
        tracing::info!(sender, receiver, edge_id = id, "Friend request sent");
        Ok(id)
    }

    /// Senders of pending requests to `user`, oldest request first.
    pub async fn received_requests(&self, user: UserId) -> AppResult<Vec<UserProfile>> {
        let senders = self.store.list_received_requests(user).await?;
        self.profiles_in_order(&senders).await
    }

    /// Number of pending requests to `user`.
    pub async fn count_received_requests(&self, user: UserId) -> AppResult<u64> {
        self.store.count_received_requests(user).await
    }

    /// Accept the request `request_id` sent to `user`.
    pub async fn accept_request(&self, request_id: UserId, user: UserId) -> AppResult<()> {
        self.store.accept(request_id, user).await?;
        tracing::info!(sender = request_id, receiver = user, "Friend request accepted");
        Ok(())
    }

    /// Reject the request `request_id` sent to `user`.
    pub async fn reject_request(&self, request_id: UserId, user: UserId) -> AppResult<()> {
        self.store.reject(request_id, user).await?;
        tracing::info!(sender = request_id, receiver = user, "Friend request rejected");
        Ok(())
    }

    /// Friends of `user`, ordered by pid.
    pub async fn friends(&self, user: UserId) -> AppResult<Vec<UserProfile>> {
        let pids: Vec<UserId> = self.store.list_friends(user).await?.into_iter().collect();
        self.directory.find_by_pids(&pids).await
    }

    /// Friends of `user` with their coworking flag, ordered by pid.
    ///
    /// Friends the coworking source knows nothing about report `false`.
    pub async fn friends_with_status(&self, user: UserId) -> AppResult<Vec<FriendCoworkingStatus>> {
        let pids: Vec<UserId> = self
            .store
            .list_friends(user)
            .await?
            .into_iter()
            .filter(|&pid| pid != user)
            .collect();

        let flags = self.coworking.lookup(&pids).await?;
        let profiles = self.directory.find_by_pids(&pids).await?;

        Ok(profiles
            .into_iter()
            .map(|p| FriendCoworkingStatus {
                is_coworking: flags.get(&p.pid).copied().unwrap_or(false),
                friend_pid: p.pid,
                first_name: p.first_name,
                last_name: p.last_name,
            })
            .collect())
    }

    /// Set the coworking flag of `pid`.
    pub async fn update_coworking(&self, pid: UserId, is_coworking: bool) -> AppResult<()> {
        if self.directory.find_by_pid(pid).await?.is_none() {
            return Err(AppError::UserNotFound(pid));
        }

        self.coworking.update(pid, is_coworking).await?;
        tracing::debug!(pid, is_coworking, "Coworking status updated");
        Ok(())
    }

    async fn profiles_in_order(&self, pids: &[UserId]) -> AppResult<Vec<UserProfile>> {
        let mut by_pid: HashMap<UserId, UserProfile> = self
            .directory
            .find_by_pids(pids)
            .await?
            .into_iter()
            .map(|p| (p.pid, p))
            .collect();

        Ok(pids.iter().filter_map(|pid| by_pid.remove(pid)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::coworking::{CoworkingStatus, MemoryCoworkingStatus};
    use crate::services::directory::MemoryUserDirectory;
    use crate::services::store::MemoryFriendshipStore;
    use std::sync::Arc;

    const ROOT: UserId = 1;
    const USER: UserId = 2;

    struct Fixture {
        service: FriendshipService,
        coworking: MemoryCoworkingStatus,
    }

    fn profile(pid: UserId, first_name: &str) -> UserProfile {
        UserProfile {
            pid,
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            pronouns: String::new(),
        }
    }

    /// Fresh in-memory service with one user per name, pids from 1.
    async fn create_test_service(names: &[&str]) -> Fixture {
        let store = MemoryFriendshipStore::new();
        let directory = MemoryUserDirectory::new();
        let coworking = MemoryCoworkingStatus::new();

        for (pid, name) in (1..).zip(names) {
            store.register_user(pid).await;
            directory
                .insert(profile(pid, name), Some(format!("token-{pid}")))
                .await;
        }

        Fixture {
            service: FriendshipService::new(
                Arc::new(store),
                Arc::new(directory),
                Arc::new(coworking.clone()),
            ),
            coworking,
        }
    }

    fn pids(profiles: &[UserProfile]) -> Vec<UserId> {
        profiles.iter().map(|p| p.pid).collect()
    }

    #[tokio::test]
    async fn test_root_and_user_become_friends() {
        let Fixture { service, .. } = create_test_service(&["Root", "User"]).await;

        service.send_request(ROOT, USER).await.unwrap();
        assert_eq!(service.count_received_requests(USER).await.unwrap(), 1);
        assert_eq!(pids(&service.received_requests(USER).await.unwrap()), vec![ROOT]);

        service.accept_request(ROOT, USER).await.unwrap();

        assert_eq!(pids(&service.friends(USER).await.unwrap()), vec![ROOT]);
        assert_eq!(pids(&service.friends(ROOT).await.unwrap()), vec![USER]);
        assert_eq!(service.count_received_requests(USER).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_send_request_to_self() {
        let Fixture { service, .. } = create_test_service(&["Root"]).await;

        let err = service.send_request(ROOT, ROOT).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot send friend request to yourself.");
    }

    #[tokio::test]
    async fn test_duplicate_request() {
        let Fixture { service, .. } = create_test_service(&["Root", "User"]).await;
        service.send_request(ROOT, USER).await.unwrap();

        let err = service.send_request(USER, ROOT).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_eligible_users() {
        let Fixture { service, .. } =
            create_test_service(&["Root", "User", "Third", "Fourth"]).await;
        service.send_request(ROOT, USER).await.unwrap();
        service.send_request(3, ROOT).await.unwrap();
        service.reject_request(3, ROOT).await.unwrap();

        assert_eq!(pids(&service.eligible_users(ROOT).await.unwrap()), vec![4]);
        assert_eq!(pids(&service.eligible_users(4).await.unwrap()), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_received_requests_keep_request_order() {
        let Fixture { service, .. } =
            create_test_service(&["Root", "User", "Third", "Fourth"]).await;
        service.send_request(4, ROOT).await.unwrap();
        service.send_request(USER, ROOT).await.unwrap();

        assert_eq!(pids(&service.received_requests(ROOT).await.unwrap()), vec![4, 2]);
    }

    #[tokio::test]
    async fn test_accept_unknown_request() {
        let Fixture { service, .. } = create_test_service(&["Root", "User"]).await;

        let err = service.accept_request(999, USER).await.unwrap_err();
        assert!(err.to_string().contains("Friend request not found."));

        let err = service.reject_request(999, USER).await.unwrap_err();
        assert!(err.to_string().contains("Friend request not found."));
    }

    #[tokio::test]
    async fn test_friends_with_status() {
        let Fixture { service, coworking } = create_test_service(&["Root", "User"]).await;
        service.send_request(ROOT, USER).await.unwrap();
        service.accept_request(ROOT, USER).await.unwrap();
        coworking.update(ROOT, true).await.unwrap();

        let friends = service.friends_with_status(USER).await.unwrap();

        assert_eq!(
            friends,
            vec![FriendCoworkingStatus {
                friend_pid: ROOT,
                first_name: "Root".to_string(),
                last_name: "Tester".to_string(),
                is_coworking: true,
            }]
        );
    }

    #[tokio::test]
    async fn test_friends_with_status_defaults_to_not_coworking() {
        let Fixture { service, .. } = create_test_service(&["Root", "User", "Third"]).await;
        service.send_request(3, ROOT).await.unwrap();
        service.send_request(USER, ROOT).await.unwrap();
        service.accept_request(3, ROOT).await.unwrap();
        service.accept_request(USER, ROOT).await.unwrap();

        let friends = service.friends_with_status(ROOT).await.unwrap();

        let ids: Vec<_> = friends.iter().map(|f| f.friend_pid).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(friends.iter().all(|f| !f.is_coworking));
    }

    #[tokio::test]
    async fn test_update_coworking() {
        let Fixture { service, coworking } = create_test_service(&["Root"]).await;

        service.update_coworking(ROOT, true).await.unwrap();
        assert_eq!(coworking.lookup(&[ROOT]).await.unwrap().get(&ROOT), Some(&true));

        assert!(matches!(
            service.update_coworking(42, true).await,
            Err(AppError::UserNotFound(42))
        ));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let Fixture { service, .. } = create_test_service(&["Root"]).await;

        assert_eq!(service.authenticate("token-1").await.unwrap().pid, ROOT);
        assert!(matches!(
            service.authenticate("bogus").await,
            Err(AppError::Unauthorized)
        ));
        assert_eq!(service.list_all_users().await.unwrap().len(), 1);
    }
}
