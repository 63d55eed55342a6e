//! Friendship repository.

use std::sync::Arc;

use crate::entities::{
    Friendship,
    friendship::{self, FriendshipStatus, PAIR_KEY_INDEX, REQUEST_EXISTS, pair_key},
};
use chrono::Utc;
use kinship_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, SqlErr, sea_query::Expr,
};

/// Friendship repository for database operations.
#[derive(Clone)]
pub struct FriendshipRepository {
    db: Arc<DatabaseConnection>,
}

impl FriendshipRepository {
    /// Create a new friendship repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a friendship edge by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<friendship::Model>> {
        Friendship::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the edge between two users, in either direction.
    pub async fn find_between(&self, a: i32, b: i32) -> AppResult<Option<friendship::Model>> {
        Friendship::find()
            .filter(friendship::Column::PairKey.eq(pair_key(a, b)))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if any edge exists between two users.
    pub async fn exists_between(&self, a: i32, b: i32) -> AppResult<bool> {
        Ok(self.find_between(a, b).await?.is_some())
    }

    /// Create a new friendship edge.
    ///
    /// A second edge for the same pair fails the unique pair-key index and is
    /// reported as [`AppError::Conflict`].
    pub async fn create(&self, model: friendship::ActiveModel) -> AppResult<friendship::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_pair_key_violation(&e) {
                AppError::Conflict(REQUEST_EXISTS.to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Find the pending request sent by `sender` to `receiver`.
    pub async fn find_pending(
        &self,
        sender: i32,
        receiver: i32,
    ) -> AppResult<Option<friendship::Model>> {
        Friendship::find()
            .filter(friendship::Column::Sender.eq(sender))
            .filter(friendship::Column::Receiver.eq(receiver))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Requested))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a pending edge to `status`.
    ///
    /// Only rows still in `requested` are touched, so concurrent resolutions
    /// of the same edge update it at most once. Returns whether a row changed.
    pub async fn resolve(&self, id: i32, status: FriendshipStatus) -> AppResult<bool> {
        let result = Friendship::update_many()
            .col_expr(friendship::Column::Status, Expr::value(status))
            .col_expr(friendship::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(friendship::Column::Id.eq(id))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Requested))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Pending requests received by a user, oldest first.
    pub async fn find_received_pending(&self, receiver: i32) -> AppResult<Vec<friendship::Model>> {
        Friendship::find()
            .filter(friendship::Column::Receiver.eq(receiver))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Requested))
            .order_by_asc(friendship::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count pending requests received by a user.
    pub async fn count_received_pending(&self, receiver: i32) -> AppResult<u64> {
        Friendship::find()
            .filter(friendship::Column::Receiver.eq(receiver))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Requested))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every edge touching a user, in any status.
    pub async fn find_touching(&self, user: i32) -> AppResult<Vec<friendship::Model>> {
        Friendship::find()
            .filter(Self::touches(user))
            .order_by_asc(friendship::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Accepted edges touching a user.
    pub async fn find_accepted_touching(&self, user: i32) -> AppResult<Vec<friendship::Model>> {
        Friendship::find()
            .filter(Self::touches(user))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Accepted))
            .order_by_asc(friendship::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn touches(user: i32) -> Condition {
        Condition::any()
            .add(friendship::Column::Sender.eq(user))
            .add(friendship::Column::Receiver.eq(user))
    }
}

fn is_pair_key_violation(err: &DbErr) -> bool {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => msg.contains(PAIR_KEY_INDEX),
        // Drivers without structured codes only expose the message text.
        _ => err.to_string().contains(PAIR_KEY_INDEX),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, RuntimeErr, Set};

    fn create_test_edge(
        id: i32,
        sender: i32,
        receiver: i32,
        status: FriendshipStatus,
    ) -> friendship::Model {
        friendship::Model {
            id,
            sender,
            receiver,
            status,
            pair_key: pair_key(sender, receiver),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let edge = create_test_edge(1, 1, 2, FriendshipStatus::Requested);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge.clone()]])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        let found = repo.find_by_id(1).await.unwrap().unwrap();

        assert_eq!(found.sender, 1);
        assert_eq!(found.receiver, 2);
        assert_eq!(found.status, FriendshipStatus::Requested);
    }

    #[tokio::test]
    async fn test_exists_between_uses_pair_key() {
        let edge = create_test_edge(1, 1, 2, FriendshipStatus::Rejected);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge.clone()]])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(Arc::clone(&db));
        assert!(repo.exists_between(2, 1).await.unwrap());

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("pair_key"));
        assert!(sql.contains("1:2"));
    }

    #[tokio::test]
    async fn test_exists_between_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<friendship::Model>::new()])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        assert!(!repo.exists_between(1, 3).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_edge() {
        let edge = create_test_edge(7, 1, 2, FriendshipStatus::Requested);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge.clone()]])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        let created = repo
            .create(friendship::ActiveModel {
                sender: Set(1),
                receiver: Set(2),
                status: Set(FriendshipStatus::Requested),
                pair_key: Set(pair_key(1, 2)),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(created.id, 7);
    }

    #[tokio::test]
    async fn test_create_duplicate_pair_is_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Query(RuntimeErr::Internal(format!(
                    "duplicate key value violates unique constraint \"{PAIR_KEY_INDEX}\""
                )))])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        let err = repo
            .create(friendship::ActiveModel {
                sender: Set(2),
                receiver: Set(1),
                status: Set(FriendshipStatus::Requested),
                pair_key: Set(pair_key(2, 1)),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), REQUEST_EXISTS);
    }

    #[tokio::test]
    async fn test_create_other_failures_stay_database_errors() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                    "connection reset by peer".to_string(),
                ))])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        let err = repo
            .create(friendship::ActiveModel {
                sender: Set(1),
                receiver: Set(2),
                status: Set(FriendshipStatus::Requested),
                pair_key: Set(pair_key(1, 2)),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_resolve_reports_whether_row_changed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0, // already resolved
                    },
                ])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);

        assert!(repo.resolve(1, FriendshipStatus::Accepted).await.unwrap());
        assert!(!repo.resolve(1, FriendshipStatus::Rejected).await.unwrap());
    }

    #[tokio::test]
    async fn test_count_received_pending() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        assert_eq!(repo.count_received_pending(2).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_accepted_touching() {
        let e1 = create_test_edge(1, 1, 2, FriendshipStatus::Accepted);
        let e2 = create_test_edge(2, 3, 1, FriendshipStatus::Accepted);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[e1, e2]])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        let edges = repo.find_accepted_touching(1).await.unwrap();

        let others: Vec<_> = edges.iter().filter_map(|e| e.other_endpoint(1)).collect();
        assert_eq!(others, vec![2, 3]);
    }
}
