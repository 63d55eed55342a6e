//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use kinship_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by PID.
    pub async fn find_by_pid(&self, pid: i32) -> AppResult<Option<user::Model>> {
        User::find_by_id(pid)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by PID, returning an error if not found.
    pub async fn get_by_pid(&self, pid: i32) -> AppResult<user::Model> {
        self.find_by_pid(pid)
            .await?
            .ok_or(AppError::UserNotFound(pid))
    }

    /// Find users by PIDs, ordered by PID.
    pub async fn find_by_pids(&self, pids: &[i32]) -> AppResult<Vec<user::Model>> {
        if pids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Pid.is_in(pids.to_vec()))
            .order_by_asc(user::Column::Pid)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by access token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List every user, ordered by PID.
    pub async fn find_all(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_asc(user::Column::Pid)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List every user whose PID is not in `excluded`, ordered by PID.
    pub async fn find_all_except(&self, excluded: &[i32]) -> AppResult<Vec<user::Model>> {
        let mut query = User::find().order_by_asc(user::Column::Pid);

        if !excluded.is_empty() {
            query = query.filter(user::Column::Pid.is_not_in(excluded.to_vec()));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set the coworking flag of a user. Returns whether a row was updated.
    pub async fn set_coworking(&self, pid: i32, is_coworking: bool) -> AppResult<bool> {
        let result = User::update_many()
            .col_expr(user::Column::IsCoworking, Expr::value(is_coworking))
            .filter(user::Column::Pid.eq(pid))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}
