//! Friendship entity (directed friend-request edges between users).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of a friend-request edge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    /// Sent, waiting for the receiver.
    #[sea_orm(string_value = "requested")]
    Requested,
    /// Accepted by the receiver; the pair are friends.
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Rejected by the receiver.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "friendship")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// The user who sent the friend request
    pub sender: i32,

    /// The user who received the friend request
    pub receiver: i32,

    pub status: FriendshipStatus,

    /// Canonical unordered pair, see [`pair_key`]
    #[sea_orm(unique)]
    pub pair_key: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Sender",
        to = "super::user::Column::Pid",
        on_delete = "Cascade"
    )]
    Sender,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Receiver",
        to = "super::user::Column::Pid",
        on_delete = "Cascade"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The endpoint of this edge that is not `user`; see [`other_endpoint`].
    #[must_use]
    pub const fn other_endpoint(&self, user: i32) -> Option<i32> {
        other_endpoint(self.sender, self.receiver, user)
    }
}

/// Name of the unique index over [`Column::PairKey`].
pub const PAIR_KEY_INDEX: &str = "idx_friendship_pair_key";

/// Message reported when a pair already has an edge.
pub const REQUEST_EXISTS: &str = "A friend request already exists between these users.";

/// The endpoint of `sender -> receiver` that is not `user`.
///
/// Returns `None` when `user` is not an endpoint, or for a degenerate
/// edge whose endpoints are both `user`.
#[must_use]
pub const fn other_endpoint(sender: i32, receiver: i32, user: i32) -> Option<i32> {
    if sender == receiver {
        None
    } else if sender == user {
        Some(receiver)
    } else if receiver == user {
        Some(sender)
    } else {
        None
    }
}

/// Canonical key for the unordered pair `{a, b}`.
///
/// Both directions of a pair produce the same key, so a unique index on it
/// allows at most one edge per pair.
#[must_use]
pub fn pair_key(a: i32, b: i32) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{low}:{high}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn edge(sender: i32, receiver: i32) -> Model {
        Model {
            id: 1,
            sender,
            receiver,
            status: FriendshipStatus::Accepted,
            pair_key: pair_key(sender, receiver),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_pair_key_is_direction_independent() {
        assert_eq!(pair_key(1, 2), "1:2");
        assert_eq!(pair_key(2, 1), "1:2");
        assert_eq!(pair_key(-5, 3), "-5:3");
    }

    #[test]
    fn test_other_endpoint() {
        let e = edge(1, 2);
        assert_eq!(e.other_endpoint(1), Some(2));
        assert_eq!(e.other_endpoint(2), Some(1));
        assert_eq!(e.other_endpoint(3), None);
        assert_eq!(edge(4, 4).other_endpoint(4), None);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&FriendshipStatus::Requested).unwrap_or_default();
        assert_eq!(json, "\"requested\"");
    }
}
