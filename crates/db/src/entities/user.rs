//! User entity.
//!
//! Users are issued by the external user directory; this table mirrors the
//! columns the friendship feature reads.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    /// Externally issued person identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub pid: i32,

    pub first_name: String,

    pub last_name: String,

    pub email: String,

    pub pronouns: String,

    /// Access token
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Owned by the coworking subsystem; read and written only through
    /// the coworking status seam.
    #[sea_orm(default_value = false)]
    pub is_coworking: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
