//! Database entities.

#![allow(missing_docs)]

pub mod friendship;
pub mod user;

pub use friendship::Entity as Friendship;
pub use user::Entity as User;
