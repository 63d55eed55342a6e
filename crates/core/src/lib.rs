//! Core business logic for kinship.
//!
//! [`graph`] holds the storage-independent relationship engine; [`services`]
//! wires it, or the database, behind the seams the HTTP layer talks to.

pub mod graph;
pub mod services;

pub use graph::{Edge, EdgeId, FriendshipGraph, PairKey, UserId};
pub use services::*;
