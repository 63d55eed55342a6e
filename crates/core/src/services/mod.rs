//! Business logic services.

#![allow(missing_docs)]

pub mod coworking;
pub mod directory;
pub mod friendship;
pub mod store;

pub use coworking::{
    CoworkingStatus, CoworkingStatusService, DbCoworkingStatus, MemoryCoworkingStatus,
};
pub use directory::{
    DbUserDirectory, MemoryUserDirectory, UserDirectory, UserDirectoryService, UserProfile,
};
pub use friendship::{FriendCoworkingStatus, FriendshipService};
pub use store::{DbFriendshipStore, FriendshipStore, FriendshipStoreService, MemoryFriendshipStore};
