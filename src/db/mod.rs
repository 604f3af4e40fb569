//! Persistence layer for user records
//!
//! The whole user set lives in one document that is loaded before every
//! operation and rewritten in full after every mutation.

pub mod models;
pub mod store;

pub use models::{User, UserMap};
pub use store::{InsertOutcome, JsonFileStore, MemoryStore, UserStore};
