//! # GraphRec Common Library
//!
//! Shared code for the GraphRec client crates including:
//! - Identifier types (UserId, ItemId)
//! - Session event types, listener registry and EventBus
//! - Configuration loading
//! - Durable key/value storage for session state

pub mod config;
pub mod error;
pub mod events;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use types::{ItemId, UserId};
