//! # GraphRec Client
//!
//! Client-side state and synchronization layer for the GraphRec
//! recommendation service:
//! - Session state (active identity, genre preferences, strategy label)
//! - Gateways for interactions, preferences, recommendations, metrics and the catalog
//! - Identity binder for identity input fields
//! - View state with last-response-wins semantics

pub mod api;
pub mod binder;
pub mod client;
pub mod error;
pub mod gateways;
pub mod notify;
pub mod session;
pub mod views;

pub use client::GraphRecClient;
pub use error::{ClientError, GatewayError, GatewayResult};
pub use session::SessionState;
