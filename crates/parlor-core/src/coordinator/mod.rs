//! Join, pairing and relay coordination.
//!
//! A single `RwLock` guards the directory, pairing table and fault counts.
//! Deliveries always happen after the lock is released, against a recipient
//! snapshot taken while it was held.
//!
//! Lobby broadcasts are narrowed server-side to Available users; a Busy user
//! only hears about its own conversation.

mod service;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use service::Coordinator;
pub use types::{CoordinatorConfig, JoinRejection, NameRules, NotPaired, PairRejection};
