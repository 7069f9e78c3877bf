//! Circulation engine for physical library assets.
//!
//! Tracks an asset through Available, CheckedOut, OnHold and Lost while keeping
//! the active checkout, the checkout history log and the hold queue consistent
//! with its status. Every mutating operation runs as one unit of work against a
//! [`core::repository::PersistenceGateway`]; the gateway is expected to serialize
//! units of work per asset id (the bundled [`utils::memory::MemoryStore`] holds a
//! per-asset lock for the lifetime of each unit of work).

pub mod core;
pub mod utils;
pub mod assets;
pub mod patrons;
pub mod checkout;
pub mod hold;
pub mod circulation;
pub mod gateway;
