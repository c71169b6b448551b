//! Database layer for taskpulse
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - The `EventStore` query interface consumed by the analytics engine

pub mod repo;
pub mod schema;

pub use repo::{Database, EventStore};
