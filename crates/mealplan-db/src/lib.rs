//! Persistence layer for the meal planner: domain models shared with the
//! planning core, connection configuration, migrations, and per-table query
//! functions.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
