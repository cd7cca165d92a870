//! Per-table query functions. Each module owns the SQL for one table.

pub mod meals;
pub mod plans;
pub mod profiles;
pub mod recipes;
pub mod rules;
pub mod usage;
