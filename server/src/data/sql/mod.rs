//! SQL abstraction layer
//!
//! Filters are compiled to SQL predicates through the [`SqlDialect`] trait so
//! a different backend only needs its own rendering table.

mod dialect;
mod postgres_dialect;

pub use dialect::{SqlDialect, TAUTOLOGY};
pub use postgres_dialect::PostgresDialect;
