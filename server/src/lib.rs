//! User directory service: typed filters compiled to SQL, paginated listings,
//! and interchangeable PostgreSQL and in-memory stores.

pub mod app;
pub mod core;
pub mod data;
pub mod utils;
