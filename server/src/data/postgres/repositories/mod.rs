//! PostgreSQL repository modules

pub mod user;
