//! Utility functions for the application

pub mod hash;
pub mod retry;
pub mod sql;
