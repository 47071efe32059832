//! User filter system
//!
//! Typed conditions over user columns, the textual condition grammar, and the
//! filter aggregate with its stable fingerprint. SQL generation lives in
//! [`crate::data::sql`].
//!
//! ## Usage
//!
//! ```
//! use std::collections::HashMap;
//! use userz_server::data::filters::{Op, parse_filter};
//!
//! let mut params = HashMap::new();
//! params.insert("country".to_string(), "in (US,UK)".to_string());
//!
//! let filter = parse_filter(&params).unwrap().unwrap();
//! assert_eq!(filter.country.as_ref().unwrap().op, Op::Inside);
//! assert!(filter.hash().is_ok());
//! ```

mod condition;
mod error;
mod filter;
mod op;
mod parser;

pub use condition::{
    Condition, ConditionExpr, Conditionable, Operand, Value, ValueKind, validate_op,
};
pub use error::FilterError;
pub use filter::{FieldCondition, Filter, fields, filter_hash};
pub use op::Op;
pub use parser::{parse_condition, parse_filter};
