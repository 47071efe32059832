//! SQL dialect trait for filter compilation
//!
//! A dialect turns validated, type-erased conditions into boolean SQL
//! fragments. The textual `Condition::evaluate` rendering used for hashing is
//! deliberately separate from this.

use crate::data::filters::{ConditionExpr, FieldCondition, Filter, FilterError, fields};
use crate::data::types::Order;

/// Predicate used when a filter constrains nothing
pub const TAUTOLOGY: &str = "1 = 1";

/// SQL dialect trait for generating database-specific predicates
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Render a single validated condition on `field`
    fn compile_condition(&self, field: &str, expr: &ConditionExpr) -> Result<String, FilterError>;

    /// Render the exact id match injected ahead of the field conditions
    fn compile_id(&self, id: &str) -> String;

    /// Generate the ORDER BY clause body, with id as a stable tie-breaker
    fn order_by(&self, order: Order) -> String {
        format!("{} {}, {}", order.by.column(), order.dir, fields::ID)
    }

    /// Compile a whole filter into an `AND`-joined predicate
    ///
    /// Validation errors are returned as produced by the condition, so the
    /// message matches the one seen when parsing.
    fn compile_filter(&self, filter: Option<&Filter>) -> Result<String, FilterError> {
        let Some(filter) = filter else {
            return Ok(TAUTOLOGY.to_string());
        };

        let mut parts = Vec::new();
        if let Some(id) = &filter.id {
            parts.push(self.compile_id(id));
        }

        for cond in filter.conditions() {
            let expr = match &cond {
                FieldCondition::Text(_, c) => c.expr()?,
                FieldCondition::Time(_, c) => c.expr()?,
            };
            parts.push(self.compile_condition(cond.field(), &expr)?);
        }

        if parts.is_empty() {
            Ok(TAUTOLOGY.to_string())
        } else {
            Ok(parts.join(" AND "))
        }
    }
}
