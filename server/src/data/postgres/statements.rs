//! Named listing statements
//!
//! A listing statement is identified by the filter hash and the ordering, so
//! identical filters always map to the same SQL text. The text is compiled
//! once per process and kept here; sqlx then reuses the server-side prepared
//! statement per connection because the text is byte-identical.
//!
//! Each entry remembers the filter it was compiled from. A different filter
//! landing on the same name is compiled fresh and never served the cached text.

use std::sync::Arc;

use dashmap::DashMap;

use super::schema::USER_COLUMNS;
use crate::data::filters::{Filter, FilterError, filter_hash};
use crate::data::sql::SqlDialect;
use crate::data::types::Order;

/// A compiled user listing, parameterized by `$1` offset and `$2` limit
#[derive(Debug, Clone)]
pub struct ListStatement {
    pub name: Arc<str>,
    pub sql: Arc<str>,
}

/// Statement name: filter hash plus ordering
pub fn statement_name(hash: &str, order: Order) -> String {
    format!(
        "list_users_{}_{}_{}",
        hash,
        order.by,
        order.dir.to_string().to_lowercase()
    )
}

/// Render the listing SQL for a compiled predicate
pub fn render_list_sql(name: &str, predicate: &str, order_by: &str) -> String {
    format!(
        "-- name: {name}\n\
         SELECT {USER_COLUMNS}, count(*) OVER() AS total_elements \
         FROM users WHERE {predicate} ORDER BY {order_by} OFFSET $1 LIMIT $2"
    )
}

struct CachedStatement {
    filter: Filter,
    sql: Arc<str>,
}

/// Process-wide cache of compiled listing statements keyed by name
#[derive(Default)]
pub struct StatementCache {
    statements: DashMap<String, CachedStatement>,
}

impl StatementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Validate `filter` and return its listing statement, compiling on first use
    pub fn get_or_compile(
        &self,
        dialect: &dyn SqlDialect,
        filter: Option<&Filter>,
        order: Order,
    ) -> Result<ListStatement, FilterError> {
        let hash = filter_hash(filter)?;
        let name = statement_name(&hash, order);
        let key = filter.cloned().unwrap_or_default();

        if let Some(cached) = self.statements.get(&name)
            && cached.filter == key
        {
            tracing::trace!(statement = %name, "Statement cache hit");
            return Ok(ListStatement {
                name: name.as_str().into(),
                sql: cached.sql.clone(),
            });
        }

        let predicate = dialect.compile_filter(filter)?;
        let sql: Arc<str> = render_list_sql(&name, &predicate, &dialect.order_by(order)).into();
        tracing::debug!(
            statement = %name,
            dialect = dialect.name(),
            predicate = %predicate,
            "Compiled listing statement"
        );

        let cached = self
            .statements
            .entry(name.clone())
            .or_insert_with(|| CachedStatement {
                filter: key.clone(),
                sql: sql.clone(),
            });
        let sql = if cached.filter == key {
            cached.sql.clone()
        } else {
            tracing::warn!(statement = %name, "Statement name collision, not caching");
            sql
        };
        drop(cached);

        Ok(ListStatement {
            name: name.into(),
            sql,
        })
    }
}
