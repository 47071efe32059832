//! Store and iterator traits
//!
//! `UserStore` is the boundary outer layers (HTTP, RPC, CLI) call into. Each
//! backend (PostgreSQL, in-memory) implements it with its own specific logic.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::data::error::DataError;
use crate::data::filters::Filter;
use crate::data::types::{PageParams, PaginationData, User, UserData};

/// Cursor over successive pages of a filtered, ordered user listing
#[async_trait]
pub trait PageIterator: Send + Sync {
    /// Pagination summary from the most recently observed total
    ///
    /// `None` until a page has been fetched, since the total is only reported
    /// alongside page rows.
    async fn pagination(&self) -> Option<PaginationData>;

    /// Fetch the next page
    ///
    /// Returns `Ok(None)` once the listing is exhausted, and keeps doing so.
    /// On error the cursor does not move, so the call can be retried.
    async fn next(&self, cancel: &CancellationToken) -> Result<Option<Vec<User>>, DataError>;
}

/// Storage backend for users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Create a user. `nickname`, `email` and `password` are required.
    async fn add(&self, cancel: &CancellationToken, data: &UserData) -> Result<User, DataError>;

    /// Merge the provided fields into an existing user; `None` if the id is unknown
    async fn update(
        &self,
        cancel: &CancellationToken,
        id: &str,
        data: &UserData,
    ) -> Result<Option<User>, DataError>;

    /// Delete a user, returning it; `None` if the id is unknown
    async fn remove(&self, cancel: &CancellationToken, id: &str)
    -> Result<Option<User>, DataError>;

    /// Iterate over all users matching `filter`, `page_size` at a time, by creation time
    async fn list(
        &self,
        filter: Option<&Filter>,
        page_size: u64,
    ) -> Result<Box<dyn PageIterator>, DataError>;

    /// Fetch exactly one page at an explicit offset
    async fn page(
        &self,
        cancel: &CancellationToken,
        filter: Option<&Filter>,
        params: &PageParams,
    ) -> Result<Vec<User>, DataError>;
}

/// Reject page sizes no backend can serve
pub(crate) fn check_page_size(page_size: u64) -> Result<(), DataError> {
    if page_size == 0 {
        return Err(DataError::invalid_argument("page size must be positive"));
    }
    Ok(())
}

/// Required fields for a new user
pub(crate) fn check_new_user(data: &UserData) -> Result<(), DataError> {
    let missing: Vec<&str> = [
        ("nickname", &data.nickname),
        ("email", &data.email),
        ("password", &data.password),
    ]
    .into_iter()
    .filter(|(_, value)| UserData::provided(value).is_none())
    .map(|(name, _)| name)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DataError::invalid_argument(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}
