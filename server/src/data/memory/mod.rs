//! In-memory user store
//!
//! Keeps users in a lock-guarded map. Filters are evaluated directly with
//! the same semantics as the SQL predicates, so the store can stand in for
//! PostgreSQL in tests and local runs.

mod matcher;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::data::cancel::cancellable;
use crate::data::error::DataError;
use crate::data::filters::{Filter, filter_hash};
use crate::data::pagination::{FetchedPage, PageSource, Paginator};
use crate::data::traits::{PageIterator, UserStore, check_new_user, check_page_size};
use crate::data::types::{Order, PageParams, User, UserData};

use matcher::{compare_users, filter_matches};

type UserMap = Arc<RwLock<HashMap<String, User>>>;

/// Store keeping every user in process memory
#[derive(Default, Clone)]
pub struct MemoryStore {
    users: UserMap,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

/// Matching users in `order`, with the total count before slicing
fn select(
    users: &UserMap,
    filter: Option<&Filter>,
    order: Order,
    offset: u64,
    size: u64,
) -> Result<FetchedPage, DataError> {
    let mut matching = Vec::new();
    for user in users.read().values() {
        if filter_matches(filter, user)? {
            matching.push(user.clone());
        }
    }
    matching.sort_by(|a, b| compare_users(order, a, b));

    let total_rows = matching.len() as u64;
    let users: Vec<User> = matching
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(size).unwrap_or(usize::MAX))
        .collect();

    Ok(FetchedPage {
        // Rows past the end carry no total, same as an empty SQL result
        total_rows: if users.is_empty() { 0 } else { total_rows },
        users,
    })
}

/// Page source over the live map; every fetch re-reads it
struct MemoryPageSource {
    users: UserMap,
    filter: Option<Filter>,
    order: Order,
    page_size: u64,
}

#[async_trait]
impl PageSource for MemoryPageSource {
    fn page_size(&self) -> u64 {
        self.page_size
    }

    async fn fetch(
        &self,
        offset: u64,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, DataError> {
        cancellable(cancel, async {
            select(
                &self.users,
                self.filter.as_ref(),
                self.order,
                offset,
                self.page_size,
            )
        })
        .await
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn add(&self, cancel: &CancellationToken, data: &UserData) -> Result<User, DataError> {
        check_new_user(data)?;
        cancellable(cancel, async {
            let mut user = User {
                id: cuid2::create_id(),
                first_name: None,
                last_name: None,
                nickname: String::new(),
                password: String::new(),
                email: String::new(),
                country: None,
                created_at: Utc::now(),
                updated_at: None,
            };
            data.apply_to(&mut user);

            self.users.write().insert(user.id.clone(), user.clone());
            tracing::debug!(id = %user.id, "User added");
            Ok(user)
        })
        .await
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        id: &str,
        data: &UserData,
    ) -> Result<Option<User>, DataError> {
        cancellable(cancel, async {
            let mut users = self.users.write();
            let Some(user) = users.get_mut(id) else {
                return Ok(None);
            };
            data.apply_to(user);
            user.updated_at = Some(Utc::now());
            tracing::debug!(id, "User updated");
            Ok(Some(user.clone()))
        })
        .await
    }

    async fn remove(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> Result<Option<User>, DataError> {
        cancellable(cancel, async {
            let removed = self.users.write().remove(id);
            if removed.is_some() {
                tracing::debug!(id, "User removed");
            }
            Ok(removed)
        })
        .await
    }

    async fn list(
        &self,
        filter: Option<&Filter>,
        page_size: u64,
    ) -> Result<Box<dyn PageIterator>, DataError> {
        check_page_size(page_size)?;
        // Validates every condition up front
        let hash = filter_hash(filter)?;
        tracing::debug!(filter = %hash, page_size, "Listing users");

        Ok(Box::new(Paginator::new(MemoryPageSource {
            users: self.users.clone(),
            filter: filter.cloned(),
            order: Order::default(),
            page_size,
        })))
    }

    async fn page(
        &self,
        cancel: &CancellationToken,
        filter: Option<&Filter>,
        params: &PageParams,
    ) -> Result<Vec<User>, DataError> {
        check_page_size(params.size)?;
        cancellable(cancel, async {
            let page = select(&self.users, filter, params.order, params.offset, params.size)?;
            Ok(page.users)
        })
        .await
    }
}
