//! `UserStore` implementation over PostgreSQL

use async_trait::async_trait;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use super::repositories::user;
use super::statements::{ListStatement, StatementCache};
use crate::data::cancel::cancellable;
use crate::data::error::DataError;
use crate::data::filters::Filter;
use crate::data::pagination::{FetchedPage, PageSource, Paginator};
use crate::data::sql::PostgresDialect;
use crate::data::traits::{PageIterator, UserStore, check_new_user, check_page_size};
use crate::data::types::{Order, PageParams, User, UserData};

/// PostgreSQL-backed user store
pub struct PostgresStore {
    pool: PgPool,
    statements: StatementCache,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statements: StatementCache::new(),
        }
    }

    fn statement(&self, filter: Option<&Filter>, order: Order) -> Result<ListStatement, DataError> {
        Ok(self
            .statements
            .get_or_compile(&PostgresDialect, filter, order)?)
    }
}

/// One listing statement bound to a pool and page size
struct PgPageSource {
    pool: PgPool,
    statement: ListStatement,
    page_size: u64,
}

#[async_trait]
impl PageSource for PgPageSource {
    fn page_size(&self) -> u64 {
        self.page_size
    }

    async fn fetch(
        &self,
        offset: u64,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, DataError> {
        tracing::trace!(statement = %self.statement.name, offset, "Fetching page");
        cancellable(cancel, async {
            Ok(user::fetch_page(&self.pool, &self.statement.sql, offset, self.page_size).await?)
        })
        .await
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn add(&self, cancel: &CancellationToken, data: &UserData) -> Result<User, DataError> {
        check_new_user(data)?;
        cancellable(cancel, async {
            Ok(user::create_user(&self.pool, data).await?)
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
            Ok(user::update_user(&self.pool, id, data).await?)
        })
        .await
    }

    async fn remove(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> Result<Option<User>, DataError> {
        cancellable(cancel, async { Ok(user::delete_user(&self.pool, id).await?) }).await
    }

    async fn list(
        &self,
        filter: Option<&Filter>,
        page_size: u64,
    ) -> Result<Box<dyn PageIterator>, DataError> {
        check_page_size(page_size)?;
        let statement = self.statement(filter, Order::default())?;
        tracing::debug!(statement = %statement.name, page_size, "Listing users");

        Ok(Box::new(Paginator::new(PgPageSource {
            pool: self.pool.clone(),
            statement,
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
        let statement = self.statement(filter, params.order)?;
        cancellable(cancel, async {
            let page =
                user::fetch_page(&self.pool, &statement.sql, params.offset, params.size).await?;
            Ok(page.users)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PostgresConfig;
    use crate::core::constants::ENV_TEST_DATABASE_URL;
    use crate::data::filters::{Condition, Op};
    use crate::data::postgres::PostgresService;
    use crate::data::types::{OrdBy, OrdDir};

    /// Connect to the test database, or `None` when it is not configured
    async fn test_store() -> Option<PostgresStore> {
        let url = std::env::var(ENV_TEST_DATABASE_URL).ok()?;
        let config = PostgresConfig {
            url,
            ..PostgresConfig::default()
        };
        let service = PostgresService::init(&config).await.unwrap();
        Some(PostgresStore::new(service.pool().clone()))
    }

    fn data(nickname: &str, country: &str) -> UserData {
        UserData {
            nickname: Some(nickname.to_string()),
            password: Some("pw".to_string()),
            email: Some(format!("{nickname}@example.com")),
            country: Some(country.to_string()),
            ..UserData::default()
        }
    }

    /// Tag unique to one test run so concurrent runs do not see each other's rows
    fn run_tag() -> String {
        cuid2::create_id()
    }

    #[tokio::test]
    async fn test_crud_round_trip() {
        let Some(store) = test_store().await else {
            return;
        };
        let token = CancellationToken::new();
        let tag = run_tag();

        let user = store.add(&token, &data(&tag, "IT")).await.unwrap();
        assert_eq!(user.nickname, tag);
        assert!(user.updated_at.is_none());

        let change = UserData {
            first_name: Some("Jane".to_string()),
            ..UserData::default()
        };
        let updated = store.update(&token, &user.id, &change).await.unwrap().unwrap();
        assert_eq!(updated.first_name.as_deref(), Some("Jane"));
        assert_eq!(updated.country.as_deref(), Some("IT"));
        assert!(updated.updated_at.is_some());

        assert!(store.update(&token, "missing", &change).await.unwrap().is_none());

        let removed = store.remove(&token, &user.id).await.unwrap().unwrap();
        assert_eq!(removed.id, user.id);
        assert!(store.remove(&token, &user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_pages_filtered_rows() {
        let Some(store) = test_store().await else {
            return;
        };
        let token = CancellationToken::new();
        let tag = run_tag();

        for i in 0..7 {
            store
                .add(&token, &data(&format!("{tag}-{i}"), "IT"))
                .await
                .unwrap();
        }

        let filter = Filter {
            nickname: Some(Condition::new(Op::Begins, format!("{tag}-"))),
            ..Filter::default()
        };
        let it = store.list(Some(&filter), 3).await.unwrap();
        let mut sizes = Vec::new();
        let mut ids = Vec::new();
        while let Some(page) = it.next(&token).await.unwrap() {
            sizes.push(page.len());
            ids.extend(page.into_iter().map(|u| u.id));
        }
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(it.pagination().await.unwrap().total_elements, 7);

        let params = PageParams {
            size: 2,
            offset: 0,
            order: Order::new(OrdBy::Nickname, OrdDir::Desc),
        };
        let page = store.page(&token, Some(&filter), &params).await.unwrap();
        assert_eq!(page[0].nickname, format!("{tag}-6"));
        assert_eq!(page[1].nickname, format!("{tag}-5"));

        for id in ids {
            store.remove(&token, &id).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_cancelled_add_fails() {
        let Some(store) = test_store().await else {
            return;
        };
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(
            store.add(&token, &data(&run_tag(), "IT")).await,
            Err(DataError::Cancelled)
        ));
    }
}
