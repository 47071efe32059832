//! User repository for PostgreSQL operations

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::data::pagination::FetchedPage;
use crate::data::postgres::PostgresError;
use crate::data::postgres::schema::USER_COLUMNS;
use crate::data::types::{User, UserData};

/// Row shape of the `users` table
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: String,
    pub password: String,
    pub email: String,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// User row plus the window count returned by listing statements
#[derive(Debug, FromRow)]
pub struct PagedUserRow {
    #[sqlx(flatten)]
    pub user: UserRow,
    pub total_elements: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            nickname: row.nickname,
            password: row.password,
            email: row.email,
            country: row.country,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Create a new user with a generated CUID2 ID
pub async fn create_user(pool: &PgPool, data: &UserData) -> Result<User, PostgresError> {
    let id = cuid2::create_id();

    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (id, first_name, last_name, nickname, password, email, country) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
    ))
    .bind(&id)
    .bind(UserData::provided(&data.first_name))
    .bind(UserData::provided(&data.last_name))
    .bind(UserData::provided(&data.nickname))
    .bind(UserData::provided(&data.password))
    .bind(UserData::provided(&data.email))
    .bind(UserData::provided(&data.country))
    .fetch_one(pool)
    .await?;

    tracing::debug!(%id, "User created");
    Ok(row.into())
}

/// Merge `data` into an existing user
///
/// Read, merge and write happen in one transaction holding the row lock. Any
/// early return drops the transaction, which rolls it back.
pub async fn update_user(
    pool: &PgPool,
    id: &str,
    data: &UserData,
) -> Result<Option<User>, PostgresError> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(current) = current else {
        return Ok(None);
    };

    let mut user = User::from(current);
    data.apply_to(&mut user);

    let row = sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users SET first_name = $2, last_name = $3, nickname = $4, password = $5, \
         email = $6, country = $7, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.nickname)
    .bind(&user.password)
    .bind(&user.email)
    .bind(&user.country)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!(%id, "User updated");
    Ok(Some(row.into()))
}

/// Delete a user, returning the removed row
pub async fn delete_user(pool: &PgPool, id: &str) -> Result<Option<User>, PostgresError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    if row.is_some() {
        tracing::debug!(%id, "User deleted");
    }
    Ok(row.map(User::from))
}

/// Run a compiled listing statement at `offset`
pub async fn fetch_page(
    pool: &PgPool,
    sql: &str,
    offset: u64,
    limit: u64,
) -> Result<FetchedPage, PostgresError> {
    let offset = i64::try_from(offset)
        .map_err(|_| PostgresError::Config(format!("offset out of range: {}", offset)))?;
    let limit = i64::try_from(limit)
        .map_err(|_| PostgresError::Config(format!("page size out of range: {}", limit)))?;

    let rows = sqlx::query_as::<_, PagedUserRow>(sql)
        .bind(offset)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    // Every row carries the same window count; an empty page carries none
    let total_rows = rows
        .first()
        .map(|row| u64::try_from(row.total_elements).unwrap_or(0))
        .unwrap_or(0);

    Ok(FetchedPage {
        users: rows.into_iter().map(|row| row.user.into()).collect(),
        total_rows,
    })
}
