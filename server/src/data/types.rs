//! Shared data types across store backends

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// User types
// ============================================================================

/// A user of the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: String,
    /// Opaque credential, stored as handed over and never serialized
    #[serde(skip)]
    pub password: String,
    pub email: String,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Data needed to create or alter a user. Unset fields are left untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl UserData {
    /// Non-empty value of an optional field
    pub(crate) fn provided(field: &Option<String>) -> Option<&str> {
        field.as_deref().filter(|v| !v.is_empty())
    }

    /// Overwrite the fields of `user` this data provides; empty strings count as unset
    pub fn apply_to(&self, user: &mut User) {
        let required = [
            (&mut user.nickname, &self.nickname),
            (&mut user.password, &self.password),
            (&mut user.email, &self.email),
        ];
        for (target, value) in required {
            if let Some(value) = Self::provided(value) {
                *target = value.to_string();
            }
        }

        let optional = [
            (&mut user.first_name, &self.first_name),
            (&mut user.last_name, &self.last_name),
            (&mut user.country, &self.country),
        ];
        for (target, value) in optional {
            if let Some(value) = Self::provided(value) {
                *target = Some(value.to_string());
            }
        }
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Sortable user columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrdBy {
    FirstName,
    LastName,
    Nickname,
    Email,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl OrdBy {
    pub fn column(self) -> &'static str {
        match self {
            OrdBy::FirstName => "first_name",
            OrdBy::LastName => "last_name",
            OrdBy::Nickname => "nickname",
            OrdBy::Email => "email",
            OrdBy::CreatedAt => "created_at",
            OrdBy::UpdatedAt => "updated_at",
        }
    }
}

impl fmt::Display for OrdBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrdDir {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for OrdDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrdDir::Asc => f.write_str("ASC"),
            OrdDir::Desc => f.write_str("DESC"),
        }
    }
}

/// Result ordering, `created_at ASC` by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    pub by: OrdBy,
    pub dir: OrdDir,
}

impl Order {
    pub fn new(by: OrdBy, dir: OrdDir) -> Self {
        Self { by, dir }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.by, self.dir)
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Explicit page selection for one-shot page fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    pub size: u64,
    pub offset: u64,
    #[serde(default)]
    pub order: Order,
}

/// Global information about a paginated result set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationData {
    pub total_elements: u64,
    pub total_pages: u64,
    pub page_size: u64,
}

impl PaginationData {
    pub fn new(total_elements: u64, page_size: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_elements.div_ceil(page_size)
        };
        Self {
            total_elements,
            total_pages,
            page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(PaginationData::new(7, 3).total_pages, 3);
        assert_eq!(PaginationData::new(6, 3).total_pages, 2);
        assert_eq!(PaginationData::new(0, 3).total_pages, 0);
        assert_eq!(PaginationData::new(1, 50).total_pages, 1);
        assert_eq!(PaginationData::new(5, 0).total_pages, 0);
    }

    #[test]
    fn test_default_order() {
        let order = Order::default();
        assert_eq!(order.by, OrdBy::CreatedAt);
        assert_eq!(order.dir, OrdDir::Asc);
        assert_eq!(order.to_string(), "created_at ASC");
        assert_eq!(
            Order::new(OrdBy::Nickname, OrdDir::Desc).to_string(),
            "nickname DESC"
        );
    }

    #[test]
    fn test_user_password_not_serialized() {
        let user = User {
            id: "u1".to_string(),
            first_name: None,
            last_name: None,
            nickname: "nick".to_string(),
            password: "secret".to_string(),
            email: "nick@example.com".to_string(),
            country: Some("IT".to_string()),
            created_at: Utc::now(),
            updated_at: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"nickname\":\"nick\""));
    }

    #[test]
    fn test_user_data_deserialize_partial() {
        let data: UserData =
            serde_json::from_str(r#"{"first_name": "Jane", "password": "pw"}"#).unwrap();
        assert_eq!(data.first_name.as_deref(), Some("Jane"));
        assert_eq!(data.password.as_deref(), Some("pw"));
        assert!(data.email.is_none());
        assert_eq!(UserData::provided(&Some(String::new())), None);
    }

    #[test]
    fn test_apply_to_skips_unset_and_empty() {
        let mut user = User {
            id: "u1".to_string(),
            first_name: Some("Jane".to_string()),
            last_name: None,
            nickname: "nick".to_string(),
            password: "old".to_string(),
            email: "jane@example.com".to_string(),
            country: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        let data = UserData {
            first_name: Some(String::new()),
            last_name: Some("Doe".to_string()),
            password: Some("new".to_string()),
            ..UserData::default()
        };
        data.apply_to(&mut user);

        assert_eq!(user.first_name.as_deref(), Some("Jane"));
        assert_eq!(user.last_name.as_deref(), Some("Doe"));
        assert_eq!(user.password, "new");
        assert_eq!(user.nickname, "nick");
    }
}
