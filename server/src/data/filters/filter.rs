//! User filter aggregate

use chrono::{DateTime, Utc};

use super::condition::Condition;
use super::error::FilterError;
use crate::utils::hash::sha256_hex;

/// Filterable user columns, in compilation order
pub mod fields {
    pub const ID: &str = "id";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const NICKNAME: &str = "nickname";
    pub const EMAIL: &str = "email";
    pub const COUNTRY: &str = "country";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";

    /// Keys accepted by [`super::super::parse_filter`]
    pub const FILTERABLE: &[&str] = &[
        FIRST_NAME, LAST_NAME, NICKNAME, EMAIL, COUNTRY, CREATED_AT, UPDATED_AT,
    ];
}

/// Conditions on user attributes. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub id: Option<String>,
    pub first_name: Option<Condition<String>>,
    pub last_name: Option<Condition<String>>,
    pub nickname: Option<Condition<String>>,
    pub email: Option<Condition<String>>,
    pub country: Option<Condition<String>>,
    pub created_at: Option<Condition<DateTime<Utc>>>,
    pub updated_at: Option<Condition<DateTime<Utc>>>,
}

/// A filter field, borrowed with its column name
pub enum FieldCondition<'a> {
    Text(&'static str, &'a Condition<String>),
    Time(&'static str, &'a Condition<DateTime<Utc>>),
}

impl FieldCondition<'_> {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Text(field, _) | Self::Time(field, _) => field,
        }
    }

    pub fn hash(&self) -> Result<String, FilterError> {
        match self {
            Self::Text(field, cond) => cond.hash(field),
            Self::Time(field, cond) => cond.hash(field),
        }
    }
}

impl Filter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Present conditions, in column order
    pub fn conditions(&self) -> Vec<FieldCondition<'_>> {
        let text = [
            (fields::FIRST_NAME, &self.first_name),
            (fields::LAST_NAME, &self.last_name),
            (fields::NICKNAME, &self.nickname),
            (fields::EMAIL, &self.email),
            (fields::COUNTRY, &self.country),
        ];
        let time = [
            (fields::CREATED_AT, &self.created_at),
            (fields::UPDATED_AT, &self.updated_at),
        ];

        text.into_iter()
            .filter_map(|(field, cond)| cond.as_ref().map(|c| FieldCondition::Text(field, c)))
            .chain(
                time.into_iter().filter_map(|(field, cond)| {
                    cond.as_ref().map(|c| FieldCondition::Time(field, c))
                }),
            )
            .collect()
    }

    /// True when neither an id nor any condition is set
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.conditions().is_empty()
    }

    /// Deterministic identifier of the filter shape and values
    ///
    /// Every condition is validated on the way, so an invalid filter has no hash.
    pub fn hash(&self) -> Result<String, FilterError> {
        let mut repr = String::new();

        if let Some(id) = &self.id {
            repr.push_str(&format!("{}={:?};", fields::ID, id));
        }

        for cond in self.conditions() {
            let hash = cond.hash().map_err(|e| e.on_field(cond.field()))?;
            repr.push_str(&format!("{}={};", cond.field(), hash));
        }

        Ok(sha256_hex(repr.as_bytes()))
    }
}

/// Hash of an optional filter; no filter hashes like an empty one
pub fn filter_hash(filter: Option<&Filter>) -> Result<String, FilterError> {
    match filter {
        Some(filter) => filter.hash(),
        None => Filter::default().hash(),
    }
}
