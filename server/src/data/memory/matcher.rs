//! Direct evaluation of filters against users
//!
//! Mirrors the SQL semantics of the Postgres dialect: a missing optional
//! column never matches, whatever the operator. Timestamp bounds are
//! truncated to whole seconds, as the dialect renders them.

use std::cmp::Ordering;

use chrono::{DateTime, SubsecRound, Utc};

use crate::data::filters::{Condition, Conditionable, Filter, FilterError, Op};
use crate::data::types::{OrdBy, OrdDir, Order, User};

/// Whether `actual` satisfies a validated `cond`
pub fn condition_matches<T: Conditionable>(
    cond: &Condition<T>,
    actual: Option<&T>,
) -> Result<bool, FilterError> {
    cond.validate()?;
    let Some(v) = actual else {
        return Ok(false);
    };

    let interval = T::KIND.uses_intervals();
    Ok(match cond.op {
        Op::Eq => *v == cond.value,
        Op::Ne => *v != cond.value,
        Op::Gt => *v > cond.value,
        Op::Ge => *v >= cond.value,
        Op::Lt => *v < cond.value,
        Op::Le => *v <= cond.value,
        Op::Inside if interval => *v >= cond.values[0] && *v <= cond.values[1],
        Op::Outside if interval => *v <= cond.values[0] || *v >= cond.values[1],
        Op::Inside => cond.values.contains(v),
        Op::Outside => !cond.values.contains(v),
        Op::Begins => affix(v, &cond.value, |s, p| s.starts_with(p)),
        Op::Ends => affix(v, &cond.value, |s, p| s.ends_with(p)),
    })
}

fn affix<T: Conditionable>(v: &T, pattern: &T, f: impl Fn(&str, &str) -> bool) -> bool {
    v.as_text()
        .zip(pattern.as_text())
        .is_some_and(|(s, p)| f(s, p))
}

/// Whether `user` satisfies every constraint of `filter`
pub fn filter_matches(filter: Option<&Filter>, user: &User) -> Result<bool, FilterError> {
    let Some(filter) = filter else {
        return Ok(true);
    };

    if let Some(id) = &filter.id
        && *id != user.id
    {
        return Ok(false);
    }

    let text = [
        (&filter.first_name, user.first_name.as_ref()),
        (&filter.last_name, user.last_name.as_ref()),
        (&filter.nickname, Some(&user.nickname)),
        (&filter.email, Some(&user.email)),
        (&filter.country, user.country.as_ref()),
    ];
    for (cond, actual) in text {
        if let Some(cond) = cond
            && !condition_matches(cond, actual)?
        {
            return Ok(false);
        }
    }

    let time = [
        (&filter.created_at, Some(&user.created_at)),
        (&filter.updated_at, user.updated_at.as_ref()),
    ];
    for (cond, actual) in time {
        if let Some(cond) = cond
            && !condition_matches(&whole_seconds(cond), actual)?
        {
            return Ok(false);
        }
    }

    Ok(true)
}

fn whole_seconds(cond: &Condition<DateTime<Utc>>) -> Condition<DateTime<Utc>> {
    Condition {
        op: cond.op,
        value: cond.value.trunc_subsecs(0),
        values: cond.values.iter().map(|t| t.trunc_subsecs(0)).collect(),
    }
}

/// NULLS LAST on ascending, NULLS FIRST on descending (PostgreSQL default)
fn nullable_cmp<T: Ord>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compare users by `order`, breaking ties by ascending id
pub fn compare_users(order: Order, a: &User, b: &User) -> Ordering {
    let primary = match order.by {
        OrdBy::FirstName => nullable_cmp(a.first_name.as_ref(), b.first_name.as_ref()),
        OrdBy::LastName => nullable_cmp(a.last_name.as_ref(), b.last_name.as_ref()),
        OrdBy::Nickname => a.nickname.cmp(&b.nickname),
        OrdBy::Email => a.email.cmp(&b.email),
        OrdBy::CreatedAt => a.created_at.cmp(&b.created_at),
        OrdBy::UpdatedAt => nullable_cmp(a.updated_at.as_ref(), b.updated_at.as_ref()),
    };
    let primary = match order.dir {
        OrdDir::Asc => primary,
        OrdDir::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn user(id: &str, first_name: Option<&str>, created_at: &str) -> User {
        User {
            id: id.to_string(),
            first_name: first_name.map(str::to_string),
            last_name: None,
            nickname: format!("{id}-nick"),
            password: String::new(),
            email: format!("{id}@example.com"),
            country: Some("IT".to_string()),
            created_at: ts(created_at),
            updated_at: None,
        }
    }

    #[test]
    fn test_string_operators() {
        let s = "Johnny".to_string();
        let eq = Condition::new(Op::Eq, "Johnny".to_string());
        let begins = Condition::new(Op::Begins, "John".to_string());
        let ends = Condition::new(Op::Ends, "nny".to_string());
        let not_in = Condition::set(Op::Outside, vec!["Jane".to_string()]);
        assert!(condition_matches(&eq, Some(&s)).unwrap());
        assert!(condition_matches(&begins, Some(&s)).unwrap());
        assert!(condition_matches(&ends, Some(&s)).unwrap());
        assert!(condition_matches(&not_in, Some(&s)).unwrap());
    }

    #[test]
    fn test_missing_value_never_matches() {
        let ne = Condition::new(Op::Ne, "x".to_string());
        let outside = Condition::set(Op::Outside, vec!["x".to_string()]);
        assert!(!condition_matches(&ne, None).unwrap());
        assert!(!condition_matches(&outside, None).unwrap());
    }

    #[test]
    fn test_timestamp_intervals_are_inclusive() {
        let start = ts("2024-01-01T00:00:00Z");
        let end = ts("2024-02-01T00:00:00Z");
        let inside = Condition::set(Op::Inside, vec![start, end]);
        let outside = Condition::set(Op::Outside, vec![start, end]);

        assert!(condition_matches(&inside, Some(&start)).unwrap());
        assert!(condition_matches(&inside, Some(&end)).unwrap());
        assert!(!condition_matches(&inside, Some(&ts("2024-03-01T00:00:00Z"))).unwrap());
        assert!(condition_matches(&outside, Some(&start)).unwrap());
        assert!(!condition_matches(&outside, Some(&ts("2024-01-15T00:00:00Z"))).unwrap());
    }

    #[test]
    fn test_invalid_condition_is_an_error() {
        let gt = Condition::new(Op::Gt, "a".to_string());
        assert!(matches!(
            condition_matches(&gt, Some(&"b".to_string())),
            Err(FilterError::InvalidOperator { .. })
        ));
    }

    #[test]
    fn test_filter_matches() {
        let u = user("u1", Some("Jane"), "2024-01-10T00:00:00Z");
        assert!(filter_matches(None, &u).unwrap());
        assert!(filter_matches(Some(&Filter::default()), &u).unwrap());
        assert!(filter_matches(Some(&Filter::by_id("u1")), &u).unwrap());
        assert!(!filter_matches(Some(&Filter::by_id("u2")), &u).unwrap());

        let filter = Filter {
            first_name: Some(Condition::set(
                Op::Inside,
                vec!["John".to_string(), "Jane".to_string()],
            )),
            country: Some(Condition::new(Op::Eq, "IT".to_string())),
            ..Filter::default()
        };
        assert!(filter_matches(Some(&filter), &u).unwrap());

        let unset = user("u2", None, "2024-01-10T00:00:00Z");
        assert!(!filter_matches(Some(&filter), &unset).unwrap());
    }

    #[test]
    fn test_timestamp_bounds_use_whole_seconds() {
        let u = user("u1", None, "2024-03-01T08:20:30.500Z");
        let after = Filter {
            created_at: Some(Condition::new(Op::Gt, ts("2024-03-01T08:20:30.750Z"))),
            ..Filter::default()
        };
        assert!(filter_matches(Some(&after), &u).unwrap());

        let until = Filter {
            created_at: Some(Condition::set(
                Op::Inside,
                vec![ts("2024-03-01T08:00:00Z"), ts("2024-03-01T08:20:30.900Z")],
            )),
            ..Filter::default()
        };
        assert!(!filter_matches(Some(&until), &u).unwrap());
    }

    #[test]
    fn test_compare_users_orders_nulls_last_then_id() {
        let mut users = vec![
            user("c", None, "2024-01-01T00:00:00Z"),
            user("b", Some("Ann"), "2024-01-01T00:00:00Z"),
            user("a", Some("Ann"), "2024-01-02T00:00:00Z"),
            user("d", Some("Zoe"), "2023-12-31T00:00:00Z"),
        ];

        users.sort_by(|a, b| compare_users(Order::new(OrdBy::FirstName, OrdDir::Asc), a, b));
        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "d", "c"]);

        users.sort_by(|a, b| compare_users(Order::new(OrdBy::FirstName, OrdDir::Desc), a, b));
        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["c", "d", "a", "b"]);

        users.sort_by(|a, b| compare_users(Order::default(), a, b));
        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["d", "b", "c", "a"]);
    }
}
