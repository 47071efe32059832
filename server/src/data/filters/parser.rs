//! Condition parsing
//!
//! Parses the compact textual condition grammar used by query parameters:
//!
//! ```text
//! <op>[ ]<operand>
//! op      := "=" | "!=" | ">" | ">=" | "<" | "<=" | "in" | "not in" | "^" | "$"
//! operand := literal | "(" literal ("," literal)* ")"   (the latter for in / not in)
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::condition::{Condition, Conditionable, ValueKind};
use super::error::FilterError;
use super::filter::{Filter, fields};
use super::op::Op;

static CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(!?=|>=?|<=?|in|not in|\^|\$) ?(.*)$").expect("condition regex is valid")
});

static VECTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\((.*)\)$").expect("vector regex is valid"));

/// Parse a single condition, converting its literals into `T`
pub fn parse_condition<T: Conditionable>(input: &str) -> Result<Condition<T>, FilterError> {
    let Some(caps) = CONDITION_RE.captures(input) else {
        let token = input.split_whitespace().next().unwrap_or_default();
        return Err(FilterError::UnknownOperator(token.to_string()));
    };

    let operand = caps.get(2).map_or("", |m| m.as_str());
    let op = match caps.get(1).map_or("", |m| m.as_str()) {
        "=" => Op::Eq,
        "!=" => Op::Ne,
        ">" => Op::Gt,
        ">=" => Op::Ge,
        "<" => Op::Lt,
        "<=" => Op::Le,
        "in" => Op::Inside,
        "not in" => Op::Outside,
        "^" => Op::Begins,
        "$" => Op::Ends,
        other => return Err(FilterError::UnknownOperator(other.to_string())),
    };

    if op.is_set() {
        let values = parse_vector::<T>(operand)?;
        Ok(Condition::set(op, values))
    } else {
        Ok(Condition::new(op, T::parse_literal(operand)?))
    }
}

fn parse_vector<T: Conditionable>(operand: &str) -> Result<Vec<T>, FilterError> {
    let inner = VECTOR_RE
        .captures(operand.trim())
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| FilterError::MalformedVector(operand.to_string()))?;

    inner
        .as_str()
        .split(',')
        .map(|el| match T::KIND {
            ValueKind::String => T::parse_literal(el),
            _ => T::parse_literal(el.trim()),
        })
        .collect()
}

/// Build a filter from a map of field name to textual condition
///
/// Returns `Ok(None)` for an empty map. Unknown keys are ignored.
pub fn parse_filter(input: &HashMap<String, String>) -> Result<Option<Filter>, FilterError> {
    if input.is_empty() {
        return Ok(None);
    }

    fn text(
        input: &HashMap<String, String>,
        field: &'static str,
    ) -> Result<Option<Condition<String>>, FilterError> {
        input
            .get(field)
            .map(|raw| parse_condition(raw).map_err(|e| e.on_field(field)))
            .transpose()
    }

    fn time(
        input: &HashMap<String, String>,
        field: &'static str,
    ) -> Result<Option<Condition<DateTime<Utc>>>, FilterError> {
        input
            .get(field)
            .map(|raw| parse_condition(raw).map_err(|e| e.on_field(field)))
            .transpose()
    }

    for key in input.keys() {
        if !fields::FILTERABLE.contains(&key.as_str()) {
            tracing::debug!(%key, "Ignoring unknown filter key");
        }
    }

    Ok(Some(Filter {
        id: None,
        first_name: text(input, fields::FIRST_NAME)?,
        last_name: text(input, fields::LAST_NAME)?,
        nickname: text(input, fields::NICKNAME)?,
        email: text(input, fields::EMAIL)?,
        country: text(input, fields::COUNTRY)?,
        created_at: time(input, fields::CREATED_AT)?,
        updated_at: time(input, fields::UPDATED_AT)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_scalar_operators() {
        let cases = [
            ("= John", Op::Eq, "John"),
            ("=John", Op::Eq, "John"),
            ("!= John", Op::Ne, "John"),
            ("> b", Op::Gt, "b"),
            (">= b", Op::Ge, "b"),
            ("< b", Op::Lt, "b"),
            ("<= b", Op::Le, "b"),
            ("^ Jo", Op::Begins, "Jo"),
            ("$ hn", Op::Ends, "hn"),
        ];

        for (input, op, value) in cases {
            let cond: Condition<String> = parse_condition(input).unwrap();
            assert_eq!(cond, Condition::new(op, value.to_string()), "input: {input}");
        }
    }

    #[test]
    fn string_set_elements_are_verbatim() {
        let cond: Condition<String> = parse_condition("in ( a, b)").unwrap();
        assert_eq!(cond.values, vec![" a".to_string(), " b".to_string()]);
    }

    #[test]
    fn parse_vector_operators() {
        let cond: Condition<String> = parse_condition("not in (a,b,c)").unwrap();
        assert_eq!(
            cond,
            Condition::set(
                Op::Outside,
                vec!["a".to_string(), "b".to_string(), "c".to_string()]
            )
        );

        let cond: Condition<i64> = parse_condition("in (1, 2,3)").unwrap();
        assert_eq!(cond, Condition::set(Op::Inside, vec![1, 2, 3]));
    }

    #[test]
    fn parse_vector_without_parens_fails() {
        let err = parse_condition::<String>("in not_a_list").unwrap_err();
        assert_eq!(err, FilterError::MalformedVector("not_a_list".to_string()));

        let err = parse_condition::<String>("not in a,b").unwrap_err();
        assert!(matches!(err, FilterError::MalformedVector(_)));
    }

    #[test]
    fn parse_unknown_operator() {
        let err = parse_condition::<String>("~ John").unwrap_err();
        assert_eq!(err, FilterError::UnknownOperator("~".to_string()));

        let err = parse_condition::<String>("like John").unwrap_err();
        assert_eq!(err, FilterError::UnknownOperator("like".to_string()));
    }

    #[test]
    fn parse_unparsable_values() {
        assert!(matches!(
            parse_condition::<i64>("= twelve"),
            Err(FilterError::UnparsableValue {
                kind: ValueKind::Integer,
                ..
            })
        ));
        assert!(matches!(
            parse_condition::<DateTime<Utc>>("in (2022-11-23T16:44:26Z,yesterday)"),
            Err(FilterError::UnparsableValue {
                kind: ValueKind::Timestamp,
                ..
            })
        ));
    }

    #[test]
    fn parse_timestamp_interval() {
        let cond: Condition<DateTime<Utc>> =
            parse_condition("in (2022-11-23T16:44:26+02:00,2022-11-29T00:40:11+02:00)").unwrap();
        assert_eq!(cond.op, Op::Inside);
        assert_eq!(cond.values.len(), 2);
        assert!(cond.values[0] < cond.values[1]);
        assert!(cond.validate().is_ok());
    }

    #[test]
    fn parse_does_not_validate() {
        // legality is checked at evaluation time
        let cond: Condition<String> = parse_condition("> b").unwrap();
        assert!(cond.validate().is_err());
    }

    #[test]
    fn parse_filter_empty_map_is_none() {
        assert_eq!(parse_filter(&HashMap::new()).unwrap(), None);
    }

    #[test]
    fn parse_filter_inside_list() {
        let filter = parse_filter(&map(&[("first_name", "in (John,Jane)")]))
            .unwrap()
            .unwrap();
        let cond = filter.first_name.unwrap();
        assert_eq!(cond.op, Op::Inside);
        assert_eq!(cond.values, vec!["John".to_string(), "Jane".to_string()]);
        assert!(filter.last_name.is_none());
        assert!(filter.created_at.is_none());
    }

    #[test]
    fn parse_filter_all_fields() {
        let filter = parse_filter(&map(&[
            ("first_name", "= John"),
            ("last_name", "!= Doe"),
            ("nickname", "^ jo"),
            ("email", "$ @example.com"),
            ("country", "not in (US,UK)"),
            ("created_at", ">= 2022-11-23T16:44:26Z"),
            ("updated_at", "in (2022-11-23T16:44:26Z,2022-11-29T00:40:11Z)"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(filter.conditions().len(), 7);
        assert_eq!(filter.nickname.unwrap().op, Op::Begins);
        assert_eq!(filter.email.unwrap().value, "@example.com");
        assert_eq!(filter.updated_at.unwrap().values.len(), 2);
    }

    #[test]
    fn parse_filter_unknown_keys_only() {
        let filter = parse_filter(&map(&[("shoe_size", "= 42")])).unwrap().unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn parse_filter_error_names_field() {
        let err = parse_filter(&map(&[("created_at", "= last week")])).unwrap_err();
        assert!(matches!(
            err,
            FilterError::Field {
                field: "created_at",
                ..
            }
        ));
        assert_eq!(err.code(), "UNPARSABLE_VALUE");
    }
}
