use chrono::{DateTime, NaiveDate};
use sea_orm::{
    ColumnTrait, ColumnType, Condition, IdenStatic, Value,
    sea_query::{Alias, Expr, Func, SimpleExpr},
};

use super::search::{contains_pattern, escape_like_wildcards};
use crate::params::ParamValue;

/// A filter value after normalisation, as handed to hooks and predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    List(Vec<String>),
}

impl FilterValue {
    /// Trim, drop blanks, and turn the literals `"true"`/`"false"` into booleans.
    ///
    /// Returns `None` when nothing usable remains.
    #[must_use]
    pub fn normalize(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Single(text) => match text.trim() {
                "" => None,
                "true" => Some(Self::Bool(true)),
                "false" => Some(Self::Bool(false)),
                text => Some(Self::Text(text.to_owned())),
            },
            ParamValue::Many(values) => {
                let items: Vec<String> = values
                    .iter()
                    .map(|value| value.trim())
                    .filter(|value| !value.is_empty())
                    .map(str::to_owned)
                    .collect();
                (!items.is_empty()).then_some(Self::List(items))
            }
        }
    }

    /// The value as a single string; lists have none.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bool(true) => Some("true"),
            Self::Bool(false) => Some("false"),
            Self::List(_) => None,
        }
    }

    /// The value as a list; scalars become a list of one.
    #[must_use]
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            scalar => scalar.as_text().map(str::to_owned).into_iter().collect(),
        }
    }
}

fn is_integer(column_type: &ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned
    )
}

fn is_float(column_type: &ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) | ColumnType::Money(_)
    )
}

/// Bind a raw string with the column's declared type; unparsable input stays text.
pub(crate) fn bind(column_type: &ColumnType, raw: &str) -> Value {
    let parsed = if is_integer(column_type) {
        raw.parse::<i64>().ok().map(Value::from)
    } else if is_float(column_type) {
        raw.parse::<f64>().ok().map(Value::from)
    } else if matches!(column_type, ColumnType::Boolean) {
        match raw {
            "1" | "true" => Some(Value::from(true)),
            "0" | "false" => Some(Value::from(false)),
            _ => None,
        }
    } else {
        None
    };
    parsed.unwrap_or_else(|| Value::from(raw))
}

fn bind_flag(column_type: &ColumnType, flag: bool) -> Value {
    if matches!(column_type, ColumnType::Boolean) {
        Value::from(flag)
    } else if is_integer(column_type) {
        Value::from(i64::from(flag))
    } else {
        Value::from(if flag { "true" } else { "false" })
    }
}

fn bind_all<C: ColumnTrait>(column: C, values: &[String]) -> Vec<Value> {
    let def = column.def();
    values
        .iter()
        .map(|value| bind(def.get_column_type(), value))
        .collect()
}

/// `column = value`, or `column IN (...)` when the value is a list.
pub(crate) fn exact<C: ColumnTrait>(column: C, value: &FilterValue) -> SimpleExpr {
    let def = column.def();
    match value {
        FilterValue::Text(text) => column.eq(bind(def.get_column_type(), text)),
        FilterValue::Bool(flag) => column.eq(bind_flag(def.get_column_type(), *flag)),
        FilterValue::List(items) => column.is_in(bind_all(column, items)),
    }
}

/// `column LIKE '%value%'` with wildcards in the value escaped.
pub(crate) fn partial<C: ColumnTrait>(column: C, value: &FilterValue) -> Option<SimpleExpr> {
    let text = value.as_text()?;
    Some(column.like(contains_pattern(&escape_like_wildcards(text))))
}

/// `column IN (...)`.
pub(crate) fn membership<C: ColumnTrait>(column: C, value: &FilterValue) -> SimpleExpr {
    match value {
        FilterValue::Bool(flag) => {
            let def = column.def();
            column.is_in([bind_flag(def.get_column_type(), *flag)])
        }
        other => column.is_in(bind_all(column, &other.to_list())),
    }
}

/// Columns compared by calendar date rather than raw value.
#[must_use]
pub fn is_date_field(name: &str) -> bool {
    name.ends_with("_at") || name.ends_with("_date")
}

fn calendar_date(raw: &str) -> Value {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|moment| moment.date_naive()))
        .map_or_else(|| Value::from(raw), Value::from)
}

/// `lower <= column <= upper`, either side optional, grouped under one `AND`.
///
/// Date-like columns compare `DATE(column)` against the bound's calendar date.
pub(crate) fn range<C: ColumnTrait>(
    column: C,
    lower: Option<&str>,
    upper: Option<&str>,
) -> Option<Condition> {
    if lower.is_none() && upper.is_none() {
        return None;
    }

    let mut condition = Condition::all();
    if is_date_field(column.as_str()) {
        let day = || {
            Expr::expr(Func::cust(Alias::new("DATE")).arg(Expr::col(column.as_column_ref())))
        };
        if let Some(lower) = lower {
            condition = condition.add(day().gte(calendar_date(lower)));
        }
        if let Some(upper) = upper {
            condition = condition.add(day().lte(calendar_date(upper)));
        }
    } else {
        let def = column.def();
        if let Some(lower) = lower {
            condition = condition.add(column.gte(bind(def.get_column_type(), lower)));
        }
        if let Some(upper) = upper {
            condition = condition.add(column.lte(bind(def.get_column_type(), upper)));
        }
    }
    Some(condition)
}

/// A flat filter declared as a range: `[lower, upper]`, or a lone lower bound.
pub(crate) fn range_from_value<C: ColumnTrait>(column: C, value: &FilterValue) -> Option<Condition> {
    match value {
        FilterValue::List(items) => range(
            column,
            items.first().map(String::as_str),
            items.get(1).map(String::as_str),
        ),
        scalar => range(column, scalar.as_text(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_literals_are_normalized() {
        assert_eq!(FilterValue::normalize(&"true".into()), Some(FilterValue::Bool(true)));
        assert_eq!(FilterValue::normalize(&"false".into()), Some(FilterValue::Bool(false)));
        assert_eq!(
            FilterValue::normalize(&"True".into()),
            Some(FilterValue::Text("True".into()))
        );
        assert_eq!(
            FilterValue::normalize(&"yes".into()),
            Some(FilterValue::Text("yes".into()))
        );
    }

    #[test]
    fn test_blank_values_normalize_to_none() {
        assert_eq!(FilterValue::normalize(&"".into()), None);
        assert_eq!(FilterValue::normalize(&"  ".into()), None);
        assert_eq!(FilterValue::normalize(&vec!["", " "].into()), None);
    }

    #[test]
    fn test_lists_drop_blank_items() {
        assert_eq!(
            FilterValue::normalize(&vec!["a", "", " b "].into()),
            Some(FilterValue::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_scalars_become_lists_of_one() {
        assert_eq!(FilterValue::Text("x".into()).to_list(), vec!["x".to_owned()]);
        assert_eq!(FilterValue::Bool(true).to_list(), vec!["true".to_owned()]);
        assert_eq!(FilterValue::List(vec!["a".into()]).as_text(), None);
    }

    #[test]
    fn test_bind_follows_column_type() {
        assert_eq!(bind(&ColumnType::Integer, "3"), Value::from(3_i64));
        assert_eq!(bind(&ColumnType::Integer, "three"), Value::from("three"));
        assert_eq!(bind(&ColumnType::Double, "2.5"), Value::from(2.5_f64));
        assert_eq!(bind(&ColumnType::Boolean, "1"), Value::from(true));
        assert_eq!(bind(&ColumnType::Text, "42"), Value::from("42"));
    }

    #[test]
    fn test_flags_bind_per_column_type() {
        assert_eq!(bind_flag(&ColumnType::Boolean, true), Value::from(true));
        assert_eq!(bind_flag(&ColumnType::Integer, true), Value::from(1_i64));
        assert_eq!(bind_flag(&ColumnType::Text, false), Value::from("false"));
    }

    #[test]
    fn test_date_fields() {
        assert!(is_date_field("created_at"));
        assert!(is_date_field("due_date"));
        assert!(!is_date_field("priority"));
        assert!(!is_date_field("date"));
    }

    #[test]
    fn test_calendar_date_parsing() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(calendar_date("2024-01-01"), Value::from(day));
        assert_eq!(calendar_date("2024-01-01T23:59:59+00:00"), Value::from(day));
        assert_eq!(calendar_date("yesterday"), Value::from("yesterday"));
    }
}
