//! Request sanitizing and validation.
//!
//! Handlers sanitize incoming strings first, then run the validators below,
//! collecting every failure into one [`ValidationErrors`] so the client sees
//! all problems in a single 422.

use axum::extract::{FromRequest, FromRequestParts};
use querykit::{ParamValue, RawParams};

use crate::errors::{ApiError, FieldErrors};

/// `axum::Json` whose rejection is rendered as an [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path` whose rejection is rendered as an [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// Trim, drop control characters and collapse whitespace runs to one space.
#[must_use]
pub fn sanitize(value: &str) -> String {
    let visible: String = value.trim().chars().filter(|c| !c.is_control()).collect();
    visible.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[must_use]
pub fn sanitize_opt(value: Option<String>) -> Option<String> {
    value.map(|value| sanitize(&value))
}

/// Sanitize every value of a query parameter bag.
#[must_use]
pub fn sanitize_params(raw: &RawParams) -> RawParams {
    raw.iter()
        .map(|(key, value)| {
            let value = match value {
                ParamValue::Single(text) => ParamValue::Single(sanitize(text)),
                ParamValue::Many(items) => {
                    ParamValue::Many(items.iter().map(|item| sanitize(item)).collect())
                }
            };
            (key.to_owned(), value)
        })
        .collect()
}

/// Validation failures, grouped by field.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: FieldErrors,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of fields with at least one failure.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// `Ok` when nothing failed, otherwise a 422 with every message.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ValidationFailed`] when any failure was recorded.
    pub fn result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_failed(self.errors))
        }
    }
}

/// Single-value checks shared by the request types.
pub mod validators {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    pub const PASSWORD_SYMBOLS: &str = "@$!%*?&.";

    #[must_use]
    pub fn is_blank(value: Option<&str>) -> bool {
        value.is_none_or(|value| value.trim().is_empty())
    }

    #[must_use]
    pub fn char_len(value: &str) -> usize {
        value.chars().count()
    }

    /// Letters and spaces only.
    #[must_use]
    pub fn is_person_name(value: &str) -> bool {
        !value.is_empty() && value.chars().all(|c| c.is_alphabetic() || c == ' ')
    }

    /// One `@`, a non-empty local part and a dotted domain, no whitespace.
    #[must_use]
    pub fn is_email(value: &str) -> bool {
        let Some((local, domain)) = value.split_once('@') else {
            return false;
        };
        !local.is_empty()
            && !domain.contains('@')
            && !value.chars().any(char::is_whitespace)
            && domain
                .split_once('.')
                .is_some_and(|(host, rest)| !host.is_empty() && !rest.is_empty())
            && !domain.ends_with('.')
    }

    /// Lower-case, upper-case, digit and symbol, drawn only from those sets.
    #[must_use]
    pub fn is_strong_password(value: &str) -> bool {
        let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c);
        value.chars().all(allowed)
            && value.chars().any(|c| c.is_ascii_lowercase())
            && value.chars().any(|c| c.is_ascii_uppercase())
            && value.chars().any(|c| c.is_ascii_digit())
            && value.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
    }

    /// `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339.
    #[must_use]
    pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|moment| moment.naive_utc())
            })
    }

    #[must_use]
    pub fn parse_number(value: &str) -> Option<f64> {
        value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
    }
}

/// Field rules for users, reporting with the API's wording.
pub mod rules {
    use super::ValidationErrors;
    use super::validators::{char_len, is_blank, is_email, is_person_name, is_strong_password};

    pub const MIN_NAME: usize = 3;
    pub const MAX_TEXT: usize = 255;
    pub const MIN_PASSWORD: usize = 8;

    pub fn name(errors: &mut ValidationErrors, value: Option<&str>, required: bool) {
        let Some(value) = value.filter(|value| !is_blank(Some(value))) else {
            if required {
                errors.add("name", "The name is mandatory.");
            }
            return;
        };
        if char_len(value) < MIN_NAME {
            errors.add("name", "The name must be at least 3 characters.");
        }
        if char_len(value) > MAX_TEXT {
            errors.add("name", "The name cannot have more than 255 characters.");
        }
        if !is_person_name(value) {
            errors.add("name", "The name can only contain letters and spaces.");
        }
    }

    pub fn email(errors: &mut ValidationErrors, value: Option<&str>, required: bool) {
        let Some(value) = value.filter(|value| !is_blank(Some(value))) else {
            if required {
                errors.add("email", "The email is mandatory.");
            }
            return;
        };
        if !is_email(value) {
            errors.add("email", "The email must be valid.");
        }
        if char_len(value) > MAX_TEXT {
            errors.add("email", "The email cannot have more than 255 characters.");
        }
    }

    /// Length and strength of a password, plus its confirmation when asked.
    pub fn password(
        errors: &mut ValidationErrors,
        value: Option<&str>,
        confirmation: Option<Option<&str>>,
        missing_message: &str,
    ) {
        let Some(value) = value.filter(|value| !is_blank(Some(value))) else {
            errors.add("password", missing_message);
            return;
        };
        if char_len(value) < MIN_PASSWORD {
            errors.add("password", "The password must be at least 8 characters.");
        }
        if !is_strong_password(value) {
            errors.add(
                "password",
                "The password must contain at least one uppercase letter, one lowercase letter, one number, and one special character (@$!%*?&.).",
            );
        }
        if let Some(confirmation) = confirmation
            && confirmation != Some(value)
        {
            errors.add("password", "The password confirmation does not match.");
        }
    }
}

const PAGE_LIMIT: i64 = 100;
const SORT_FIELD_LIMIT: usize = 50;

fn integer(errors: &mut ValidationErrors, raw: &RawParams, key: &str, label: &str) -> Option<i64> {
    let value = raw.get(key).filter(|value| !value.is_blank())?;
    match value.as_single().and_then(|text| text.trim().parse::<i64>().ok()) {
        Some(number) => Some(number),
        None => {
            errors.add(key, format!("The {label} must be an integer."));
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundKind {
    Date,
    Number,
}

/// Classify a range key in any of its spellings. Closing bounds come with
/// the key of their opening bound in the same spelling.
fn range_bound(key: &str) -> Option<(BoundKind, Option<String>)> {
    let bound = if let Some(field) = key.strip_suffix("_end") {
        (BoundKind::Date, Some(format!("{field}_start")))
    } else if let Some(field) = key.strip_prefix("end_") {
        (BoundKind::Date, Some(format!("start_{field}")))
    } else if let Some(field) = key.strip_suffix("_max") {
        (BoundKind::Number, Some(format!("{field}_min")))
    } else if let Some(field) = key.strip_prefix("max_") {
        (BoundKind::Number, Some(format!("min_{field}")))
    } else if key.ends_with("_start") || key.starts_with("start_") {
        (BoundKind::Date, None)
    } else if key.ends_with("_min") || key.starts_with("min_") {
        (BoundKind::Number, None)
    } else {
        return None;
    };
    Some(bound)
}

fn check_dates(
    errors: &mut ValidationErrors,
    raw: &RawParams,
    key: &str,
    opening: Option<&str>,
) {
    let Some(value) = raw.get(key).filter(|value| !value.is_blank()) else {
        return;
    };
    let Some(moment) = value.as_single().and_then(validators::parse_date) else {
        errors.add(key, "The field must be a valid date.");
        return;
    };

    if let Some(opening) = opening
        && let Some(start) = raw.text(opening).and_then(validators::parse_date)
        && moment < start
    {
        errors.add(key, "The end date must be after or equal to the start date.");
    }
}

fn check_numbers(
    errors: &mut ValidationErrors,
    raw: &RawParams,
    key: &str,
    opening: Option<&str>,
) {
    let Some(value) = raw.get(key).filter(|value| !value.is_blank()) else {
        return;
    };
    let Some(number) = value.as_single().and_then(validators::parse_number) else {
        errors.add(key, "The field must be a number.");
        return;
    };

    if let Some(opening) = opening
        && let Some(min) = raw.text(opening).and_then(validators::parse_number)
        && number < min
    {
        errors.add(
            key,
            "The maximum value must be greater than or equal to the minimum value.",
        );
    }
}

/// Check the paging, sort and range parameters of a list request.
///
/// Blank values are skipped. Range keys are checked in both spellings:
/// `_start`/`_end` suffixes and `start_`/`end_` prefixes must be dates,
/// `_min`/`_max` suffixes and `min_`/`max_` prefixes numbers. A closing
/// bound must not precede its opening bound.
///
/// # Errors
///
/// Returns a 422 [`ApiError`] listing every failing parameter.
pub fn validate_search(raw: &RawParams) -> Result<(), ApiError> {
    let mut errors = ValidationErrors::new();

    if let Some(page) = integer(&mut errors, raw, "page", "page number")
        && page < 1
    {
        errors.add("page", "The page number must be at least 1.");
    }

    if let Some(per_page) = integer(&mut errors, raw, "per_page", "number of records per page") {
        if per_page < 1 {
            errors.add("per_page", "The number of records per page must be at least 1.");
        } else if per_page > PAGE_LIMIT {
            errors.add("per_page", "The number of records per page cannot exceed 100.");
        }
    }

    if let Some(sort_by) = raw.text("sort_by")
        && validators::char_len(sort_by) > SORT_FIELD_LIMIT
    {
        errors.add("sort_by", "The sort field cannot exceed 50 characters.");
    }

    if let Some(order) = raw.get("sort_order").filter(|value| !value.is_blank()) {
        let valid = order
            .as_single()
            .is_some_and(|order| matches!(order.trim().to_lowercase().as_str(), "asc" | "desc"));
        if !valid {
            errors.add("sort_order", "The order must be asc or desc.");
        }
    }

    let mut keys: Vec<&str> = raw.iter().map(|(key, _)| key).collect();
    keys.sort_unstable();
    for key in keys {
        match range_bound(key) {
            Some((BoundKind::Date, opening)) => {
                check_dates(&mut errors, raw, key, opening.as_deref());
            }
            Some((BoundKind::Number, opening)) => {
                check_numbers(&mut errors, raw, key, opening.as_deref());
            }
            None => {}
        }
    }

    errors.result()
}
