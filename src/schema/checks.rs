//! Value predicates, transforms and defaults referenced by the blog metadata.
//!
//! Timestamps are stored as canonical UTC RFC 3339 strings with millisecond
//! precision so that lexical order in storage equals chronological order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const ROLES: [&str; 3] = ["admin", "author", "commenter"];

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d\d-\d\d(T[012]\d:[0-5]\d(:[0-6]\dZ)?)?$").expect("valid date pattern")
});

/// An email must be of the form `id@domain`.
pub fn is_email(value: &Value) -> bool {
    value
        .as_str()
        .map(|s| s.split('@').count() == 2)
        .unwrap_or(false)
}

pub fn is_role_list(value: &Value) -> bool {
    match value.as_array() {
        Some(roles) => {
            !roles.is_empty()
                && roles
                    .iter()
                    .all(|r| r.as_str().map(|s| ROLES.contains(&s)).unwrap_or(false))
        }
        None => false,
    }
}

pub fn is_non_empty_array(value: &Value) -> bool {
    value.as_array().map(|a| !a.is_empty()).unwrap_or(false)
}

pub fn is_timestamp(value: &Value) -> bool {
    value.as_str().and_then(parse_timestamp).is_some()
}

/// Parses `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM`, `YYYY-MM-DDTHH:MM:SSZ`, or a
/// full RFC 3339 instant such as those produced by [`format_timestamp`].
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if DATE_RE.is_match(s) {
        let naive = match s.len() {
            10 => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)?,
            16 => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok()?,
            _ => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ").ok()?,
        };
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Maps an accepted timestamp string to its canonical stored form.
/// Values that do not parse are returned unchanged.
pub fn to_timestamp(value: Value) -> Value {
    match value.as_str().and_then(parse_timestamp) {
        Some(instant) => Value::String(format_timestamp(instant)),
        None => value,
    }
}

pub fn now_timestamp() -> Value {
    Value::String(format_timestamp(Utc::now()))
}
