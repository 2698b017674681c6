//! Tolerant deserializers for form-driven payloads
//!
//! The admin SPA posts raw form state: empty strings for untouched number
//! pickers, numeric strings from `<select>`s, and bare `YYYY-MM-DD` dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Int(i64),
    Text(String),
}

/// Optional foreign key: `null`, `""`, `0` and non-positive values mean "none"
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IdRepr>::deserialize(deserializer)?;
    let id = match raw {
        None => None,
        Some(IdRepr::Int(n)) => Some(n),
        Some(IdRepr::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.parse::<i64>().map_err(serde::de::Error::custom)?)
            }
        }
    };
    Ok(id.filter(|n| *n > 0))
}

/// Required id that may arrive as a number or numeric string; blank means 0
pub fn id_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_id(deserializer)?.unwrap_or(0))
}

/// Ordering number that may arrive as a string; blank means 0
pub fn int_or_zero<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IdRepr>::deserialize(deserializer)?;
    match raw {
        None => Ok(0),
        Some(IdRepr::Int(n)) => i32::try_from(n).map_err(serde::de::Error::custom),
        Some(IdRepr::Text(s)) if s.trim().is_empty() => Ok(0),
        Some(IdRepr::Text(s)) => s.trim().parse::<i32>().map_err(serde::de::Error::custom),
    }
}

/// Optional timestamp accepting RFC 3339, `YYYY-MM-DD`, `""` or `null`
pub fn optional_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = raw else { return Ok(None) };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(naive.and_utc()));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(serde::de::Error::custom)?;
    Ok(date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()))
}

/// Optional text where blank input is stored as NULL
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}
