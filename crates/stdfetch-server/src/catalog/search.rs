//! Search result normalisation.
//!
//! The search endpoints disagree on field names and formats, so items are
//! read as loose JSON and folded into one [`SearchHit`] shape.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One normalised search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub standard_num: String,
    pub standard_name: String,
    pub release_date: String,
    pub status: String,
    pub stan_status: String,
    pub stan_category: String,
    pub stan_year: Option<i64>,
    pub page_count: String,
}

const NUMBER_KEYS: &[&str] = &["stdNumber", "STAN_NUM", "stanNum", "number"];
const NAME_KEYS: &[&str] = &["stdName", "STAN_CNNAME", "stanName", "name"];
const DATE_KEYS: &[&str] = &["stdReleaseDate", "PUB_DATE", "releaseDate", "date"];
const STATUS_KEYS: &[&str] = &["stdStatus", "STAN_STATUS", "stanStatus", "status"];
const CATEGORY_KEYS: &[&str] = &["STAN_CATEGORY", "stanCategory", "category"];
const YEAR_KEYS: &[&str] = &["STAN_PART_YEAR", "stanYear", "year"];
const PAGE_KEYS: &[&str] = &["PAGE_COUNT", "pageCount", "pages"];

/// Fields that may carry the result list, in priority order.
const RESULT_FIELDS: &[&str] = &["result", "resultList", "content"];

const DEFAULT_STATUS: &str = "现行";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Whether the envelope's `success` flag is set.
pub fn is_success(data: &Value) -> bool {
    data.get("success").is_some_and(is_success_flag)
}

/// Whether a bare `success` value is set (`true` or `"true"`).
pub fn is_success_flag(flag: &Value) -> bool {
    match flag {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        _ => false,
    }
}

/// Best-effort error text from an unsuccessful envelope.
pub fn upstream_message(data: &Value) -> String {
    ["message", "msg", "errMsg"]
        .iter()
        .find_map(|k| data.get(*k).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| data.to_string())
}

/// The result list from the first result field present in the envelope.
pub fn extract_items(data: &Value) -> &[Value] {
    RESULT_FIELDS
        .iter()
        .find_map(|field| data.get(*field))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Normalise one raw item. Items without a standard number are dropped.
pub fn hit_from_item(item: &Value) -> Option<SearchHit> {
    let standard_num = pick(item, NUMBER_KEYS)?;
    let status = strip_html_tags(&pick(item, STATUS_KEYS).unwrap_or_else(|| DEFAULT_STATUS.into()));
    let stan_year = pick(item, YEAR_KEYS)
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .and_then(|y| y.parse().ok());

    Some(SearchHit {
        standard_num,
        standard_name: strip_html_tags(&pick(item, NAME_KEYS).unwrap_or_default()),
        release_date: format_release_date(&pick(item, DATE_KEYS).unwrap_or_default()),
        stan_status: status.clone(),
        status,
        stan_category: strip_html_tags(&pick(item, CATEGORY_KEYS).unwrap_or_default()),
        stan_year,
        page_count: pick(item, PAGE_KEYS).unwrap_or_default(),
    })
}

/// First non-empty value among `keys`, rendered as a string.
fn pick(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    })
}

/// Remove markup (search highlighting) and decode the basic entities.
pub fn strip_html_tags(text: &str) -> String {
    TAG_RE
        .replace_all(text, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Normalise the many release date spellings to `YYYY-MM-DD`.
///
/// Unknown formats are returned unchanged; empty input becomes `-`.
pub fn format_release_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "-".to_string();
    }

    if (10..=13).contains(&raw.len()) && raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(ts) = raw.parse::<i64>() {
            let dt = if ts > 100_000_000_000 {
                DateTime::<Utc>::from_timestamp_millis(ts)
            } else {
                DateTime::<Utc>::from_timestamp(ts, 0)
            };
            if let Some(dt) = dt {
                return dt.format("%Y-%m-%d").to_string();
            }
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%Y.%m.%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    // Month-only formats: pin the day to the first.
    for (fmt, sep) in [("%Y-%m-%d", '-'), ("%Y/%m/%d", '/'), ("%Y.%m.%d", '.')] {
        let padded = format!("{raw}{sep}01");
        if raw.matches(sep).count() == 1 {
            if let Ok(date) = NaiveDate::parse_from_str(&padded, fmt) {
                return date.format("%Y-%m-%d").to_string();
            }
        }
    }

    raw.to_string()
}
