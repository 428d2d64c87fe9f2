//! Client-side ordering of listing records, including the heuristic price parser
//! for locale-formatted prices ("836 triệu", "1,2 tỷ", "650.000.000").

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::listing::ListingRecord;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum SortKey {
    #[default]
    Default,
    PriceLow,
    PriceHigh,
    YearNew,
    YearOld,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [SortKey::Default, SortKey::PriceLow, SortKey::PriceHigh, SortKey::YearNew, SortKey::YearOld];

    /// Unknown tokens fall back to [`SortKey::Default`].
    pub fn from_token(token: &str) -> Self {
        match token {
            "price_low" => SortKey::PriceLow,
            "price_high" => SortKey::PriceHigh,
            "year_new" => SortKey::YearNew,
            "year_old" => SortKey::YearOld,
            _ => SortKey::Default,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            SortKey::Default => "default",
            SortKey::PriceLow => "price_low",
            SortKey::PriceHigh => "price_high",
            SortKey::YearNew => "year_new",
            SortKey::YearOld => "year_old",
        }
    }
}

impl From<String> for SortKey {
    fn from(token: String) -> Self {
        SortKey::from_token(&token)
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.token().to_string()
    }
}


/// Normalizes a listing price to a number.
///
/// Dots and commas are always thousand separators. "triệu" multiplies by a
/// million and "tỷ" by a billion. Without a unit word the digits of the raw
/// string are read as-is. Anything unreadable is `0`.
pub fn parse_price(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_price_text(s),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => 0.0,
    }
}

pub fn parse_price_text(text: &str) -> f64 {
    let lower = text.to_lowercase();

    let numeric = lower
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .filter(|c| !matches!(c, '.' | ','))
        .collect::<String>();
    let amount = parse_int_prefix(&numeric).unwrap_or(0.0);

    if lower.contains("tri") {
        return amount * 1_000_000.0;
    }
    if lower.contains('t') && (lower.contains('ỷ') || lower.contains("ty") || lower.contains("tỷ")) {
        return amount * 1_000_000_000.0;
    }

    // no unit word: separators are not special here, only the raw digits count
    let digits = lower.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    parse_int_prefix(&digits).unwrap_or(0.0)
}

/// Optional minus sign followed by leading digits; trailing text is ignored.
fn parse_int_prefix(text: &str) -> Option<f64> {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text),
    };
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok().map(|n| sign * n)
}

pub fn year_key(record: &ListingRecord) -> f64 {
    match record.year() {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn price_key(record: &ListingRecord) -> f64 {
    record.price().map(parse_price).unwrap_or(0.0)
}


/// Returns a reordered copy of `records`. Ties keep their input order and
/// unknown keys keep the whole input order.
pub fn sort(records: Option<&[ListingRecord]>, key: SortKey) -> Vec<ListingRecord> {
    let Some(records) = records else {
        return Vec::new();
    };
    match key {
        SortKey::Default => records.to_vec(),
        SortKey::PriceLow => sort_by_number(records, price_key, false),
        SortKey::PriceHigh => sort_by_number(records, price_key, true),
        SortKey::YearNew => sort_by_number(records, year_key, true),
        SortKey::YearOld => sort_by_number(records, year_key, false),
    }
}

/// Same as [`sort`] for an untyped payload. Anything but an array is empty and
/// non-object members are dropped.
pub fn sort_json(records: &Value, key: SortKey) -> Vec<ListingRecord> {
    let Some(items) = records.as_array() else {
        return Vec::new();
    };
    let records = items.iter().filter_map(ListingRecord::from_json).collect::<Vec<_>>();
    sort(Some(&records), key)
}

fn sort_by_number(records: &[ListingRecord], key_fn: fn(&ListingRecord) -> f64, descending: bool) -> Vec<ListingRecord> {
    // + 0.0 folds -0.0 into 0.0 so both compare equal under total_cmp
    let mut keyed = records.iter().map(|r| (key_fn(r) + 0.0, r)).collect::<Vec<_>>();
    if descending {
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    } else {
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    keyed.into_iter().map(|(_, r)| r.clone()).collect()
}
