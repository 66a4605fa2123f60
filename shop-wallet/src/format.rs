//! Display helpers shared by the settings and history screens.
//!
//! Everything here is pure except the two clock readers, which take the
//! current time from `chrono::Utc`.

use chrono::Utc;
use serde_json::Value;
use std::fmt::Display;

/// Default visible length before an ellipsis is appended.
pub const DEFAULT_TRUNCATE_LEN: usize = 10;
/// Default number of fractional digits kept by [`to_fix`].
pub const DEFAULT_DECIMALS: usize = 2;
/// Currency shown without a fractional part.
pub const KRW_CURRENCY: &str = "krw";

const ELLIPSIS: &str = "...";
const MIDDLE_SEPARATOR: &str = " ... ";

/// Keep the first `max_len` characters and append `...` when the input is longer.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let mut out: String = s.chars().take(max_len).collect();
        out.push_str(ELLIPSIS);
        out
    } else {
        s.to_string()
    }
}

/// Elide the middle of long identifiers such as wallet addresses.
///
/// Keeps `max_len / 2 + 2` leading and `max_len / 2` trailing characters
/// (integer division). A missing value renders as an empty string.
pub fn truncate_middle_string(s: Option<&str>, max_len: usize) -> String {
    let s = s.unwrap_or("");
    let count = s.chars().count();
    if count <= max_len {
        return s.to_string();
    }

    let head_len = max_len / 2 + 2;
    let tail_len = max_len / 2;
    let head: String = s.chars().take(head_len).collect();
    let tail: String = s.chars().skip(count - tail_len).collect();
    format!("{}{}{}", head, MIDDLE_SEPARATOR, tail)
}

/// Cut a decimal string `decimals` digits after the point.
///
/// `None` keeps the integer part only (no point). Input without a decimal
/// point is returned unchanged. No rounding is applied.
pub fn to_fix(s: &str, decimals: Option<usize>) -> String {
    let point = match s.chars().position(|c| c == '.') {
        Some(point) => point,
        None => return s.to_string(),
    };

    let keep = match decimals {
        Some(digits) => point + 1 + digits,
        None => point,
    };
    s.chars().take(keep).collect()
}

/// [`convert_proper_value_with`] using two decimals and a ten character limit.
pub fn convert_proper_value(s: &str, currency: &str) -> String {
    convert_proper_value_with(s, currency, Some(DEFAULT_DECIMALS), DEFAULT_TRUNCATE_LEN)
}

/// Format an amount string for display: cut the fraction, group thousands,
/// then truncate. KRW never shows a fractional part.
pub fn convert_proper_value_with(
    s: &str,
    currency: &str,
    decimals: Option<usize>,
    truncate_len: usize,
) -> String {
    let decimals = if currency.eq_ignore_ascii_case(KRW_CURRENCY) {
        None
    } else {
        decimals
    };
    truncate_string(&number_with_commas(to_fix(s, decimals)), truncate_len)
}

/// Insert `,` every three digits of the integer part. The fraction is untouched.
pub fn number_with_commas<T: Display>(x: T) -> String {
    let text = x.to_string();
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text.as_str(), None),
    };

    let chars: Vec<char> = integer.chars().collect();
    let mut grouped = String::with_capacity(text.len() + chars.len() / 3);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && is_word_char(chars[i - 1]) && groups_of_three_follow(&chars[i..]) {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    match fraction {
        Some(fraction) => format!("{}.{}", grouped, fraction),
        None => grouped,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// True when `rest` opens with a run of digits whose length is a non-zero multiple of three.
fn groups_of_three_follow(rest: &[char]) -> bool {
    let run = rest.iter().take_while(|c| c.is_ascii_digit()).count();
    run > 0 && run % 3 == 0
}

/// Two-digit clock component, e.g. `7` -> `"07"`.
pub fn time_padding(t: u32) -> String {
    format!("{:02}", t % 100)
}

/// Current time in whole seconds since the unix epoch.
pub fn get_unix_time() -> i64 {
    Utc::now().timestamp()
}

/// True while `timestamp + timeout` is still in the future.
pub fn check_valid_period(timestamp: i64, timeout: i64) -> bool {
    check_valid_period_at(timestamp, timeout, get_unix_time())
}

/// Same as [`check_valid_period`] against an explicit `now`. Equality counts as expired.
pub fn check_valid_period_at(timestamp: i64, timeout: i64, now: i64) -> bool {
    timestamp.saturating_add(timeout) > now
}

/// Null, `""` and `{}` are empty. Numbers, booleans and arrays never are.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
