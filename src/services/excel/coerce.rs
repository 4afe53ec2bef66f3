use once_cell::sync::Lazy;
use regex::Regex;

use super::types::CellValue;

static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.\-]").expect("static regex is valid"));

/// Lenient cell-to-number conversion.
///
/// Everything except ASCII digits, `.` and `-` is stripped from the text form,
/// then the longest prefix shaped like `-?digits(.digits)?` is parsed. So
/// `"$1,234.50"` is `1234.5`, `"abc-1"` is `-1`, `"3-4"` is `3` and
/// `"1.2.3"` is `1.2`. Returns `None` for empty cells, booleans, anything
/// without a digit in that prefix, and non-finite results.
pub fn to_number(raw: &CellValue) -> Option<f64> {
    match raw {
        CellValue::Empty | CellValue::Bool(_) => None,
        CellValue::Number(n) => n.is_finite().then_some(*n),
        CellValue::Text(s) => parse_lenient(s),
    }
}

fn parse_lenient(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    let stripped = NON_NUMERIC.replace_all(text, "");
    let prefix = numeric_prefix(&stripped)?;
    prefix.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn numeric_prefix(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut digits = 0;

    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let dot = end;
        end += 1;
        let mut fraction = 0;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            fraction += 1;
        }
        digits += fraction;
        // "5." is fine, a lone "." is not
        if fraction == 0 {
            end = dot;
        }
    }

    if digits == 0 {
        return None;
    }
    Some(&s[..end])
}
