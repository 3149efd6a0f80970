// src/services/parsing.rs
//! Locale-tolerant number parsing for form fields.
//!
//! Fields arrive as text typed by a person, so `"13,65"` and `"13.65"` must
//! mean the same thing and garbage must quietly become zero.

/// Parse a decimal typed with either `,` or `.` as separator.
///
/// Only the first comma is replaced, and only the leading numeric prefix is
/// read, so `"1.234,56"` yields `1.234`. Empty or non-numeric input yields 0.
pub fn parse_decimal(text: Option<&str>) -> f64 {
    let raw = match text {
        Some(t) if !t.is_empty() => t,
        _ => return 0.0,
    };
    let normalized = raw.replacen(',', ".", 1);
    leading_float(&normalized).unwrap_or(0.0)
}

/// Parse a whole number of periods, truncating any fraction.
///
/// A count too large for `i64` yields 0, like any other unusable input.
pub fn parse_whole(text: Option<&str>) -> i64 {
    let raw = match text {
        Some(t) => t.trim_start(),
        None => return 0,
    };
    let bytes = raw.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }
    raw[..end].parse::<i64>().unwrap_or(0)
}

/// Longest prefix of `text` that reads as a float, ignoring leading whitespace.
pub(crate) fn leading_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }

    if mantissa_digits == 0 {
        return None;
    }

    // exponent only counts when followed by at least one digit
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
