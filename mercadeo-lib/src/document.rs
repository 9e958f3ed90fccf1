//! Canonical form of national ID document numbers.
//!
//! The clinic system exports the `documento` column inconsistently: as numbers,
//! as text, in scientific notation, with `.0` artifacts, and occasionally with
//! one extra digit glued to either end. Every (document, day) key in the
//! pipeline goes through [`normalize_document`], so the same patient always
//! produces the same key.

use serde_json::Value;

// Exponents beyond this cannot be a document number
const MAX_EXPONENT: i64 = 32;

/// Normalize a raw document cell into a string of digits.
///
/// ```
/// use mercadeo_lib::document::normalize_document;
/// use serde_json::json;
///
/// assert_eq!(normalize_document(&json!("12345678")), "12345678");
/// assert_eq!(normalize_document(&json!(12345678.0)), "12345678");
/// assert_eq!(normalize_document(&json!("1.0234567891E10")), "1023456789");
/// ```
pub fn normalize_document(raw: &Value) -> String {
    match raw {
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => String::new(),
        Value::Number(number) => {
            let digits = if let Some(int) = number.as_i64() {
                int.to_string()
            } else if let Some(uint) = number.as_u64() {
                uint.to_string()
            } else {
                match number.as_f64() {
                    Some(float) if float.is_finite() => format!("{:.0}", float.round()),
                    _ => return String::new(),
                }
            };
            apply_length_rules(digits)
        }
        Value::String(text) => normalize_document_str(text),
    }
}

/// Text variant of [`normalize_document`]
pub fn normalize_document_str(raw: &str) -> String {
    let mut text: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if text.is_empty() {
        return String::new();
    }

    if text.contains(',') && !text.contains('.') {
        text = text.replace(',', ".");
    }

    let text: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, 'e' | 'E' | '+' | '-' | '.'))
        .collect();

    if text.contains(['e', 'E']) {
        if let Some(expanded) = expand_scientific(&text) {
            return apply_length_rules(expanded);
        }
    }

    let integer_part = match text.split_once('.') {
        Some((integer, _fraction)) => integer.to_string(),
        None => text,
    };

    apply_length_rules(integer_part)
}

/// Exact integer part of a number in scientific notation ("1.2E3" -> "1200")
fn expand_scientific(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let (mantissa, exponent) = lower.split_once('e')?;
    let exponent: i64 = exponent.parse().ok()?;
    if exponent.abs() > MAX_EXPONENT {
        return None;
    }

    let (negative, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if integer.is_empty() && fraction.is_empty() {
        return None;
    }
    if !integer.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{integer}{fraction}");
    let point = integer.len() as i64 + exponent;
    let integer_digits = if point <= 0 {
        String::from("0")
    } else if point as usize >= digits.len() {
        format!("{digits}{}", "0".repeat(point as usize - digits.len()))
    } else {
        digits[..point as usize].to_string()
    };

    let trimmed = integer_digits.trim_start_matches('0');
    let magnitude = if trimmed.is_empty() { "0" } else { trimmed };
    if negative && magnitude != "0" {
        Some(format!("-{magnitude}"))
    } else {
        Some(magnitude.to_string())
    }
}

/// Compensates the export defect that glues one extra digit to the document:
/// keep the last 11 digits of 12+ digit values, then turn 11 digits into 10.
fn apply_length_rules(digits: String) -> String {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return digits;
    }

    let digits = if digits.len() >= 12 {
        digits[digits.len() - 11..].to_string()
    } else {
        digits
    };

    if digits.len() == 11 {
        if digits.starts_with('1') {
            return digits[..10].to_string();
        }
        return digits[1..].to_string();
    }

    digits
}
