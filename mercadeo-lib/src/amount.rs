use serde_json::Value;

/// Parse a money cell into whole pesos.
///
/// Numeric cells are truncated. Text keeps only digits, `,`, `.` and `-`:
/// - comma present, no dot, and every group after the first has three digits:
///   the commas group thousands (`"$45,000"` -> 45000);
/// - any other comma: dot groups thousands and comma is the decimal separator,
///   whose decimals are dropped (`"1.234,56"` -> 1234);
/// - no comma: a trailing `.0+` is noise, other dots group thousands
///   (`"1.234.567"` -> 1234567, `"45000.00"` -> 45000).
///
/// Unparseable and negative values yield 0.
pub fn parse_amount(raw: &Value) -> i64 {
    match raw {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
            .unwrap_or(0)
            .max(0),
        Value::String(text) => parse_amount_str(text),
        _ => 0,
    }
}

pub fn parse_amount_str(raw: &str) -> i64 {
    let kept: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if kept.is_empty() {
        return 0;
    }

    let numeric = if kept.contains(',') {
        if !kept.contains('.') && is_thousands_grouped(&kept, ',') {
            kept.replace(',', "")
        } else {
            kept.replace('.', "").replace(',', ".")
        }
    } else if has_zero_fraction(&kept) {
        kept.split('.').next().unwrap_or_default().to_string()
    } else {
        kept.replace('.', "")
    };

    numeric
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
        .unwrap_or(0)
        .max(0)
}

/// "45,000" or "1,234,567": a 1-3 digit head followed by 3-digit groups
fn is_thousands_grouped(text: &str, separator: char) -> bool {
    let text = text.strip_prefix('-').unwrap_or(text);
    let mut groups = text.split(separator);
    let head_ok = groups
        .next()
        .is_some_and(|head| (1..=3).contains(&head.len()) && head.chars().all(|c| c.is_ascii_digit()));
    head_ok && groups.all(|group| group.len() == 3 && group.chars().all(|c| c.is_ascii_digit()))
}

/// "45000.0", "45000.000"
fn has_zero_fraction(text: &str) -> bool {
    match text.split_once('.') {
        Some((integer, fraction)) => {
            !integer.is_empty()
                && integer.chars().all(|c| c.is_ascii_digit())
                && !fraction.is_empty()
                && fraction.chars().all(|c| c == '0')
        }
        None => false,
    }
}
