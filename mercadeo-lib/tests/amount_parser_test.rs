use mercadeo_lib::amount::{parse_amount, parse_amount_str};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn test_documented_amount_formats() {
    assert_eq!(parse_amount_str("1.234.567"), 1_234_567);
    assert_eq!(parse_amount_str("1.234,56"), 1234);
    assert_eq!(parse_amount_str("$45,000"), 45_000);
    assert_eq!(parse_amount_str("$ 1.850.000"), 1_850_000);
    assert_eq!(parse_amount_str("45000.00"), 45_000);
    assert_eq!(parse_amount_str("120000"), 120_000);
}

#[test]
fn test_unparseable_and_negative_amounts_are_zero() {
    assert_eq!(parse_amount_str(""), 0);
    assert_eq!(parse_amount_str("sin valor"), 0);
    assert_eq!(parse_amount_str("-5000"), 0);
    assert_eq!(parse_amount(&json!(null)), 0);
    assert_eq!(parse_amount(&json!(true)), 0);
    assert_eq!(parse_amount(&json!(-12.5)), 0);
}

#[test]
fn test_numeric_cells_are_truncated() {
    assert_eq!(parse_amount(&json!(45000)), 45_000);
    assert_eq!(parse_amount(&json!(45000.99)), 45_000);
}

fn with_dot_groups(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::new();
    for (index, c) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

proptest! {
    #[test]
    fn test_plain_integers_parse_to_themselves(value in 0u32..u32::MAX) {
        prop_assert_eq!(parse_amount_str(&value.to_string()), i64::from(value));
    }

    #[test]
    fn test_peso_text_with_cents_is_truncated(pesos in 1_000u64..100_000_000, cents in 0u32..100) {
        let text = format!("$ {},{:02}", with_dot_groups(pesos), cents);
        prop_assert_eq!(parse_amount_str(&text), pesos as i64);
    }
}
