//! Integer-cents money handling. Arithmetic never leaves `i64` cents; decimals
//! appear only while parsing or formatting localized BRL strings.

use std::str::FromStr;

use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;

/// Parses a localized currency string (`"R$ 1.234,56"`) into integer cents.
///
/// Strips the currency symbol and thousands separators, converts the decimal
/// comma, and rounds half-up. Empty or unparseable input yields 0.
pub fn parse_brl(input: &str) -> i64 {
    let normalized: String = input
        .replace("R$", "")
        .replace('.', "")
        .replace(',', ".")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let Ok(value) = Decimal::from_str(normalized.trim()) else {
        return 0;
    };

    (value * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// Formats integer cents as a localized BRL string, the inverse of
/// [`parse_brl`].
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("{}R$ {},{:02}", sign, grouped, frac)
}

/// Half-up percentage of a cents amount, with the rate in basis points.
pub fn apply_bps(cents: i64, bps: i64) -> i64 {
    (cents * bps + 5_000) / 10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_brl_string() {
        assert_eq!(parse_brl("R$ 1.234,56"), 123456);
        assert_eq!(parse_brl("R$ 0,99"), 99);
        assert_eq!(parse_brl("R$ 10"), 1000);
    }

    #[test]
    fn parses_without_symbol_or_grouping() {
        assert_eq!(parse_brl("1234,56"), 123456);
        assert_eq!(parse_brl("1234"), 123400);
    }

    #[test]
    fn garbage_and_empty_input_yield_zero() {
        assert_eq!(parse_brl(""), 0);
        assert_eq!(parse_brl("   "), 0);
        assert_eq!(parse_brl("abc"), 0);
        assert_eq!(parse_brl("R$"), 0);
    }

    #[test]
    fn format_is_inverse_of_parse() {
        for cents in [0, 99, 100, 5000, 123456, 100000000] {
            assert_eq!(parse_brl(&format_brl(cents)), cents);
        }
    }

    #[test]
    fn format_groups_thousands() {
        assert_eq!(format_brl(123456), "R$ 1.234,56");
        assert_eq!(format_brl(100000000), "R$ 1.000.000,00");
        assert_eq!(format_brl(5), "R$ 0,05");
    }

    #[test]
    fn bps_rounds_half_up() {
        assert_eq!(apply_bps(10000, 300), 300);
        // 1.5% of 105 = 1.575 -> 2
        assert_eq!(apply_bps(105, 150), 2);
    }
}
