//! Currency display for proposals

use rust_decimal::{Decimal, RoundingStrategy};

const SYMBOLS: &[(&str, &str)] = &[
    ("ZAR", "R"),
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("AUD", "A$"),
    ("CAD", "CA$"),
    ("NZD", "NZ$"),
    ("JPY", "¥"),
    ("CHF", "CHF "),
    ("INR", "₹"),
    ("NGN", "₦"),
    ("KES", "KSh"),
    ("BWP", "P"),
    ("NAD", "N$"),
];

fn symbol_for(code: &str) -> Option<&'static str> {
    SYMBOLS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, symbol)| *symbol)
}

/// Whole-unit amount with symbol and grouping (`R6,500`). Unknown codes
/// fall back to plain `CODE amount` (`XXX 1000`).
pub fn format_currency(value: Decimal, code: &str) -> String {
    let code = code.trim();
    let mut rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }

    match symbol_for(code) {
        Some(symbol) => {
            let sign = if rounded.is_sign_negative() { "-" } else { "" };
            format!("{}{}{}", sign, symbol, group_thousands(&rounded.abs().to_string()))
        }
        None => format!("{} {}", code, rounded),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_known_codes_use_symbol_and_grouping() {
        assert_eq!(format_currency(dec("6500"), "ZAR"), "R6,500");
        assert_eq!(format_currency(dec("1000"), "usd"), "$1,000");
        assert_eq!(format_currency(dec("1234567.5"), "EUR"), "€1,234,568");
        assert_eq!(format_currency(dec("999.49"), "GBP"), "£999");
        assert_eq!(format_currency(dec("0"), "ZAR"), "R0");
    }

    #[test]
    fn test_unknown_code_falls_back_to_plain_text() {
        assert_eq!(format_currency(dec("1000"), "XXX"), "XXX 1000");
        assert_eq!(format_currency(dec("1000.00"), "XXX"), "XXX 1000");
        assert_eq!(format_currency(dec("12.6"), "RANDS"), "RANDS 13");
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(format_currency(dec("-2500"), "ZAR"), "-R2,500");
        assert_eq!(format_currency(dec("-0.2"), "ZAR"), "R0");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }
}
