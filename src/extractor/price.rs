use crate::app::{Result, SkimmerError};

/// Parse display price text such as `$1,299.99` into a number.
///
/// Currency text around the amount is removed. `,` is accepted only as a
/// thousands separator in front of three-digit groups, so decimal-comma
/// amounts like `1,29 €` are rejected rather than misread.
pub fn parse_price(text: &str) -> Result<f64> {
    let invalid = || SkimmerError::InvalidPrice(text.to_string());

    let amount = text
        .trim()
        .trim_matches(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'));

    let (integer, fraction) = match amount.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (amount, None),
    };
    if fraction.is_some_and(|fraction| fraction.contains(',')) {
        return Err(invalid());
    }

    let integer = strip_thousands(integer).ok_or_else(invalid)?;
    let cleaned = match fraction {
        Some(fraction) => format!("{}.{}", integer, fraction),
        None => integer,
    };

    match cleaned.parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(invalid()),
    }
}

/// Drop thousands separators, or `None` if the commas are not 3-digit grouping.
fn strip_thousands(integer: &str) -> Option<String> {
    let mut groups = integer.split(',');
    let lead = groups.next()?.trim_start_matches('-');
    let mut grouped = false;

    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        grouped = true;
    }
    if grouped && (lead.is_empty() || lead.len() > 3) {
        return None;
    }

    Some(integer.replace(',', ""))
}

/// Join a split price into `whole.fraction` text.
pub(crate) fn join_split_price(whole: &str, fraction: &str) -> String {
    let whole = whole.trim().trim_end_matches(['.', ',']);
    format!("{}.{}", whole, fraction.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_symbol() {
        assert_eq!(parse_price("19.99").unwrap(), 19.99);
        assert_eq!(parse_price("$19.99").unwrap(), 19.99);
        assert_eq!(parse_price("  $10.00 \n").unwrap(), 10.0);
    }

    #[test]
    fn test_parse_thousands_separator() {
        assert_eq!(parse_price("$1,299.50").unwrap(), 1299.5);
        assert_eq!(parse_price("US$ 12,000").unwrap(), 12000.0);
    }

    #[test]
    fn test_parse_trailing_currency_code() {
        assert_eq!(parse_price("249.00 USD").unwrap(), 249.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "N/A", "$", "12abc34", "Currently unavailable", "1.2.3", "1 299"] {
            let err = parse_price(bad).unwrap_err();
            assert!(
                matches!(err, SkimmerError::InvalidPrice(_)),
                "expected ValueError for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_rejects_decimal_comma() {
        for bad in ["1,29 €", "1.299,00 €", "12,5", "1,2345.00", "1234,567"] {
            let err = parse_price(bad).unwrap_err();
            assert!(
                matches!(err, SkimmerError::InvalidPrice(_)),
                "expected ValueError for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_grouped_thousands() {
        assert_eq!(parse_price("$1,234,567.89").unwrap(), 1234567.89);
        assert_eq!(parse_price("999,000").unwrap(), 999000.0);
    }

    #[test]
    fn test_join_split_price() {
        assert_eq!(join_split_price("19", "99"), "19.99");
        assert_eq!(join_split_price("19.", "99"), "19.99");
        assert_eq!(join_split_price(" 1,299 ", " 00 "), "1,299.00");
        assert_eq!(parse_price(&join_split_price("1,299.", "00")).unwrap(), 1299.0);
    }
}
