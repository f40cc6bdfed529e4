use crate::error::CoreError;

/// Parses a dollar amount such as `100`, `99.5` or `$1,250.00` into cents.
pub fn parse_amount_cents(raw: &str) -> Result<i64, CoreError> {
    let invalid = || CoreError::InvalidAmount(raw.trim().to_string());
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(invalid());
    }

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|ch| ch.is_ascii_digit())
        || !fraction.chars().all(|ch| ch.is_ascii_digit())
        || fraction.len() > 2
    {
        return Err(invalid());
    }

    let dollars: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    dollars
        .checked_mul(100)
        .and_then(|value| value.checked_add(cents))
        .ok_or_else(invalid)
}

pub fn format_amount_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::{format_amount_cents, parse_amount_cents};

    #[test]
    fn parses_plain_and_decorated_amounts() {
        assert_eq!(parse_amount_cents("100").unwrap(), 10_000);
        assert_eq!(parse_amount_cents("99.5").unwrap(), 9_950);
        assert_eq!(parse_amount_cents(" $1,250.00 ").unwrap(), 125_000);
        assert_eq!(parse_amount_cents(".75").unwrap(), 75);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_amount_cents("").is_err());
        assert!(parse_amount_cents("12.345").is_err());
        assert!(parse_amount_cents("ten").is_err());
        assert!(parse_amount_cents("-5").is_err());
    }

    #[test]
    fn formats_cents() {
        assert_eq!(format_amount_cents(125_005), "1250.05");
        assert_eq!(format_amount_cents(7), "0.07");
    }
}
