use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.\-]").unwrap());
static LEADING_RATING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)").unwrap());

/// Highest star rating the marketplace hands out
pub const MAX_STAR_RATING: f64 = 5.0;

/// Extract a decimal from noisy marketplace text such as `"₹1,299.00"`.
///
/// Every character other than ASCII digits, `.` and `-` is dropped before
/// parsing. Returns `None` when nothing parseable remains.
pub fn parse_decimal_value(text: &str) -> Option<Decimal> {
    let cleaned = NON_NUMERIC.replace_all(text, "");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Read a star rating such as `"4.3"` or `"4.5 out of 5 stars"`.
///
/// Only the leading number counts. Text that does not start with one, or a
/// value above [`MAX_STAR_RATING`], gives `None`.
pub fn parse_star_rating(text: &str) -> Option<f64> {
    let rating: f64 = LEADING_RATING.captures(text)?.get(1)?.as_str().parse().ok()?;
    (rating <= MAX_STAR_RATING).then_some(rating)
}

/// Read a newline separated ASIN list. Blank lines and `#` comments are skipped.
pub fn read_asin_list(path: &Path) -> std::io::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use test_case::test_case;

    #[test_case("₹1,299.00", Some(dec!(1299.00)) ; "rupee with thousands separator")]
    #[test_case("$19.99", Some(dec!(19.99)) ; "dollar")]
    #[test_case("4.5 out of 5 stars", Some(dec!(4.55)) ; "rating text keeps every digit")]
    #[test_case("-12", Some(dec!(-12)) ; "negative")]
    #[test_case("799", Some(dec!(799)) ; "plain integer")]
    #[test_case("", None ; "empty")]
    #[test_case("N/A", None ; "no digits")]
    #[test_case("1.2.3", None ; "two decimal points")]
    fn parses_noisy_prices(input: &str, expected: Option<Decimal>) {
        assert_eq!(parse_decimal_value(input), expected);
    }

    #[test_case("4.3", Some(4.3) ; "bare number")]
    #[test_case("4.5 out of 5 stars", Some(4.5) ; "marketplace phrasing")]
    #[test_case(" 5 ", Some(5.0) ; "padded integer")]
    #[test_case("45", None ; "above the scale")]
    #[test_case("out of 5", None ; "no leading number")]
    #[test_case("", None ; "empty")]
    fn parses_star_ratings(input: &str, expected: Option<f64>) {
        assert_eq!(parse_star_rating(input), expected);
    }

    #[test]
    fn asin_list_skips_blanks_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# seed list\nB09QXCWLNS\n\n  B07L9FW9GF  \n").unwrap();
        let asins = read_asin_list(file.path()).unwrap();
        assert_eq!(asins, vec!["B09QXCWLNS", "B07L9FW9GF"]);
    }
}
