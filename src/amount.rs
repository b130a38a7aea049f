//! Lenient money inputs coming from forms, templates and the database.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt::Display;

/// An amount as handed over by a caller, before coercion to a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawAmount<'a> {
    Missing,
    Number(f64),
    Decimal(Decimal),
    Text(&'a str),
}

impl RawAmount<'_> {
    /// The numeric value, if there is a sensible one.
    ///
    /// Missing and blank inputs count as zero. Text may carry thousands
    /// separators. Unparsable text and non-finite numbers yield `None`.
    pub fn value(&self) -> Option<f64> {
        match self {
            RawAmount::Missing => Some(0.0),
            RawAmount::Number(n) => n.is_finite().then_some(*n),
            RawAmount::Decimal(d) => d.to_f64(),
            RawAmount::Text(s) => {
                let cleaned = s.trim().replace(',', "");
                if cleaned.is_empty() {
                    return Some(0.0);
                }
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
    }

    /// The value used for arithmetic: invalid input coerces to zero.
    pub fn or_zero(&self) -> f64 {
        self.value().unwrap_or(0.0)
    }
}

impl Display for RawAmount<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawAmount::Missing => write!(f, "0"),
            RawAmount::Number(n) => write!(f, "{n}"),
            RawAmount::Decimal(d) => write!(f, "{d}"),
            RawAmount::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for RawAmount<'_> {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

impl From<i64> for RawAmount<'_> {
    fn from(value: i64) -> Self {
        RawAmount::Number(value as f64)
    }
}

impl From<Decimal> for RawAmount<'_> {
    fn from(value: Decimal) -> Self {
        RawAmount::Decimal(value)
    }
}

impl<'a> From<&'a str> for RawAmount<'a> {
    fn from(value: &'a str) -> Self {
        RawAmount::Text(value)
    }
}

impl<'a, T> From<Option<T>> for RawAmount<'a>
where
    T: Into<RawAmount<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(RawAmount::Missing, Into::into)
    }
}

/// Parses user-entered money such as `"1,234.50"`; blank or invalid is zero.
pub fn parse_money(input: &str) -> f64 {
    RawAmount::Text(input).or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_missing_and_blank_are_zero() {
        assert_eq!(RawAmount::Missing.value(), Some(0.0));
        assert_eq!(RawAmount::from(None::<f64>).value(), Some(0.0));
        assert_eq!(RawAmount::from("   ").value(), Some(0.0));
    }

    #[test]
    fn test_text_values() {
        assert_eq!(RawAmount::from("1,234.5").value(), Some(1234.5));
        assert_eq!(RawAmount::from(" -42 ").value(), Some(-42.0));
        assert_eq!(RawAmount::from("not-a-number").value(), None);
        assert_eq!(RawAmount::from("not-a-number").or_zero(), 0.0);
        assert_eq!(RawAmount::from("inf").value(), None);
        assert_eq!(RawAmount::from(Some("7")).value(), Some(7.0));
    }

    #[test]
    fn test_numeric_values() {
        assert_eq!(RawAmount::from(12.5).value(), Some(12.5));
        assert_eq!(RawAmount::from(3_i64).value(), Some(3.0));
        assert_eq!(RawAmount::from(f64::NAN).value(), None);
        let d = Decimal::from_str("1999.99").unwrap();
        assert_eq!(RawAmount::from(d).value(), Some(1999.99));
    }

    #[test]
    fn test_display_keeps_raw_text() {
        assert_eq!(RawAmount::from("abc").to_string(), "abc");
        assert_eq!(RawAmount::from(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("1,234"), 1234.0);
        assert_eq!(parse_money("12,600.75"), 12600.75);
        assert_eq!(parse_money(""), 0.0);
        assert_eq!(parse_money("twelve"), 0.0);
    }
}
