//! Supported currencies and the USD-relative rate table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Currency {
    Usd,
    Aed,
    Uzs,
}

impl Currency {
    /// Every supported currency, in display order.
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Aed, Currency::Uzs];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Aed => "AED",
            Currency::Uzs => "UZS",
        }
    }

    /// Approximate units per 1 USD, used when no provider can be reached.
    pub fn fallback_rate(&self) -> f64 {
        match self {
            Currency::Usd => 1.0,
            Currency::Aed => 3.6725,
            Currency::Uzs => 12600.0,
        }
    }

    /// Whether a provider response must carry this currency to be accepted.
    /// Currencies that are not required get filled in from the previous table.
    pub fn required_from_provider(&self) -> bool {
        matches!(self, Currency::Aed)
    }

    /// Lenient lookup used by the converter: `None` means unsupported.
    pub fn parse_code(code: &str) -> Option<Currency> {
        code.parse().ok()
    }

    /// Comma separated list of codes, as providers expect them in query strings.
    pub fn symbols(currencies: &[Currency]) -> String {
        currencies
            .iter()
            .map(Currency::code)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "AED" => Ok(Currency::Aed),
            "UZS" => Ok(Currency::Uzs),
            other => Err(anyhow::anyhow!("Unsupported currency code: {other}")),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = anyhow::Error;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

/// Units of each currency per 1 USD.
///
/// `USD` is pinned to exactly `1.0`. Every other entry is positive and finite;
/// anything else is treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    rates: BTreeMap<Currency, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(Currency::Usd, 1.0);
        Self { rates }
    }

    /// Hardcoded approximate rates for every supported currency.
    pub fn fallback() -> Self {
        Currency::ALL
            .iter()
            .map(|c| (*c, c.fallback_rate()))
            .collect()
    }

    /// Sets a rate. USD is ignored and invalid rates leave the entry absent.
    pub fn insert(&mut self, currency: Currency, rate: f64) -> bool {
        if currency == Currency::Usd {
            return true;
        }
        if !is_valid_rate(rate) {
            self.rates.remove(&currency);
            return false;
        }
        self.rates.insert(currency, rate);
        true
    }

    pub fn get(&self, currency: Currency) -> Option<f64> {
        self.rates.get(&currency).copied()
    }

    /// Looks up a rate by raw code; unknown codes yield `None`.
    pub fn get_code(&self, code: &str) -> Option<f64> {
        Currency::parse_code(code).and_then(|c| self.get(c))
    }

    pub fn contains(&self, currency: Currency) -> bool {
        self.rates.contains_key(&currency)
    }

    /// True when every supported currency has a rate.
    pub fn is_complete(&self) -> bool {
        Currency::ALL.iter().all(|c| self.contains(*c))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, f64)> + '_ {
        self.rates.iter().map(|(c, r)| (*c, *r))
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<(Currency, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (Currency, f64)>>(iter: I) -> Self {
        let mut table = RateTable::new();
        for (currency, rate) in iter {
            table.insert(currency, rate);
        }
        table
    }
}

fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency_codes() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" Aed ".parse::<Currency>().unwrap(), Currency::Aed);
        assert_eq!(Currency::parse_code("UZS"), Some(Currency::Uzs));
        assert_eq!(Currency::parse_code("ZZZ"), None);
        assert_eq!(Currency::parse_code(""), None);
        assert!(
            "EUR"
                .parse::<Currency>()
                .unwrap_err()
                .to_string()
                .contains("EUR")
        );
    }

    #[test]
    fn test_usd_is_always_one() {
        let table: RateTable = [(Currency::Usd, 2.5), (Currency::Aed, 3.67)]
            .into_iter()
            .collect();
        assert_eq!(table.get(Currency::Usd), Some(1.0));
        assert_eq!(table.get(Currency::Aed), Some(3.67));
        assert!(!table.is_complete());
    }

    #[test]
    fn test_invalid_rates_are_absent() {
        let mut table = RateTable::fallback();
        assert!(!table.insert(Currency::Aed, 0.0));
        assert!(!table.insert(Currency::Uzs, f64::NAN));
        assert_eq!(table.get(Currency::Aed), None);
        assert_eq!(table.get(Currency::Uzs), None);
        assert!(!table.insert(Currency::Aed, -3.0));
        assert!(!table.insert(Currency::Aed, f64::INFINITY));
    }

    #[test]
    fn test_fallback_table_is_complete() {
        let table = RateTable::fallback();
        assert!(table.is_complete());
        assert_eq!(table.get_code("aed"), Some(3.6725));
        assert_eq!(table.get_code("UZS"), Some(12600.0));
        assert_eq!(table.get_code("ZZZ"), None);
        assert_eq!(Currency::symbols(&Currency::ALL), "USD,AED,UZS");
    }
}
