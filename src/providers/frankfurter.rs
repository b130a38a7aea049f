use super::http::ProviderDescriptor;
use super::{ProviderError, RawRates, collect_rates};
use crate::core::Currency;
use serde::Deserialize;
use std::collections::HashMap;

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    name: "frankfurter.app",
    path: "/latest",
    query,
    parse,
};

// Frankfurter rejects `to` lists that contain the base currency.
fn query(currencies: &[Currency]) -> Vec<(&'static str, String)> {
    let targets: Vec<Currency> = currencies
        .iter()
        .copied()
        .filter(|c| *c != Currency::Usd)
        .collect();
    vec![
        ("from", Currency::Usd.code().to_string()),
        ("to", Currency::symbols(&targets)),
    ]
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    base: Option<String>,
    message: Option<String>,
    rates: Option<HashMap<String, Option<f64>>>,
}

fn parse(body: &str) -> Result<RawRates, ProviderError> {
    let data: LatestResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    if let Some(message) = data.message {
        return Err(ProviderError::Rejected(message));
    }
    if let Some(base) = data.base.as_deref() {
        if !base.eq_ignore_ascii_case(Currency::Usd.code()) {
            return Err(ProviderError::Rejected(format!("unexpected base {base}")));
        }
    }

    data.rates
        .map(collect_rates)
        .ok_or_else(|| ProviderError::Parse("no rates in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_skips_base() {
        let params = query(&Currency::ALL);
        assert_eq!(
            params,
            vec![("from", "USD".to_string()), ("to", "AED,UZS".to_string())]
        );
    }

    #[test]
    fn test_parse_partial_rates() {
        let body = r#"{"amount": 1.0, "base": "USD", "date": "2024-05-10", "rates": {"AED": 3.6725}}"#;
        let rates = parse(body).unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates.get("AED"), Some(&3.6725));
        assert!(rates.get("USD").is_none());
    }

    #[test]
    fn test_parse_not_found() {
        assert_eq!(
            parse(r#"{"message": "not found"}"#).unwrap_err().to_string(),
            "Provider rejected the request: not found"
        );
    }
}
