use super::http::ProviderDescriptor;
use super::{ProviderError, RawRates, collect_rates};
use crate::core::Currency;
use serde::Deserialize;
use std::collections::HashMap;

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    name: "open.er-api.com",
    path: "/v6/latest/USD",
    query,
    parse,
};

// The endpoint always returns the full table for the base in the path.
fn query(_currencies: &[Currency]) -> Vec<(&'static str, String)> {
    Vec::new()
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    base_code: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    rates: Option<HashMap<String, Option<f64>>>,
}

fn parse(body: &str) -> Result<RawRates, ProviderError> {
    let data: LatestResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    if data.result != "success" {
        return Err(ProviderError::Rejected(
            data.error_type.unwrap_or(data.result),
        ));
    }
    if let Some(base) = data.base_code.as_deref() {
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
    fn test_parse_success() {
        let body = r#"{
            "result": "success",
            "provider": "https://www.exchangerate-api.com",
            "base_code": "USD",
            "time_last_update_unix": 1700000000,
            "rates": {"USD": 1, "AED": 3.6725, "UZS": 12345.67, "EUR": 0.92}
        }"#;
        let rates = parse(body).unwrap();
        assert_eq!(rates.get("AED"), Some(&3.6725));
        assert_eq!(rates.get("UZS"), Some(&12345.67));
        assert_eq!(rates.get("EUR"), Some(&0.92));
    }

    #[test]
    fn test_parse_error_result() {
        let body = r#"{"result": "error", "error-type": "unsupported-code"}"#;
        assert_eq!(
            parse(body).unwrap_err().to_string(),
            "Provider rejected the request: unsupported-code"
        );
    }

    #[test]
    fn test_parse_wrong_base() {
        let body = r#"{"result": "success", "base_code": "EUR", "rates": {"AED": 4.0}}"#;
        assert!(matches!(parse(body), Err(ProviderError::Rejected(_))));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse(r#"{"rates": {"AED": 3.67}}"#),
            Err(ProviderError::Parse(_))
        ));
        assert!(matches!(
            parse(r#"{"result": "success"}"#),
            Err(ProviderError::Parse(_))
        ));
    }
}
