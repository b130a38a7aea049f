use super::http::ProviderDescriptor;
use super::{ProviderError, RawRates, collect_rates};
use crate::core::Currency;
use serde::Deserialize;
use std::collections::HashMap;

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    name: "exchangerate.host",
    path: "/latest",
    query,
    parse,
};

fn query(currencies: &[Currency]) -> Vec<(&'static str, String)> {
    vec![
        ("base", Currency::Usd.code().to_string()),
        ("symbols", Currency::symbols(currencies)),
    ]
}

// Older deployments answer with `rates`, newer ones with `quotes` keyed by
// the concatenated pair (`USDAED`).
#[derive(Debug, Deserialize)]
struct LatestResponse {
    success: Option<bool>,
    rates: Option<HashMap<String, Option<f64>>>,
    quotes: Option<HashMap<String, Option<f64>>>,
    error: Option<serde_json::Value>,
}

fn parse(body: &str) -> Result<RawRates, ProviderError> {
    let data: LatestResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    if data.success == Some(false) {
        let reason = data
            .error
            .map(|e| match e {
                serde_json::Value::String(s) => s,
                serde_json::Value::Object(o) => o
                    .get("info")
                    .or_else(|| o.get("type"))
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .unwrap_or_else(|| "unknown error".to_string()),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(ProviderError::Rejected(reason));
    }

    if let Some(rates) = data.rates {
        return Ok(collect_rates(rates));
    }

    if let Some(quotes) = data.quotes {
        let usd = Currency::Usd.code();
        let rates = quotes
            .into_iter()
            .map(|(pair, rate)| {
                let code = match pair.strip_prefix(usd) {
                    Some(rest) if !rest.is_empty() => rest.to_string(),
                    _ => pair,
                };
                (code, rate)
            })
            .collect();
        return Ok(collect_rates(rates));
    }

    Err(ProviderError::Parse("no rates in response".to_string()))
}
