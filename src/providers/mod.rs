//! Remote sources of USD-based exchange rates.
//!
//! Every provider is a [`http::HttpRateProvider`] driven by a
//! [`http::ProviderDescriptor`] describing its endpoint, query and response
//! shape. The fetcher only sees the [`RateProvider`] trait, so tests can slot in
//! fakes.

pub mod exchangerate_host;
pub mod frankfurter;
pub mod http;
pub mod open_er_api;

use crate::core::Currency;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Currency code to units per 1 USD, exactly as a provider reported it.
pub type RawRates = HashMap<String, f64>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid provider URL: {0}")]
    Url(String),
    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),
    #[error("Failed to parse JSON response: {0}")]
    Parse(String),
    #[error("Provider rejected the request: {0}")]
    Rejected(String),
    #[error("Response is missing required currency {0}")]
    MissingCurrency(Currency),
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_usd_rates(&self) -> Result<RawRates, ProviderError>;
}

/// Drops `null` entries some providers send for unknown symbols.
pub(crate) fn collect_rates(rates: HashMap<String, Option<f64>>) -> RawRates {
    rates
        .into_iter()
        .filter_map(|(code, rate)| rate.map(|r| (code.to_uppercase(), r)))
        .collect()
}
