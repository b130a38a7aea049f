use super::{ProviderError, RateProvider, RawRates};
use super::{exchangerate_host, frankfurter, open_er_api};
use crate::core::Currency;
use crate::core::config::{AppConfig, ProviderConfig, ProviderKind};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, instrument};

/// Builds the query string for the currencies being requested.
pub type QueryBuilder = fn(&[Currency]) -> Vec<(&'static str, String)>;

/// Turns a response body into raw rates, rejecting provider-level errors.
pub type ResponseParser = fn(&str) -> Result<RawRates, ProviderError>;

/// Static description of one JSON rate endpoint.
#[derive(Debug, Clone, Copy)]
pub struct ProviderDescriptor {
    pub name: &'static str,
    pub path: &'static str,
    pub query: QueryBuilder,
    pub parse: ResponseParser,
}

impl ProviderDescriptor {
    pub fn for_kind(kind: ProviderKind) -> &'static ProviderDescriptor {
        match kind {
            ProviderKind::ExchangerateHost => &exchangerate_host::DESCRIPTOR,
            ProviderKind::OpenErApi => &open_er_api::DESCRIPTOR,
            ProviderKind::Frankfurter => &frankfurter::DESCRIPTOR,
        }
    }
}

pub struct HttpRateProvider {
    descriptor: &'static ProviderDescriptor,
    base_url: String,
    client: reqwest::Client,
    currencies: Vec<Currency>,
}

impl HttpRateProvider {
    pub fn new(
        descriptor: &'static ProviderDescriptor,
        base_url: &str,
        client: reqwest::Client,
    ) -> Self {
        HttpRateProvider {
            descriptor,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            currencies: Currency::ALL.to_vec(),
        }
    }

    pub fn from_config(provider: &ProviderConfig, client: reqwest::Client) -> Self {
        Self::new(
            ProviderDescriptor::for_kind(provider.kind),
            provider.base_url(),
            client,
        )
    }

    pub fn url(&self) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, self.descriptor.path))
            .map_err(|e| ProviderError::Url(format!("{}: {e}", self.base_url)))?;
        let params = (self.descriptor.query)(&self.currencies);
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        self.descriptor.name
    }

    #[instrument(name = "RateFetch", skip(self), fields(provider = %self.descriptor.name))]
    async fn fetch_usd_rates(&self) -> Result<RawRates, ProviderError> {
        let url = self.url()?;
        debug!("Requesting rates from {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let text = response.text().await?;
        let rates = (self.descriptor.parse)(&text)?;
        debug!(count = rates.len(), "Parsed rates");
        Ok(rates)
    }
}

/// Shared client carrying the user agent and per-request timeout.
pub fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}

/// Providers in the configured priority order.
pub fn providers_from_config(config: &AppConfig) -> Result<Vec<Box<dyn RateProvider>>> {
    let client = build_client(&config.user_agent, config.request_timeout())?;
    Ok(config
        .providers
        .iter()
        .map(|p| Box::new(HttpRateProvider::from_config(p, client.clone())) as Box<dyn RateProvider>)
        .collect())
}
