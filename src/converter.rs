//! Conversion between supported currencies, always routed through USD.

use crate::amount::RawAmount;
use crate::core::config::AppConfig;
use crate::core::{Currency, RateTable};
use crate::fetcher::RateFetcher;
use crate::format;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bridges stored amounts (base currency) and what a user sees (display
/// currency). Conversions never fail: unknown currencies leave the amount
/// unconverted.
#[derive(Clone)]
pub struct CurrencyConverter {
    fetcher: Arc<RateFetcher>,
    base_currency: Currency,
    display_currency: Currency,
    language: String,
}

impl CurrencyConverter {
    pub fn new(fetcher: Arc<RateFetcher>) -> Self {
        CurrencyConverter {
            fetcher,
            base_currency: Currency::Uzs,
            display_currency: Currency::Usd,
            language: "en".to_string(),
        }
    }

    pub fn from_config(config: &AppConfig, fetcher: Arc<RateFetcher>) -> Self {
        Self::new(fetcher)
            .with_base_currency(config.base_currency)
            .with_display_currency(config.display_currency)
            .with_language(&config.language)
    }

    pub fn with_base_currency(mut self, currency: Currency) -> Self {
        self.base_currency = currency;
        self
    }

    pub fn with_display_currency(mut self, currency: Currency) -> Self {
        self.display_currency = currency;
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn base_currency(&self) -> Currency {
        self.base_currency
    }

    pub fn display_currency(&self) -> Currency {
        self.display_currency
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn fetcher(&self) -> &Arc<RateFetcher> {
        &self.fetcher
    }

    /// Converts `amount` from `from` (default: base currency) to `to`
    /// (default: display currency).
    pub async fn convert<'a>(
        &self,
        amount: impl Into<RawAmount<'a>>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> f64 {
        let value = amount.into().or_zero();
        let from = normalize_code(from, self.base_currency);
        let to = normalize_code(to, self.display_currency);
        if from == to {
            return value;
        }
        let rates = self.fetcher.usd_rates().await;
        convert_with(&rates, value, &from, &to)
    }

    /// Rates for every supported currency relative to `base`. A missing or
    /// unsupported base is replaced by USD.
    pub async fn derive_rates(&self, base: Option<&str>) -> (Currency, BTreeMap<Currency, f64>) {
        let rates = self.fetcher.usd_rates().await;
        derive_from(&rates, base)
    }

    /// Stored amount in the base currency, as the user should see it.
    pub async fn to_display<'a>(&self, amount: impl Into<RawAmount<'a>>) -> f64 {
        self.convert(
            amount,
            Some(self.base_currency.code()),
            Some(self.display_currency.code()),
        )
        .await
    }

    /// Converts a user-entered amount into the base currency for persistence,
    /// rounded to two decimal places.
    pub async fn to_base_decimal<'a>(
        &self,
        amount: impl Into<RawAmount<'a>>,
        from: Option<&str>,
    ) -> Decimal {
        let from = from.unwrap_or(self.display_currency.code());
        let value = self
            .convert(amount, Some(from), Some(self.base_currency.code()))
            .await;
        match Decimal::from_f64(value) {
            Some(stored) => stored.round_dp(2),
            None => {
                warn!(value, "Amount does not fit a decimal, storing zero");
                Decimal::ZERO
            }
        }
    }

    /// Converts into the display currency and formats it in the configured
    /// language.
    pub async fn format_in_display<'a>(
        &self,
        amount: impl Into<RawAmount<'a>>,
        from: Option<&str>,
    ) -> String {
        let display = self.display_currency.code();
        let value = self.convert(amount, from, Some(display)).await;
        format::format_money(value, display, &self.language)
    }
}

fn normalize_code(code: Option<&str>, default: Currency) -> String {
    code.map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default.code().to_string())
}

/// Converts with a given table. Codes are matched case-insensitively; an
/// unknown code on either side returns `amount` unchanged.
pub fn convert_with(rates: &RateTable, amount: f64, from: &str, to: &str) -> f64 {
    let from = from.trim().to_uppercase();
    let to = to.trim().to_uppercase();
    if from == to {
        return amount;
    }
    match (rates.get_code(&from), rates.get_code(&to)) {
        (Some(rate_from), Some(rate_to)) => {
            let amount_usd = amount / rate_from;
            amount_usd * rate_to
        }
        _ => {
            debug!(%from, %to, "Unsupported currency, leaving amount unconverted");
            amount
        }
    }
}

/// Re-expresses a USD table relative to `base`.
pub fn derive_from(rates: &RateTable, base: Option<&str>) -> (Currency, BTreeMap<Currency, f64>) {
    let base = base
        .and_then(Currency::parse_code)
        .filter(|c| rates.contains(*c))
        .unwrap_or(Currency::Usd);
    let base_rate = rates.get(base).unwrap_or(1.0);

    let derived = Currency::ALL
        .iter()
        .map(|&currency| {
            let rate = if currency == base {
                1.0
            } else {
                rates.get(currency).map_or(0.0, |r| r / base_rate)
            };
            (currency, rate)
        })
        .collect();
    (base, derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FxCache, SystemClock};

    fn offline_converter() -> CurrencyConverter {
        let fetcher = RateFetcher::new(Vec::new(), FxCache::new(), Arc::new(SystemClock))
            .with_offline(true);
        CurrencyConverter::new(Arc::new(fetcher))
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_known_conversions() {
        let rates = RateTable::fallback();
        assert_eq!(convert_with(&rates, 100.0, "USD", "UZS"), 1_260_000.0);
        assert_eq!(convert_with(&rates, 12600.0, "UZS", "USD"), 1.0);
        assert_eq!(convert_with(&rates, 3.6725, "AED", "USD"), 1.0);
    }

    #[test]
    fn test_identity_conversion() {
        let rates = RateTable::fallback();
        for currency in Currency::ALL {
            for amount in [0.0, -5.25, 1e9, 0.1] {
                assert_eq!(
                    convert_with(&rates, amount, currency.code(), currency.code()),
                    amount
                );
            }
        }
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let rates = RateTable::fallback();
        for from in Currency::ALL {
            for to in Currency::ALL {
                for amount in [0.0, 1.0, 99.99, 123_456.78] {
                    let there = convert_with(&rates, amount, from.code(), to.code());
                    let back = convert_with(&rates, there, to.code(), from.code());
                    assert!(approx_eq(back, amount), "{from}->{to}: {amount} vs {back}");
                }
            }
        }
    }

    #[test]
    fn test_unknown_currency_fails_open() {
        let rates = RateTable::fallback();
        assert_eq!(convert_with(&rates, 100.0, "USD", "ZZZ"), 100.0);
        assert_eq!(convert_with(&rates, 100.0, "ZZZ", "UZS"), 100.0);
    }

    #[test]
    fn test_codes_are_case_insensitive() {
        let rates = RateTable::fallback();
        assert_eq!(convert_with(&rates, 1.0, "usd", " uzs "), 12600.0);
    }

    #[test]
    fn test_derive_rates_relative_to_aed() {
        let rates = RateTable::fallback();
        let (base, derived) = derive_from(&rates, Some("aed"));
        assert_eq!(base, Currency::Aed);
        assert_eq!(derived[&Currency::Aed], 1.0);
        assert!(approx_eq(derived[&Currency::Usd], 1.0 / 3.6725));
        assert!(approx_eq(derived[&Currency::Uzs], 12600.0 / 3.6725));
    }

    #[test]
    fn test_derive_rates_unsupported_base_is_usd() {
        let rates = RateTable::fallback();
        for base in [Some("ZZZ"), None, Some("")] {
            let (base, derived) = derive_from(&rates, base);
            assert_eq!(base, Currency::Usd);
            assert_eq!(derived[&Currency::Usd], 1.0);
            assert_eq!(derived[&Currency::Uzs], 12600.0);
        }
    }

    #[tokio::test]
    async fn test_convert_defaults_to_base_and_display() {
        let converter = offline_converter();
        assert_eq!(converter.convert(12600.0, None, None).await, 1.0);
        assert_eq!(converter.convert(12600.0, Some(""), Some("  ")).await, 1.0);
        assert_eq!(converter.to_display(25200.0).await, 2.0);
    }

    #[tokio::test]
    async fn test_convert_coerces_bad_amounts() {
        let converter = offline_converter();
        assert_eq!(converter.convert(None::<f64>, Some("USD"), Some("UZS")).await, 0.0);
        assert_eq!(converter.convert("", Some("USD"), Some("UZS")).await, 0.0);
        assert_eq!(converter.convert("abc", Some("USD"), Some("UZS")).await, 0.0);
        assert_eq!(converter.convert("1,000", Some("USD"), Some("UZS")).await, 12_600_000.0);
        assert_eq!(converter.convert(-5.0, Some("UZS"), Some("uzs")).await, -5.0);
        assert_eq!(converter.convert(100.0, Some("USD"), Some("ZZZ")).await, 100.0);
    }

    #[tokio::test]
    async fn test_to_base_decimal_rounds() {
        let converter = offline_converter();
        let stored = converter.to_base_decimal(1.5, Some("USD")).await;
        assert_eq!(stored, Decimal::new(1890000, 2));
        let from_aed = converter.to_base_decimal("1", Some("AED")).await;
        assert_eq!(from_aed, Decimal::new(343097, 2));
    }

    #[test_log::test(tokio::test)]
    async fn test_to_base_decimal_out_of_range_is_zero() {
        let converter = offline_converter();
        assert_eq!(converter.to_base_decimal(1e30, Some("UZS")).await, Decimal::ZERO);
        assert_eq!(converter.to_base_decimal(f64::INFINITY, Some("USD")).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_format_in_display() {
        let converter = offline_converter().with_display_currency(Currency::Usd);
        assert_eq!(converter.format_in_display(12600.0, None).await, "$1.00");

        let uz = offline_converter()
            .with_display_currency(Currency::Uzs)
            .with_language("uz");
        assert_eq!(
            uz.format_in_display(1.0, Some("USD")).await,
            "12\u{a0}600,00\u{a0}soʻm"
        );
    }
}
