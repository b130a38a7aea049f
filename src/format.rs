//! Human-readable money strings.
//!
//! [`format_money`] goes through a locale-aware [`CurrencyFormatter`] first and
//! degrades to `"{value:.2} {CODE}"`, then to `"{raw} {CODE}"`, so it always
//! returns something printable.

use crate::amount::RawAmount;
use std::fmt::Display;
use thiserror::Error;
use tracing::debug;

const NBSP: &str = "\u{a0}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    EnUs,
    UzUz,
}

impl Locale {
    /// English gets `en_US`; every other language is shown the Uzbek way.
    pub fn from_language(language: &str) -> Self {
        if language.trim().eq_ignore_ascii_case("en") {
            Locale::EnUs
        } else {
            Locale::UzUz
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Locale::EnUs => "en_US",
            Locale::UzUz => "uz_UZ",
        }
    }

    fn group_separator(&self) -> &'static str {
        match self {
            Locale::EnUs => ",",
            Locale::UzUz => NBSP,
        }
    }

    fn decimal_separator(&self) -> &'static str {
        match self {
            Locale::EnUs => ".",
            Locale::UzUz => ",",
        }
    }

    fn symbol<'a>(&self, code: &'a str) -> &'a str {
        match (self, code) {
            (Locale::EnUs, "USD") => "$",
            (Locale::UzUz, "USD") => "US$",
            (Locale::UzUz, "UZS") => "soʻm",
            _ => code,
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("Cannot format non-finite value {0}")]
    NonFinite(f64),
    #[error("Missing currency code")]
    MissingCurrency,
}

pub trait CurrencyFormatter: Send + Sync {
    fn format_currency(&self, value: f64, currency: &str, locale: Locale)
    -> Result<String, FormatError>;
}

/// CLDR-style patterns for the locales the app ships with.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocaleFormatter;

impl CurrencyFormatter for LocaleFormatter {
    fn format_currency(
        &self,
        value: f64,
        currency: &str,
        locale: Locale,
    ) -> Result<String, FormatError> {
        if !value.is_finite() {
            return Err(FormatError::NonFinite(value));
        }
        if currency.is_empty() {
            return Err(FormatError::MissingCurrency);
        }

        let (negative, number) = fixed_point(value, 2, locale.group_separator(), locale.decimal_separator());
        let sign = if negative { "-" } else { "" };
        let symbol = locale.symbol(currency);

        Ok(match locale {
            // `$1,234.56`, `AED 1,234.56`
            Locale::EnUs if symbol != currency => format!("{sign}{symbol}{number}"),
            Locale::EnUs => format!("{sign}{symbol}{NBSP}{number}"),
            // `1 234,56 soʻm`
            Locale::UzUz => format!("{sign}{number}{NBSP}{symbol}"),
        })
    }
}

/// Formats with the built-in locale data.
pub fn format_money<'a>(amount: impl Into<RawAmount<'a>>, currency: &str, language: &str) -> String {
    format_money_with(&LocaleFormatter, amount, currency, language)
}

/// Formats with a caller-supplied facility, falling back on any failure.
pub fn format_money_with<'a>(
    formatter: &dyn CurrencyFormatter,
    amount: impl Into<RawAmount<'a>>,
    currency: &str,
    language: &str,
) -> String {
    let amount = amount.into();
    let currency = currency.trim().to_uppercase();
    let locale = Locale::from_language(language);

    let Some(value) = amount.value() else {
        debug!(%amount, "Amount is not a number, printing it as is");
        return format!("{amount} {currency}");
    };

    match formatter.format_currency(value, &currency, locale) {
        Ok(formatted) if !formatted.is_empty() => formatted,
        Ok(_) => format!("{value:.2} {currency}"),
        Err(e) => {
            debug!(error = %e, %locale, "Locale formatting failed, using plain format");
            format!("{value:.2} {currency}")
        }
    }
}

/// Plain grouped number such as `1,234` for tables and inputs. Returns the
/// input untouched when it is not a number.
pub fn format_grouped<'a>(amount: impl Into<RawAmount<'a>>, decimals: usize) -> String {
    let amount = amount.into();
    match amount.value() {
        Some(value) => {
            let (negative, number) = fixed_point(value, decimals, ",", ".");
            if negative { format!("-{number}") } else { number }
        }
        None => amount.to_string(),
    }
}

/// Renders `|value|` with `decimals` places and grouped thousands. The flag
/// says whether a minus sign is needed; `-0.00` is not negative.
fn fixed_point(value: f64, decimals: usize, group: &str, decimal: &str) -> (bool, String) {
    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(rendered.len() + digits.len() / 3 * group.len());
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(group);
        }
        grouped.push(*digit);
    }
    if let Some(frac) = frac_part {
        grouped.push_str(decimal);
        grouped.push_str(frac);
    }

    let is_zero = rendered.chars().all(|c| c == '0' || c == '.');
    (value.is_sign_negative() && !is_zero, grouped)
}
