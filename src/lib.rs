pub mod amount;
pub mod cli;
pub mod converter;
pub mod core;
pub mod fetcher;
pub mod format;
pub mod providers;

use crate::converter::CurrencyConverter;
use crate::core::Currency;
use crate::core::config::AppConfig;
use crate::fetcher::RateFetcher;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Convert {
        from: String,
        to: String,
        amount: f64,
        refresh: bool,
    },
    Rates {
        base: Option<String>,
        refresh: bool,
    },
    List,
    Format {
        amount: String,
        currency: Option<String>,
        language: Option<String>,
    },
}

/// Runtime switches that override the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub offline: bool,
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    overrides: Overrides,
) -> Result<()> {
    info!("vantafx starting...");

    let mut config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    config.offline |= overrides.offline;
    debug!("Loaded config: {config:#?}");

    let fetcher = Arc::new(RateFetcher::from_config(&config)?);
    let converter = CurrencyConverter::from_config(&config, fetcher);

    let output = match command {
        AppCommand::Convert {
            from,
            to,
            amount,
            refresh,
        } => {
            let from = validate_code(&from)?;
            let to = validate_code(&to)?;
            let amount = validate_amount(amount)?;
            cli::convert::run(&converter, from, to, amount, refresh).await
        }
        AppCommand::Rates { base, refresh } => {
            let base = base.as_deref().map(validate_code).transpose()?;
            cli::rates::run(&converter, base, refresh).await
        }
        AppCommand::List => cli::rates::list_currencies(),
        AppCommand::Format {
            amount,
            currency,
            language,
        } => {
            let currency = match currency {
                Some(code) => validate_code(&code)?,
                None => config.display_currency,
            };
            let language = language.as_deref().unwrap_or(&config.language);
            format::format_money(amount.as_str(), currency.code(), language)
        }
    };

    println!("{output}");
    Ok(())
}

/// Codes typed by a user are checked strictly; the converter itself fails open.
fn validate_code(code: &str) -> Result<Currency> {
    code.parse::<Currency>().map_err(|_| {
        anyhow::anyhow!(
            "Unknown currency code: {}. Try `vantafx list` to see supported codes.",
            code.trim().to_uppercase()
        )
    })
}

fn validate_amount(amount: f64) -> Result<f64> {
    if amount.is_finite() {
        Ok(amount)
    } else {
        anyhow::bail!("Amount must be a finite number, got {amount}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert_eq!(validate_code(" aed").unwrap(), Currency::Aed);
        let err = validate_code("eur").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown currency code: EUR. Try `vantafx list` to see supported codes."
        );
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(-12.5).unwrap(), -12.5);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = validate_amount(bad).unwrap_err();
            assert!(err.to_string().starts_with("Amount must be a finite number"));
        }
    }

    #[tokio::test]
    async fn test_convert_rejects_non_finite_amount() {
        let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        std::fs::write(config_file.path(), "offline: true\n").expect("Failed to write config");
        let result = run_command(
            AppCommand::Convert {
                from: "USD".to_string(),
                to: "UZS".to_string(),
                amount: f64::NAN,
                refresh: false,
            },
            config_file.path().to_str(),
            Overrides::default(),
        )
        .await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Amount must be a finite number")
        );
    }
}
