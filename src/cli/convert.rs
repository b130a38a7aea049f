use super::ui;
use crate::converter::{CurrencyConverter, convert_with};
use crate::core::Currency;
use crate::format::format_money;

/// Converts one amount and renders it with the rate source underneath.
pub async fn run(
    converter: &CurrencyConverter,
    from: Currency,
    to: Currency,
    amount: f64,
    refresh: bool,
) -> String {
    let snapshot = super::load_rates(converter, refresh).await;
    let result = convert_with(&snapshot.table, amount, from.code(), to.code());

    format!(
        "{amount:.4} {from} = {} {to}\n{}\n\n{}",
        ui::style_text(&format!("{result:.4}"), ui::StyleType::TotalValue),
        format_money(result, to.code(), converter.language()),
        super::source_note(&snapshot)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FxCache;
    use crate::core::SystemClock;
    use crate::fetcher::RateFetcher;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_convert_output() {
        console::set_colors_enabled(false);
        let fetcher = RateFetcher::new(Vec::new(), FxCache::new(), Arc::new(SystemClock))
            .with_offline(true);
        let converter = CurrencyConverter::new(Arc::new(fetcher));

        let output = run(&converter, Currency::Usd, Currency::Uzs, 25.0, false).await;
        assert!(output.starts_with("25.0000 USD = 315000.0000 UZS"));
        assert!(output.contains("UZS\u{a0}315,000.00"));
        assert!(output.contains("Rates: offline defaults"));
    }
}
