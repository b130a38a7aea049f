use super::ui;
use crate::converter::{CurrencyConverter, derive_from};
use crate::core::Currency;
use comfy_table::Cell;

/// Table of "1 BASE = X" for every supported currency.
pub async fn run(converter: &CurrencyConverter, base: Option<Currency>, refresh: bool) -> String {
    let snapshot = super::load_rates(converter, refresh).await;
    let base = base.unwrap_or(converter.display_currency());
    let (base, rates) = derive_from(&snapshot.table, Some(base.code()));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Per 1 {base}")),
    ]);
    for (currency, rate) in &rates {
        table.add_row(vec![
            Cell::new(currency.code()),
            ui::rate_cell(*rate, *currency == base),
        ]);
    }

    format!(
        "{}\n\n{}\n\n{}",
        ui::style_text(&format!("Exchange rates ({base})"), ui::StyleType::Title),
        table,
        super::source_note(&snapshot)
    )
}

pub fn list_currencies() -> String {
    format!(
        "{} {}",
        ui::style_text("Supported currency codes:", ui::StyleType::TotalLabel),
        Currency::ALL
            .iter()
            .map(Currency::code)
            .collect::<Vec<_>>()
            .join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FxCache, SystemClock};
    use crate::fetcher::RateFetcher;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_rates_table() {
        console::set_colors_enabled(false);
        let fetcher = RateFetcher::new(Vec::new(), FxCache::new(), Arc::new(SystemClock))
            .with_offline(true);
        let converter = CurrencyConverter::new(Arc::new(fetcher));

        let output = run(&converter, Some(Currency::Aed), false).await;
        assert!(output.contains("Exchange rates (AED)"));
        assert!(output.contains("Per 1 AED"));
        assert!(output.contains("1.000000"));
        assert!(output.contains("0.272294"));
        assert!(output.contains("3430.973451"));
    }

    #[test]
    fn test_list_currencies() {
        console::set_colors_enabled(false);
        assert_eq!(
            list_currencies(),
            "Supported currency codes: USD, AED, UZS"
        );
    }
}
