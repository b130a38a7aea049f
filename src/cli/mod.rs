pub mod convert;
pub mod rates;
pub mod setup;
pub mod ui;

use crate::converter::CurrencyConverter;
use crate::core::CachedRates;

/// Fetches (or reuses) the rate table behind a spinner.
pub(crate) async fn load_rates(converter: &CurrencyConverter, refresh: bool) -> CachedRates {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let snapshot = if refresh {
        converter.fetcher().refresh().await
    } else {
        converter.fetcher().snapshot().await
    };
    pb.finish_and_clear();
    snapshot
}

/// One-line note about where the rates came from.
pub(crate) fn source_note(snapshot: &CachedRates) -> String {
    let note = format!(
        "Rates: {} (as of {})",
        snapshot.source,
        snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    match snapshot.source {
        crate::core::RateSource::Provider(_) => ui::style_text(&note, ui::StyleType::Subtle),
        _ => ui::style_text(&note, ui::StyleType::Warning),
    }
}
