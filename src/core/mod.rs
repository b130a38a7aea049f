//! Core types shared by the fetcher, converter and CLI

pub mod cache;
pub mod clock;
pub mod config;
pub mod currency;
pub mod log;

// Re-export main types for cleaner imports
pub use cache::{CachedRates, FxCache, RateSource};
pub use clock::{Clock, ManualClock, SystemClock};
pub use currency::{Currency, RateTable};
