//! Market data providers.
//!
//! A provider produces a finite, ordered sequence of time-bucketed
//! volume/price points for one day. Variants are interchangeable and
//! selected by [`Provider::from_config`] at startup; provider-specific
//! parameters are validated there, not at fetch time.

mod fixed;
mod live;
mod synthetic;

pub use fixed::FixedProvider;
pub use live::LiveProvider;
pub use synthetic::SyntheticProvider;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{Config, ProviderKind};
use crate::error::{ConfigError, FetchError};

/// One time-bucketed market sample. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataPoint {
    /// Fixed-width period label, e.g. `12:00-12:15`.
    pub period: String,
    /// Traded volume in MWh; non-negative.
    pub volume: f64,
    /// Clearing price per MWh.
    pub price: f64,
}

/// Converts one tabular record into a data point.
///
/// Returns `None` unless the record carries exactly period, volume and
/// price with numeric volume and price. Both tabular read paths (the
/// persisted store and the live payload) go through here so the accepted
/// row shape cannot diverge between them.
pub(crate) fn point_from_record(record: &csv::StringRecord) -> Option<MarketDataPoint> {
    if record.len() != 3 {
        return None;
    }
    let volume = record[1].trim().parse().ok()?;
    let price = record[2].trim().parse().ok()?;
    Some(MarketDataPoint {
        period: record[0].trim().to_string(),
        volume,
        price,
    })
}

/// The configured market data provider.
#[derive(Debug)]
pub enum Provider {
    Synthetic(SyntheticProvider),
    Fixed(FixedProvider),
    Live(LiveProvider),
}

impl Provider {
    /// Builds and validates the provider selected by the configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the selected variant's parameters are
    /// incomplete or the underlying client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        match config.provider {
            ProviderKind::Synthetic => {
                Ok(Self::Synthetic(SyntheticProvider::new(config.synthetic_seed)))
            }
            ProviderKind::Fixed => Ok(Self::Fixed(FixedProvider::with_defaults())),
            ProviderKind::Live => {
                let url = config.provider_url.clone().ok_or(ConfigError::Missing {
                    var: crate::config::ENV_PROVIDER_URL,
                })?;
                let provider = LiveProvider::new(url).map_err(|e| ConfigError::Invalid {
                    var: crate::config::ENV_DATA_PROVIDER,
                    reason: e.to_string(),
                })?;
                Ok(Self::Live(provider))
            }
        }
    }

    /// Stable provider identifier, also persisted as node metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Synthetic(_) => "synthetic",
            Self::Fixed(_) => "fixed",
            Self::Live(_) => "live",
        }
    }

    /// Deterministic storage key for the given day's dataset. Consumed
    /// by the data store; the provider itself never touches storage.
    pub fn data_path(&self, day: NaiveDate) -> String {
        format!("{}_data_{}.csv", self.name(), day.format("%Y-%m-%d"))
    }

    /// Fetches the day's dataset.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` when the fetch fails or yields nothing; the
    /// caller keeps any previously cached dataset in place.
    pub async fn fetch_data(&self, day: NaiveDate) -> Result<Vec<MarketDataPoint>, FetchError> {
        match self {
            Self::Synthetic(p) => Ok(p.generate(day)),
            Self::Fixed(p) => Ok(p.dataset()),
            Self::Live(p) => p.fetch(day).await,
        }
    }
}
