//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use powercapd::config::{Config, ProviderKind, Strategy};
use powercapd::market::MarketDataPoint;

/// Builds a fake powercap hierarchy: one directory per zone, each with a
/// `constraint_0` limit/capacity pair.
pub fn fake_powercap_tree(root: &Path, zones: &[(&str, u64, u64)]) {
    for (name, limit_uw, capacity_uw) in zones {
        let zone = root.join(name);
        fs::create_dir_all(&zone).expect("zone dir");
        fs::write(
            zone.join("constraint_0_power_limit_uw"),
            limit_uw.to_string(),
        )
        .expect("write limit");
        fs::write(
            zone.join("constraint_0_max_power_uw"),
            capacity_uw.to_string(),
        )
        .expect("write capacity");
    }
}

/// Default controller configuration: market strategy, fixed provider,
/// reference max 40 MW(µW), floor 10 MW(µW), UTC.
pub fn test_config(powercap_root: PathBuf, data_dir: PathBuf) -> Config {
    Config {
        node_name: "node-1".to_string(),
        coordinator_url: "http://coordinator.invalid".to_string(),
        coordinator_token: None,
        reference_max_uw: 40_000_000.0,
        floor_uw: 10_000_000,
        stabilisation: Duration::from_secs(300),
        alpha: 4.0,
        strategy: Strategy::Market,
        provider: ProviderKind::Fixed,
        provider_url: None,
        data_dir,
        timezone: chrono_tz::UTC,
        synthetic_seed: 42,
        powercap_root,
    }
}

pub fn point(period: &str, volume: f64, price: f64) -> MarketDataPoint {
    MarketDataPoint {
        period: period.to_string(),
        volume,
        price,
    }
}

/// The two-period dataset used by the clamp scenarios.
pub fn scenario_dataset() -> Vec<MarketDataPoint> {
    vec![
        point("00:00-00:15", 66.3, 31.91),
        point("12:00-12:15", 93.8, 42.15),
    ]
}
