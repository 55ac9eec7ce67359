//! Environment-sourced startup configuration.
//!
//! The configuration is read exactly once at process start and is
//! immutable afterwards; no other component touches the environment.
//! Any change requires a restart.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::error::ConfigError;

/// Environment variable names.
pub const ENV_NODE_NAME: &str = "NODE_NAME";
pub const ENV_COORDINATOR_URL: &str = "COORDINATOR_URL";
pub const ENV_COORDINATOR_TOKEN: &str = "COORDINATOR_TOKEN";
pub const ENV_REFERENCE_MAX_POWER: &str = "REFERENCE_MAX_POWER";
pub const ENV_FLOOR_POWER: &str = "FLOOR_POWER";
pub const ENV_STABILISATION_TIME: &str = "STABILISATION_TIME";
pub const ENV_ALPHA: &str = "ALPHA";
pub const ENV_STRATEGY: &str = "POWER_STRATEGY";
pub const ENV_DATA_PROVIDER: &str = "DATA_PROVIDER";
pub const ENV_PROVIDER_URL: &str = "PROVIDER_URL";
pub const ENV_DATA_DIR: &str = "DATA_DIR";
pub const ENV_TIMEZONE: &str = "TIMEZONE";
pub const ENV_SYNTHETIC_SEED: &str = "SYNTHETIC_SEED";
pub const ENV_POWERCAP_ROOT: &str = "POWERCAP_ROOT";

/// Default values, as strings so defaults and overrides share one parse path.
const DEFAULT_REFERENCE_MAX_POWER: &str = "40000000";
const DEFAULT_FLOOR_POWER: &str = "10000000";
const DEFAULT_STABILISATION_TIME: &str = "300";
const DEFAULT_ALPHA: &str = "4";
const DEFAULT_STRATEGY: &str = "market";
const DEFAULT_DATA_PROVIDER: &str = "synthetic";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_SYNTHETIC_SEED: &str = "42";
const DEFAULT_POWERCAP_ROOT: &str = "/sys/devices/virtual/powercap/intel-rapl";

/// Which power-computation strategy the controller runs with.
///
/// Selected at startup; hot-switching is deliberately not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Rule-of-three scaling against the day's market volumes.
    Market,
    /// Deterministic time-of-day power curve.
    Curve,
}

/// Which market data provider variant feeds the data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Deterministic day-periodic generator with seeded jitter.
    Synthetic,
    /// Built-in fixed dataset, ignores the requested day.
    Fixed,
    /// HTTP fetch of a tabular document from `PROVIDER_URL`.
    Live,
}

/// Immutable snapshot of startup parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Node identifier, target for state synchronization.
    pub node_name: String,
    /// Base URL of the cluster coordination service.
    pub coordinator_url: String,
    /// Optional bearer token for the coordination service.
    pub coordinator_token: Option<String>,
    /// Reference maximum power in microwatts (calculator numerator).
    pub reference_max_uw: f64,
    /// Minimum applied power in microwatts; fallback on missing data.
    pub floor_uw: u64,
    /// Wait between successive adjustment cycles.
    pub stabilisation: Duration,
    /// Exponent of the time-of-day curve.
    pub alpha: f64,
    /// Power-computation strategy.
    pub strategy: Strategy,
    /// Market data provider variant.
    pub provider: ProviderKind,
    /// Base URL for the live provider.
    pub provider_url: Option<String>,
    /// Directory holding persisted day datasets.
    pub data_dir: PathBuf,
    /// Locale for period bucketing and midnight scheduling.
    pub timezone: Tz,
    /// Seed for the synthetic provider's jitter.
    pub synthetic_seed: u64,
    /// Root directory of the platform's powercap hierarchy.
    pub powercap_root: PathBuf,
}

impl Config {
    /// Loads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required variable is absent or any
    /// value fails to parse or validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same contract as [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let node_name = lookup(ENV_NODE_NAME).ok_or(ConfigError::Missing {
            var: ENV_NODE_NAME,
        })?;
        let coordinator_url = lookup(ENV_COORDINATOR_URL).ok_or(ConfigError::Missing {
            var: ENV_COORDINATOR_URL,
        })?;

        let reference_max_uw: f64 = parse_or_default(
            &lookup,
            ENV_REFERENCE_MAX_POWER,
            DEFAULT_REFERENCE_MAX_POWER,
        )?;
        if reference_max_uw <= 0.0 {
            return Err(invalid(ENV_REFERENCE_MAX_POWER, "must be > 0"));
        }

        let floor_uw: u64 = parse_or_default(&lookup, ENV_FLOOR_POWER, DEFAULT_FLOOR_POWER)?;
        if floor_uw == 0 {
            return Err(invalid(ENV_FLOOR_POWER, "must be > 0"));
        }

        let stabilisation_secs: u64 =
            parse_or_default(&lookup, ENV_STABILISATION_TIME, DEFAULT_STABILISATION_TIME)?;
        if stabilisation_secs == 0 {
            return Err(invalid(ENV_STABILISATION_TIME, "must be > 0 seconds"));
        }

        let alpha: f64 = parse_or_default(&lookup, ENV_ALPHA, DEFAULT_ALPHA)?;
        if alpha <= 0.0 {
            return Err(invalid(ENV_ALPHA, "must be > 0"));
        }

        let strategy = match lookup(ENV_STRATEGY)
            .unwrap_or_else(|| DEFAULT_STRATEGY.to_string())
            .to_lowercase()
            .as_str()
        {
            "market" => Strategy::Market,
            "curve" => Strategy::Curve,
            other => {
                return Err(invalid(
                    ENV_STRATEGY,
                    format!("unknown strategy \"{other}\", expected market or curve"),
                ));
            }
        };

        let provider = match lookup(ENV_DATA_PROVIDER)
            .unwrap_or_else(|| DEFAULT_DATA_PROVIDER.to_string())
            .to_lowercase()
            .as_str()
        {
            "synthetic" => ProviderKind::Synthetic,
            "fixed" => ProviderKind::Fixed,
            "live" => ProviderKind::Live,
            other => {
                return Err(invalid(
                    ENV_DATA_PROVIDER,
                    format!("unknown provider \"{other}\", expected synthetic, fixed or live"),
                ));
            }
        };

        let provider_url = lookup(ENV_PROVIDER_URL);
        if provider == ProviderKind::Live && provider_url.is_none() {
            return Err(invalid(
                ENV_PROVIDER_URL,
                "required when DATA_PROVIDER is live",
            ));
        }

        let tz_name = lookup(ENV_TIMEZONE).unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = tz_name
            .parse()
            .map_err(|_| invalid(ENV_TIMEZONE, format!("unknown timezone \"{tz_name}\"")))?;

        let synthetic_seed: u64 =
            parse_or_default(&lookup, ENV_SYNTHETIC_SEED, DEFAULT_SYNTHETIC_SEED)?;

        let data_dir = PathBuf::from(
            lookup(ENV_DATA_DIR).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );
        let powercap_root = PathBuf::from(
            lookup(ENV_POWERCAP_ROOT).unwrap_or_else(|| DEFAULT_POWERCAP_ROOT.to_string()),
        );

        Ok(Self {
            node_name,
            coordinator_url,
            coordinator_token: lookup(ENV_COORDINATOR_TOKEN),
            reference_max_uw,
            floor_uw,
            stabilisation: Duration::from_secs(stabilisation_secs),
            alpha,
            strategy,
            provider,
            provider_url,
            data_dir,
            timezone,
            synthetic_seed,
            powercap_root,
        })
    }
}

fn invalid(var: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.into(),
    }
}

fn parse_or_default<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let raw = lookup(var).unwrap_or_else(|| default.to_string());
    raw.parse()
        .map_err(|e| invalid(var, format!("cannot parse \"{raw}\": {e}")))
}
