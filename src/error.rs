//! Error taxonomy for the controller.
//!
//! Startup failures (`ConfigError`, `DiscoveryError`, `InitError`) are
//! fatal. Everything else is recoverable: the next scheduled cycle is the
//! retry mechanism, so no variant here carries retry state.

use thiserror::Error;

/// Invalid or missing startup configuration. Fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not set")]
    Missing { var: &'static str },

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Hardware domain enumeration failed. Fatal: without a usable power
/// domain the controller cannot run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("cannot read powercap root {path}: {source}")]
    Root {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read domain directory {path}: {source}")]
    Domain {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no usable power domains under {path}")]
    NoDomains { path: String },

    #[error("no valid max power values found")]
    NotFound,
}

/// A provider fetch attempt failed. Recoverable: the previously cached
/// dataset stays in place.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("provider returned no data points")]
    Empty,

    #[error("request failed: {0}")]
    Http(String),

    #[error("malformed payload: {0}")]
    Payload(String),
}

/// Dataset load or persistence failed. Recoverable: the controller
/// degrades to floor behavior until data becomes available.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no dataset available for {day} or the previous day")]
    DataUnavailable { day: chrono::NaiveDate },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("cannot {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Remote node-state read or write failed. Recoverable: rejected writes
/// are dropped and the next cycle publishes fresh values.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("concurrent modification rejected by coordinator")]
    Conflict,

    #[error("coordinator request failed: {0}")]
    Transport(String),

    #[error("coordinator returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Node initialization failed during startup. Fatal.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
