//! Node metadata key namespaces.
//!
//! All values are stored as strings and round-trip parseable to their
//! semantic type. Actuation keys describe what the controller last did;
//! the lifecycle key marks one-time node initialization and is never
//! deleted by the controller.

/// Currently applied power limit in microwatts.
pub const CURRENT_LIMIT: &str = "powercap/limit-uw";

/// Maximum power observed across all constraints, the clamp ceiling.
pub const MAX_POWER: &str = "powercap/max-power-uw";

/// RFC 3339 timestamp of the last applied adjustment.
pub const LAST_UPDATE: &str = "powercap/last-update";

/// Identity of the market data provider feeding the controller.
pub const PROVIDER: &str = "powercap/provider";

/// Market period the last adjustment was computed from.
pub const MARKET_PERIOD: &str = "powercap/market-period";

/// Volume of that period, 1 decimal.
pub const MARKET_VOLUME: &str = "powercap/market-volume";

/// Price of that period, 2 decimals.
pub const MARKET_PRICE: &str = "powercap/market-price";

/// Lifecycle marker: present once the node's ceiling has been
/// established and persisted.
pub const INITIALIZED: &str = "power-controller/initialized";

/// Value written to the lifecycle marker.
pub const INITIALIZED_BY: &str = "powercapd";
