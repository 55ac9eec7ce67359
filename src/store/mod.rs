//! Day-dataset storage.

mod csv_store;

pub use csv_store::CsvDataStore;

/// Fixed header row of persisted datasets.
pub const CSV_HEADER: [&str; 3] = ["Period", "Volume (MWh)", "Price (EUR/MWh)"];
