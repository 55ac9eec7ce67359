//! CSV-backed data store for the current day's market dataset.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{FetchError, StoreError};
use crate::market::{MarketDataPoint, Provider, point_from_record};
use crate::store::CSV_HEADER;

/// Caches today's dataset in memory and persists it tabularly, one file
/// per day per provider. When a refresh fails, yesterday's file is the
/// fallback; the cache keeps whatever was loaded last.
#[derive(Debug)]
pub struct CsvDataStore {
    provider: Provider,
    data_dir: PathBuf,
    current: Vec<MarketDataPoint>,
    max_volume: f64,
}

impl CsvDataStore {
    pub fn new(provider: Provider, data_dir: PathBuf) -> Self {
        Self {
            provider,
            data_dir,
            current: Vec::new(),
            max_volume: 0.0,
        }
    }

    /// Identity of the bound provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// The cached dataset; empty until a load or refresh succeeds.
    pub fn current(&self) -> &[MarketDataPoint] {
        &self.current
    }

    /// The cached day's maximum volume; 0.0 when no dataset is loaded.
    pub fn max_volume(&self) -> f64 {
        self.max_volume
    }

    /// Loads the dataset for `day` into the cache.
    ///
    /// Prefers the persisted file; otherwise refreshes from the provider.
    /// If the refresh fails, falls back to yesterday's persisted file.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DataUnavailable` when neither today's data
    /// nor yesterday's file can be produced.
    pub async fn load(&mut self, day: NaiveDate) -> Result<usize, StoreError> {
        let path = self.path_for(day);
        if path.exists() {
            let data = read_csv(&path)?;
            info!(day = %day, points = data.len(), path = %path.display(), "loaded persisted dataset");
            return Ok(self.install(data));
        }

        match self.refresh(day).await {
            Ok(()) => Ok(self.current.len()),
            Err(e) => {
                warn!(day = %day, error = %e, "refresh failed, trying previous day's dataset");
                let yesterday = day.pred_opt().ok_or(StoreError::DataUnavailable { day })?;
                let fallback = self.path_for(yesterday);
                if !fallback.exists() {
                    return Err(StoreError::DataUnavailable { day });
                }
                // An unreadable fallback file is the same terminal signal
                // as a missing one.
                let data = match read_csv(&fallback) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!(day = %yesterday, error = %e, "fallback dataset unreadable");
                        return Err(StoreError::DataUnavailable { day });
                    }
                };
                info!(day = %yesterday, points = data.len(), "loaded fallback dataset");
                Ok(self.install(data))
            }
        }
    }

    /// Fetches a fresh dataset from the provider and persists it.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` when the fetch fails, yields nothing, or
    /// the dataset cannot be persisted. The previous cache stays intact.
    pub async fn refresh(&mut self, day: NaiveDate) -> Result<(), StoreError> {
        info!(day = %day, provider = self.provider.name(), "refreshing dataset");
        let data = self.provider.fetch_data(day).await?;
        if data.is_empty() {
            return Err(FetchError::Empty.into());
        }
        self.save(day, &data)?;
        info!(day = %day, points = data.len(), "dataset refreshed");
        Ok(())
    }

    /// Persists `data` under the provider+day key, overwriting any
    /// previous file, and installs it as the current cache.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` on I/O failure.
    pub fn save(&mut self, day: NaiveDate, data: &[MarketDataPoint]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            action: "create",
            path: self.data_dir.display().to_string(),
            source,
        })?;
        let path = self.path_for(day);
        write_csv(&path, data)?;
        self.install(data.to_vec());
        Ok(())
    }

    fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.data_dir.join(self.provider.data_path(day))
    }

    fn install(&mut self, data: Vec<MarketDataPoint>) -> usize {
        self.max_volume = data.iter().map(|p| p.volume).fold(0.0_f64, f64::max);
        self.current = data;
        self.current.len()
    }
}

/// Reads a persisted dataset. Malformed rows are skipped with a warning.
fn read_csv(path: &Path) -> Result<Vec<MarketDataPoint>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| StoreError::Csv {
            path: path.display().to_string(),
            source,
        })?;

    let mut data = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 2; // header is line 1
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path.display(), line, error = %e, "skipping unreadable row");
                continue;
            }
        };
        match point_from_record(&record) {
            Some(point) => data.push(point),
            None => warn!(path = %path.display(), line, "skipping malformed row"),
        }
    }
    Ok(data)
}

/// Writes the dataset with the fixed header: volumes at 1 decimal,
/// prices at 2.
fn write_csv(path: &Path, data: &[MarketDataPoint]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        action: "write",
        path: path.display().to_string(),
        source,
    };
    let csv_err = |source| StoreError::Csv {
        path: path.display().to_string(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = csv::WriterBuilder::new().from_writer(BufWriter::new(file));

    writer.write_record(CSV_HEADER).map_err(csv_err)?;
    for point in data {
        writer
            .write_record([
                point.period.as_str(),
                &format!("{:.1}", point.volume),
                &format!("{:.2}", point.price),
            ])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|e| io_err(e))?;
    Ok(())
}
