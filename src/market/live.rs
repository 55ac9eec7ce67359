//! Live market data over HTTP.
//!
//! Fetches a tabular CSV document (`period,volume,price` with a header
//! row) from the configured endpoint. Vendor-specific document scraping
//! belongs in whatever serves that endpoint, not here.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use tracing::warn;

use crate::error::FetchError;
use crate::market::{MarketDataPoint, point_from_record};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the day's dataset from a remote endpoint.
#[derive(Debug)]
pub struct LiveProvider {
    client: Client,
    base_url: String,
}

impl LiveProvider {
    /// Builds the provider and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` if the client cannot be constructed.
    pub fn new(base_url: String) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    /// Fetches and parses the dataset for `day`. A single attempt, no
    /// internal retry; the next scheduled refresh is the retry mechanism.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` on transport failure, a non-success status,
    /// or a payload with no valid rows.
    pub async fn fetch(&self, day: NaiveDate) -> Result<Vec<MarketDataPoint>, FetchError> {
        let url = format!("{}?delivery_date={}", self.base_url, day.format("%Y-%m-%d"));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(format!(
                "{url} returned status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        parse_csv_body(&body)
    }
}

/// Parses a `period,volume,price` CSV body, skipping the header row and
/// any malformed rows.
fn parse_csv_body(body: &str) -> Result<Vec<MarketDataPoint>, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut data = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 2; // header is line 1
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(line, error = %e, "skipping unreadable row");
                continue;
            }
        };
        match point_from_record(&record) {
            Some(point) => data.push(point),
            None => warn!(line, "skipping malformed row"),
        }
    }

    if data.is_empty() {
        return Err(FetchError::Payload(
            "no valid data rows in response".to_string(),
        ));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_body() {
        let body = "Period,Volume (MWh),Price (EUR/MWh)\n\
                    00:00-00:15,66.3,31.91\n\
                    12:00-12:15,93.8,42.15\n";
        let data = parse_csv_body(body).expect("parse");
        assert_eq!(data.len(), 2);
        assert_eq!(data[1].period, "12:00-12:15");
        assert_eq!(data[1].volume, 93.8);
        assert_eq!(data[1].price, 42.15);
    }

    #[test]
    fn malformed_rows_skipped_not_fatal() {
        let body = "Period,Volume,Price\n\
                    00:00-00:15,66.3,31.91\n\
                    broken row without commas\n\
                    00:15-00:30,not-a-number,31.91\n\
                    00:30-00:45,70.1,30.05\n";
        let data = parse_csv_body(body).expect("parse");
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn quoted_fields_survive_parsing() {
        let body = "Period,Volume (MWh),Price (EUR/MWh)\n\
                    \"00:00-00:15\",66.3,31.91\n\
                    \"12:00-12:15\",\"93.8\",\"42.15\"\n";
        let data = parse_csv_body(body).expect("parse");
        assert_eq!(data.len(), 2);
        // Quotes are stripped, so the labels still match period lookups.
        assert_eq!(data[0].period, "00:00-00:15");
        assert_eq!(data[1].volume, 93.8);
        assert_eq!(data[1].price, 42.15);
    }

    #[test]
    fn embedded_comma_in_quoted_field_does_not_split_the_row() {
        let body = "Period,Volume (MWh),Price (EUR/MWh)\n\
                    \"block, off-peak\",66.3,31.91\n\
                    12:00-12:15,93.8,42.15\n";
        let data = parse_csv_body(body).expect("parse");
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].period, "block, off-peak");
    }

    #[test]
    fn empty_body_is_an_error() {
        assert!(matches!(
            parse_csv_body("Period,Volume,Price\n"),
            Err(FetchError::Payload(_))
        ));
    }
}
