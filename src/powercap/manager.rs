//! Constraint scanning and best-effort limit application.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::DiscoveryError;
use crate::powercap::domain::{self, PowerDomain};

/// A single resource that could not be written during an apply fan-out.
#[derive(Debug)]
pub struct ApplyFailure {
    /// Path of the constraint file.
    pub path: PathBuf,
    /// Underlying I/O error.
    pub source: std::io::Error,
}

impl fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.source)
    }
}

/// Owns the discovered power domains and mediates all hardware writes.
#[derive(Debug)]
pub struct PowercapManager {
    domains: Vec<PowerDomain>,
}

impl PowercapManager {
    /// Discovers domains under `root` and builds a manager over them.
    ///
    /// # Errors
    ///
    /// Returns a `DiscoveryError` if the root cannot be enumerated or if
    /// no domain exposes any constraint; without a usable domain the
    /// controller cannot run.
    pub fn discover(root: &Path) -> Result<Self, DiscoveryError> {
        let domains = domain::discover(root)?;
        if domains.is_empty() {
            return Err(DiscoveryError::NoDomains {
                path: root.display().to_string(),
            });
        }
        info!(domains = domains.len(), root = %root.display(), "power domains discovered");
        Ok(Self { domains })
    }

    /// Builds a manager over pre-discovered domains.
    pub fn from_domains(domains: Vec<PowerDomain>) -> Self {
        Self { domains }
    }

    /// The discovered domains.
    pub fn domains(&self) -> &[PowerDomain] {
        &self.domains
    }

    /// Scans every constraint, limits and capacities alike, for the
    /// largest positive value in microwatts.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::NotFound` when no constraint carries a
    /// positive value.
    pub fn find_maximum(&self) -> Result<u64, DiscoveryError> {
        let max = self
            .domains
            .iter()
            .flat_map(|d| d.limits.iter().chain(d.capacities.iter()))
            .map(|c| c.value_uw)
            .max()
            .unwrap_or(0);
        if max == 0 {
            return Err(DiscoveryError::NotFound);
        }
        Ok(max)
    }

    /// Writes `value_uw` to every current-limit constraint across all
    /// domains.
    ///
    /// The fan-out is best-effort: per-resource failures are collected
    /// and returned without aborting the remaining writes. The caller
    /// decides whether any failure is material.
    pub fn apply(&self, value_uw: u64) -> Vec<ApplyFailure> {
        let payload = value_uw.to_string();
        let mut failures = Vec::new();

        for domain in &self.domains {
            for constraint in &domain.limits {
                if let Err(source) = write_limit(&constraint.path, &payload) {
                    failures.push(ApplyFailure {
                        path: constraint.path.clone(),
                        source,
                    });
                }
            }
        }

        failures
    }
}

/// Hardware constraint files always exist; refusing to create them keeps
/// a misdiscovered path from silently becoming a regular file.
fn write_limit(path: &Path, payload: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
    file.write_all(payload.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fake_zone(root: &Path, name: &str, limit: u64, capacity: u64) {
        let zone = root.join(name);
        fs::create_dir(&zone).expect("zone dir");
        fs::write(zone.join("constraint_0_power_limit_uw"), limit.to_string()).expect("write");
        fs::write(zone.join("constraint_0_max_power_uw"), capacity.to_string()).expect("write");
    }

    #[test]
    fn find_maximum_spans_limits_and_capacities() {
        let root = tempfile::tempdir().expect("tempdir");
        fake_zone(root.path(), "powercap:0", 25_000_000, 50_000_000);
        fake_zone(root.path(), "powercap:1", 60_000_000, 45_000_000);

        let manager = PowercapManager::discover(root.path()).expect("discover");
        assert_eq!(manager.find_maximum().expect("max"), 60_000_000);
    }

    #[test]
    fn find_maximum_fails_when_nothing_parses() {
        let root = tempfile::tempdir().expect("tempdir");
        let zone = root.path().join("powercap:0");
        fs::create_dir(&zone).expect("zone dir");
        fs::write(zone.join("constraint_0_max_power_uw"), "garbage").expect("write");

        let manager = PowercapManager::discover(root.path()).expect("discover");
        assert!(matches!(
            manager.find_maximum(),
            Err(DiscoveryError::NotFound)
        ));
    }

    #[test]
    fn apply_writes_every_limit_file() {
        let root = tempfile::tempdir().expect("tempdir");
        fake_zone(root.path(), "powercap:0", 25_000_000, 50_000_000);
        fake_zone(root.path(), "powercap:1", 25_000_000, 50_000_000);

        let manager = PowercapManager::discover(root.path()).expect("discover");
        let failures = manager.apply(33_000_000);
        assert!(failures.is_empty(), "unexpected failures: {failures:?}");

        for zone in ["powercap:0", "powercap:1"] {
            let content = fs::read_to_string(
                root.path().join(zone).join("constraint_0_power_limit_uw"),
            )
            .expect("read back");
            assert_eq!(content, "33000000");
        }
    }

    #[test]
    fn apply_collects_failures_without_aborting() {
        let root = tempfile::tempdir().expect("tempdir");
        fake_zone(root.path(), "powercap:0", 25_000_000, 50_000_000);
        fake_zone(root.path(), "powercap:1", 25_000_000, 50_000_000);

        let manager = PowercapManager::discover(root.path()).expect("discover");
        // Remove one limit file after discovery; its write must fail while
        // the other still goes through.
        let gone = root
            .path()
            .join("powercap:0")
            .join("constraint_0_power_limit_uw");
        fs::remove_file(&gone).expect("remove");

        let failures = manager.apply(15_000_000);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, gone);

        let survivor = fs::read_to_string(
            root.path().join("powercap:1").join("constraint_0_power_limit_uw"),
        )
        .expect("read back");
        assert_eq!(survivor, "15000000");
    }

    #[test]
    fn discover_fails_without_domains() {
        let root = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            PowercapManager::discover(root.path()),
            Err(DiscoveryError::NoDomains { .. })
        ));
    }
}
