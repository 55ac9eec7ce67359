//! Power domain discovery.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::DiscoveryError;

/// Suffix of constraint files holding the enforced limit.
const LIMIT_SUFFIX: &str = "_power_limit_uw";

/// Suffix of constraint files holding the constraint's capacity.
const MAX_SUFFIX: &str = "_max_power_uw";

/// A single adjustable power-limit resource within a domain.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Constraint number within the domain.
    pub id: u32,
    /// Full path of the backing file.
    pub path: PathBuf,
    /// Value in microwatts read at discovery; 0 when unreadable.
    pub value_uw: u64,
}

/// A physical power-limiting zone and its constraints.
///
/// Created once at discovery and immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct PowerDomain {
    /// Directory name identifying the zone.
    pub id: String,
    /// Current-limit constraints, ordered by constraint number.
    pub limits: Vec<Constraint>,
    /// Capacity constraints, ordered by constraint number.
    pub capacities: Vec<Constraint>,
}

/// Enumerates power domains and their constraint resources under `root`.
///
/// Unreadable or unparseable constraint values are recorded as zero with
/// a warning. Directories exposing no constraint files are dropped
/// silently. Returns an empty vector when `root` contains no domains.
///
/// # Errors
///
/// Returns a `DiscoveryError` if `root` or a domain directory cannot be
/// listed.
pub fn discover(root: &Path) -> Result<Vec<PowerDomain>, DiscoveryError> {
    let entries = fs::read_dir(root).map_err(|source| DiscoveryError::Root {
        path: root.display().to_string(),
        source,
    })?;

    let mut domains = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let id = entry.file_name().to_string_lossy().into_owned();
        let domain = read_domain(&id, &path)?;
        if domain.limits.is_empty() && domain.capacities.is_empty() {
            debug!(domain = %id, "skipping domain without constraints");
            continue;
        }
        debug!(
            domain = %id,
            limits = domain.limits.len(),
            capacities = domain.capacities.len(),
            "discovered power domain"
        );
        domains.push(domain);
    }

    Ok(domains)
}

fn read_domain(id: &str, dir: &Path) -> Result<PowerDomain, DiscoveryError> {
    let entries = fs::read_dir(dir).map_err(|source| DiscoveryError::Domain {
        path: dir.display().to_string(),
        source,
    })?;

    let mut limits = Vec::new();
    let mut capacities = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(constraint_id) = constraint_number(&name) else {
            continue;
        };

        if name.ends_with(MAX_SUFFIX) {
            capacities.push(read_constraint(constraint_id, path));
        } else if name.ends_with(LIMIT_SUFFIX) {
            limits.push(read_constraint(constraint_id, path));
        }
    }

    limits.sort_by_key(|c| c.id);
    capacities.sort_by_key(|c| c.id);
    Ok(PowerDomain {
        id: id.to_string(),
        limits,
        capacities,
    })
}

/// Extracts `<n>` from a `constraint_<n>_*` file name.
fn constraint_number(name: &str) -> Option<u32> {
    let rest = name.strip_prefix("constraint_")?;
    let digits = rest.split('_').next()?;
    match digits.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(file = name, "invalid constraint number, skipping");
            None
        }
    }
}

fn read_constraint(id: u32, path: PathBuf) -> Constraint {
    let value_uw = match fs::read_to_string(&path) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unparseable constraint value, recording 0");
                0
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable constraint, recording 0");
            0
        }
    };
    Constraint { id, path, value_uw }
}
