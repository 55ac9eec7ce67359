//! Hardware domain abstraction over the platform's powercap hierarchy.
//!
//! A power domain is a directory exposing numbered constraint files:
//! `constraint_<n>_power_limit_uw` holds the currently enforced limit and
//! `constraint_<n>_max_power_uw` the constraint's capacity. This module
//! is the only place in the crate allowed to mutate hardware state.

mod domain;
mod manager;

pub use domain::{Constraint, PowerDomain, discover};
pub use manager::{ApplyFailure, PowercapManager};
